//! Which screen the console shows.

use beaute_states::State;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Route {
    /// Shown until a session exists.
    #[default]
    Login,
    Users,
    Roles,
    Maintenance,
    Unauthorized,
    Forbidden,
    NotFound,
}

impl Route {
    pub fn path(self) -> &'static str {
        match self {
            Self::Login => "/system-login",
            Self::Users => "/system-console/users",
            Self::Roles => "/system-console/roles",
            Self::Maintenance => "/maintenance",
            Self::Unauthorized => "/errors/unauthorized",
            Self::Forbidden => "/errors/forbidden",
            Self::NotFound => "/not-found",
        }
    }

    /// Query string, fragment and trailing slashes are ignored. Unknown paths are
    /// [`Route::NotFound`].
    pub fn from_path(path: &str) -> Self {
        let path = path.split(['?', '#']).next().unwrap_or_default();
        let path = path.trim_end_matches('/');
        match path {
            "" | "/system-console" => Self::Users,
            "/system-login" => Self::Login,
            "/system-console/users" => Self::Users,
            "/system-console/roles" => Self::Roles,
            "/maintenance" | "/errors/maintenance" => Self::Maintenance,
            "/errors/unauthorized" => Self::Unauthorized,
            "/errors/forbidden" => Self::Forbidden,
            _ => Self::NotFound,
        }
    }

    /// Error screen for an HTTP status, if there is one.
    pub fn for_status(status: u16) -> Option<Self> {
        match status {
            401 => Some(Self::Unauthorized),
            403 => Some(Self::Forbidden),
            404 => Some(Self::NotFound),
            _ => None,
        }
    }

    pub fn requires_session(self) -> bool {
        matches!(self, Self::Users | Self::Roles)
    }

    pub fn title(self) -> &'static str {
        match self {
            Self::Login => "Sign in",
            Self::Users => "Users",
            Self::Roles => "Roles",
            Self::Maintenance => "Under maintenance",
            Self::Unauthorized => "Unauthorized",
            Self::Forbidden => "Access denied",
            Self::NotFound => "Page not found",
        }
    }
}

impl State for Route {
    fn snapshot(&self) -> Option<Self> {
        Some(*self)
    }
}
