//! Maintenance-mode routing.

use log::debug;

use crate::config::BusinessConfig;
use crate::route::Route;

pub const MAINTENANCE_PATH: &str = "/maintenance";

/// Prefixes served even during maintenance.
const EXEMPT_PREFIXES: [&str; 6] = [
    MAINTENANCE_PATH,
    "/_next",
    "/favicon.ico",
    "/fonts",
    "/images",
    "/api/health",
];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MaintenanceGate {
    enabled: bool,
}

impl MaintenanceGate {
    pub fn new(enabled: bool) -> Self {
        Self { enabled }
    }

    pub fn from_config(config: &BusinessConfig) -> Self {
        Self::new(config.maintenance_mode())
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn is_exempt(path: &str) -> bool {
        EXEMPT_PREFIXES.iter().any(|prefix| path.starts_with(prefix))
    }

    /// The path to serve for `path`: itself, or [`MAINTENANCE_PATH`] while maintenance
    /// is on and `path` is not exempt.
    pub fn route<'a>(&self, path: &'a str) -> &'a str {
        if self.enabled && !Self::is_exempt(path) {
            debug!("maintenance: rewriting {path} to {MAINTENANCE_PATH}");
            MAINTENANCE_PATH
        } else {
            path
        }
    }

    pub fn resolve(&self, path: &str) -> Route {
        Route::from_path(self.route(path))
    }
}
