use std::sync::Arc;

use beaute_business::auth::{
    LoginCommand, LoginInput, LoginStatus, LogoutCommand, VerifyOtpCommand,
};
use beaute_business::roles::{RolesPage, RolesQuery};
use beaute_business::users::{UsersPage, UsersQuery};
use beaute_business::{
    ApiClient, ApiError, AuthSession, BusinessConfig, MaintenanceGate, MemoryTokenStore,
    Notifications, QueryCache, RetryPolicy, Route, TokenStore,
};
use beaute_states::{StateCtx, Time};
use log::{debug, info};

/// The main application state.
pub struct State {
    /// The state context for business logic.
    pub ctx: StateCtx,
    pub gate: MaintenanceGate,
    tokens: MemoryTokenStore,
}

impl State {
    pub fn new(config: BusinessConfig) -> Self {
        Self::build(config, QueryCache::new())
    }

    /// Signed out, pointed at `base_url`, without retries so failures show up at once.
    pub fn test(base_url: String) -> Self {
        let cache = QueryCache::new().with_retry(RetryPolicy::NEVER, RetryPolicy::NEVER);
        Self::build(BusinessConfig::new(base_url), cache)
    }

    fn build(config: BusinessConfig, cache: QueryCache) -> Self {
        let tokens = MemoryTokenStore::new();
        let mut ctx = StateCtx::new();

        ctx.add_state(Time::default());
        ctx.add_state(cache);
        ctx.add_state(Notifications::new());
        ctx.add_state(ApiClient::new(config.clone(), Arc::new(tokens.clone())));
        ctx.add_state(AuthSession::default());
        ctx.add_state(LoginInput::default());
        ctx.add_state(LoginStatus::default());
        ctx.add_state(Route::default());
        ctx.record_command(LoginCommand);
        ctx.record_command(VerifyOtpCommand);
        ctx.record_command(LogoutCommand);

        UsersPage::install(&mut ctx, &config);
        RolesPage::install(&mut ctx, &config);

        let gate = MaintenanceGate::from_config(&config);
        ctx.add_state(config);

        let mut state = Self { ctx, gate, tokens };
        state.navigate("/");
        state
    }

    /// Starts signed in as `username`, as if a token had been restored.
    pub fn with_session(mut self, username: &str, token: &str) -> Self {
        self.tokens.set_token(token.to_owned());
        self.ctx.add_state(AuthSession::SignedIn {
            username: username.to_owned(),
        });
        self.navigate("/");
        self
    }

    pub fn route(&self) -> Route {
        self.ctx.state::<Route>().copied().unwrap_or_default()
    }

    pub fn session(&self) -> AuthSession {
        self.ctx.state::<AuthSession>().cloned().unwrap_or_default()
    }

    /// Resolves `path` through the maintenance gate; console screens need a session.
    pub fn navigate(&mut self, path: &str) {
        let mut route = self.gate.resolve(path);
        if route.requires_session() && !self.session().is_signed_in() {
            route = self.gate.resolve(Route::Login.path());
        }
        if route != self.route() {
            debug!("navigate {path} -> {route:?}");
        }
        self.ctx.update::<Route>(|current| *current = route);
    }

    /// Keeps the route in line with the session after sign-in, sign-out or a 401.
    pub fn follow_session(&mut self) {
        let signed_in = self.session().is_signed_in();
        match self.route() {
            Route::Login if signed_in => {
                info!("signed in, opening the console");
                self.ctx.add_state(LoginInput::default());
                self.navigate(Route::Users.path());
            }
            route if route.requires_session() && !signed_in => {
                self.navigate(Route::Login.path());
            }
            _ => {}
        }
    }

    /// Runs the current page's frame step.
    pub fn drive_page(&mut self) {
        match self.route() {
            Route::Users => UsersPage::drive(&mut self.ctx),
            Route::Roles => RolesPage::drive(&mut self.ctx),
            _ => {}
        }
    }

    /// Switches to an error screen when the shown list failed with 403 or 404.
    ///
    /// 401 is left to the session redirect.
    pub fn follow_list_error(&mut self) {
        let Some(err) = self.list_error() else {
            return;
        };
        if let Some(route) = Route::for_status(err.status).filter(|route| *route != Route::Unauthorized) {
            info!("list request failed with {}, showing {route:?}", err.status);
            self.ctx.update::<Route>(|current| *current = route);
        }
    }

    fn list_error(&self) -> Option<ApiError> {
        let cache = self.ctx.state::<QueryCache>()?;
        let key = match self.route() {
            Route::Users => {
                if self.ctx.state::<UsersPage>()?.is_fetching() {
                    return None;
                }
                self.ctx.state::<UsersQuery>()?.key()
            }
            Route::Roles => {
                if self.ctx.state::<RolesPage>()?.is_fetching() {
                    return None;
                }
                self.ctx.state::<RolesQuery>()?.key()
            }
            _ => return None,
        };
        cache.error(&key)
    }

    pub fn sign_out(&mut self) {
        self.ctx.dispatch::<LogoutCommand>();
    }

    pub fn notifications(&self) -> Option<&Notifications> {
        self.ctx.state::<Notifications>()
    }
}
