//! Session token storage and the sign-in flow (password, then optional OTP).
//!
//! The token store is injected through [`ApiClient`], never global, so tests swap in
//! their own [`MemoryTokenStore`].

use std::sync::{Arc, PoisonError, RwLock};

use beaute_states::{Command, CommandFuture, CommandSnapshot, State, Updater};
use log::{error, info};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio_util::sync::CancellationToken;

use crate::api::{ApiClient, ApiResponse};
use crate::query_cache::QueryCache;

pub trait TokenStore: Send + Sync + 'static {
    fn token(&self) -> Option<String>;
    fn set_token(&self, token: String);
    fn clear(&self);
}

/// In-memory token store; clones share the same slot.
#[derive(Debug, Clone, Default)]
pub struct MemoryTokenStore {
    inner: Arc<RwLock<Option<String>>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(token: impl Into<String>) -> Self {
        let store = Self::new();
        store.set_token(token.into());
        store
    }
}

impl TokenStore for MemoryTokenStore {
    fn token(&self) -> Option<String> {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn set_token(&self, token: String) {
        *self.inner.write().unwrap_or_else(PoisonError::into_inner) = Some(token);
    }

    fn clear(&self) {
        *self.inner.write().unwrap_or_else(PoisonError::into_inner) = None;
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum AuthSession {
    #[default]
    SignedOut,
    /// Password accepted; the server wants a one-time code.
    AwaitingOtp { username: String, challenge: String },
    SignedIn { username: String },
    /// A request came back 401; the operator must sign in again.
    RedirectToLogin,
}

impl AuthSession {
    pub fn is_signed_in(&self) -> bool {
        matches!(self, Self::SignedIn { .. })
    }

    pub fn username(&self) -> Option<&str> {
        match self {
            Self::SignedIn { username } | Self::AwaitingOtp { username, .. } => Some(username),
            Self::SignedOut | Self::RedirectToLogin => None,
        }
    }
}

impl State for AuthSession {
    fn snapshot(&self) -> Option<Self> {
        Some(self.clone())
    }
}

/// Sets [`AuthSession::RedirectToLogin`] when `err` is a 401.
pub fn redirect_if_unauthorized(err: &crate::ApiError, updater: &Updater) -> bool {
    if err.is_unauthorized() {
        info!("Session rejected by the server, redirecting to login");
        updater.set(AuthSession::RedirectToLogin);
        true
    } else {
        false
    }
}

/// Editable login form fields.
#[derive(Debug, Clone, Default)]
pub struct LoginInput {
    pub username: String,
    pub password: String,
    pub otp: String,
}

impl State for LoginInput {
    fn snapshot(&self) -> Option<Self> {
        Some(self.clone())
    }
}

/// Progress of the current sign-in step.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoginStatus {
    pub in_flight: bool,
    pub error: Option<String>,
}

impl LoginStatus {
    fn submitting() -> Self {
        Self {
            in_flight: true,
            error: None,
        }
    }

    fn failed(message: impl Into<String>) -> Self {
        Self {
            in_flight: false,
            error: Some(message.into()),
        }
    }
}

impl State for LoginStatus {}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum OtpCodeError {
    #[error("OTP code is required")]
    Empty,
    #[error("OTP code must be 6 digits")]
    Format,
}

/// Checks a one-time code locally: exactly six ASCII digits after trimming.
pub fn validate_otp_code(code: &str) -> Result<&str, OtpCodeError> {
    let code = code.trim();
    if code.is_empty() {
        Err(OtpCodeError::Empty)
    } else if code.len() == 6 && code.bytes().all(|b| b.is_ascii_digit()) {
        Ok(code)
    } else {
        Err(OtpCodeError::Format)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoginResponse {
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub otp_required: bool,
    #[serde(default)]
    pub challenge: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct VerifyOtpRequest {
    pub username: String,
    pub challenge: String,
    pub code: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VerifyOtpResponse {
    pub token: String,
}

/// Posts `/auth/login`. Either signs in directly or moves to the OTP step.
#[derive(Debug, Default)]
pub struct LoginCommand;

impl Command for LoginCommand {
    fn run(
        &self,
        snap: CommandSnapshot,
        updater: Updater,
        cancel: CancellationToken,
    ) -> CommandFuture {
        let inputs = snap.cloned::<LoginInput>().and_then(|input| {
            snap.cloned::<ApiClient>().map(|client| (input, client))
        });

        Box::pin(async move {
            let (input, client) = match inputs {
                Ok(inputs) => inputs,
                Err(err) => {
                    error!("LoginCommand: {err}");
                    return;
                }
            };
            let username = input.username.trim().to_owned();
            if username.is_empty() || input.password.is_empty() {
                updater.set(LoginStatus::failed("Username and password are required"));
                return;
            }

            info!("LoginCommand: signing in '{username}'");
            updater.set(LoginStatus::submitting());

            let request = LoginRequest {
                username: username.clone(),
                password: input.password,
            };
            let result: Result<ApiResponse<LoginResponse>, _> = tokio::select! {
                () = cancel.cancelled() => return,
                result = client.post("/auth/login", &request) => result,
            };

            match result {
                Ok(ApiResponse { data, .. }) => match (data.token, data.otp_required) {
                    (Some(token), false) => {
                        client.tokens().set_token(token);
                        info!("LoginCommand: '{username}' signed in");
                        updater.set(AuthSession::SignedIn { username });
                        updater.set(LoginStatus::default());
                    }
                    (_, true) => {
                        info!("LoginCommand: OTP required for '{username}'");
                        updater.set(AuthSession::AwaitingOtp {
                            username,
                            challenge: data.challenge.unwrap_or_default(),
                        });
                        updater.set(LoginStatus::default());
                    }
                    (None, false) => {
                        error!("LoginCommand: response carried neither token nor challenge");
                        updater.set(LoginStatus::failed("Unexpected response from server"));
                    }
                },
                Err(err) => {
                    info!("LoginCommand: sign-in failed: {err}");
                    updater.set(LoginStatus::failed(err.message));
                }
            }
        })
    }
}

/// Posts `/auth/verify-otp` with the code from [`LoginInput::otp`].
#[derive(Debug, Default)]
pub struct VerifyOtpCommand;

impl Command for VerifyOtpCommand {
    fn run(
        &self,
        snap: CommandSnapshot,
        updater: Updater,
        cancel: CancellationToken,
    ) -> CommandFuture {
        let inputs = snap.cloned::<LoginInput>().and_then(|input| {
            let session = snap.cloned::<AuthSession>()?;
            let client = snap.cloned::<ApiClient>()?;
            Ok((input, session, client))
        });

        Box::pin(async move {
            let (input, session, client) = match inputs {
                Ok(inputs) => inputs,
                Err(err) => {
                    error!("VerifyOtpCommand: {err}");
                    return;
                }
            };
            let AuthSession::AwaitingOtp {
                username,
                challenge,
            } = session
            else {
                updater.set(LoginStatus::failed("Sign in with your password first"));
                return;
            };
            let code = match validate_otp_code(&input.otp) {
                Ok(code) => code.to_owned(),
                Err(err) => {
                    info!("VerifyOtpCommand: rejected locally: {err}");
                    updater.set(LoginStatus::failed(err.to_string()));
                    return;
                }
            };

            updater.set(LoginStatus::submitting());
            let request = VerifyOtpRequest {
                username: username.clone(),
                challenge,
                code,
            };
            let result: Result<ApiResponse<VerifyOtpResponse>, _> = tokio::select! {
                () = cancel.cancelled() => return,
                result = client.post("/auth/verify-otp", &request) => result,
            };

            match result {
                Ok(ApiResponse { data, .. }) => {
                    client.tokens().set_token(data.token);
                    info!("VerifyOtpCommand: '{username}' signed in");
                    updater.set(AuthSession::SignedIn { username });
                    updater.set(LoginStatus::default());
                }
                Err(err) => {
                    info!("VerifyOtpCommand: verification failed: {err}");
                    updater.set(LoginStatus::failed(err.message));
                }
            }
        })
    }
}

/// Posts `/auth/logout`, then clears the token and cache whatever the outcome.
#[derive(Debug, Default)]
pub struct LogoutCommand;

impl Command for LogoutCommand {
    fn run(
        &self,
        snap: CommandSnapshot,
        updater: Updater,
        _cancel: CancellationToken,
    ) -> CommandFuture {
        let client = snap.cloned::<ApiClient>();
        let cache = snap.cloned::<QueryCache>().ok();

        Box::pin(async move {
            let client = match client {
                Ok(client) => client,
                Err(err) => {
                    error!("LogoutCommand: {err}");
                    return;
                }
            };
            if let Err(err) = client
                .post::<_, serde_json::Value>("/auth/logout", &serde_json::json!({}))
                .await
            {
                info!("LogoutCommand: server logout failed, clearing locally: {err}");
            }
            client.tokens().clear();
            if let Some(cache) = cache {
                cache.clear();
            }
            info!("LogoutCommand: signed out");
            updater.set(AuthSession::SignedOut);
            updater.set(LoginInput::default());
            updater.set(LoginStatus::default());
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn otp_code_must_be_six_digits() {
        assert_eq!(validate_otp_code(" 123456 "), Ok("123456"));
        assert_eq!(validate_otp_code(""), Err(OtpCodeError::Empty));
        assert_eq!(validate_otp_code("12345"), Err(OtpCodeError::Format));
        assert_eq!(validate_otp_code("12a456"), Err(OtpCodeError::Format));
        assert_eq!(validate_otp_code("١٢٣٤٥٦"), Err(OtpCodeError::Format));
    }

    #[test]
    fn memory_store_clones_share_the_token() {
        let store = MemoryTokenStore::new();
        let other = store.clone();
        store.set_token("abc".into());
        assert_eq!(other.token().as_deref(), Some("abc"));
        other.clear();
        assert_eq!(store.token(), None);
    }

    #[test]
    fn session_username() {
        let session = AuthSession::AwaitingOtp {
            username: "linh".into(),
            challenge: "c1".into(),
        };
        assert_eq!(session.username(), Some("linh"));
        assert!(!session.is_signed_in());
        assert_eq!(AuthSession::RedirectToLogin.username(), None);
    }
}
