//! Shared setup for business integration tests: a mock server and a `StateCtx` wired
//! to it the way the console wires the real API.

#![allow(dead_code)]

use std::sync::Arc;

use beaute_business::{
    ApiClient, AuthSession, BusinessConfig, MemoryTokenStore, Notification, Notifications,
    QueryCache, RetryPolicy,
};
use beaute_states::{StateCtx, Time};
use chrono::Utc;
use serde_json::{Value, json};
use wiremock::MockServer;

pub struct TestContext {
    /// Kept alive for the mounted endpoints.
    pub mock_server: MockServer,
    pub ctx: StateCtx,
    pub tokens: MemoryTokenStore,
    pub config: BusinessConfig,
}

impl TestContext {
    pub async fn new() -> Self {
        let mock_server = MockServer::start().await;
        let config = BusinessConfig::new(mock_server.uri());
        let tokens = MemoryTokenStore::with_token("test-token");

        let mut ctx = StateCtx::new();
        ctx.add_state(Time::at(Utc::now()));
        // No retries: failures surface on the first attempt.
        ctx.add_state(QueryCache::new().with_retry(RetryPolicy::NEVER, RetryPolicy::NEVER));
        ctx.add_state(Notifications::new());
        ctx.add_state(AuthSession::SignedIn {
            username: "admin".into(),
        });
        ctx.add_state(ApiClient::new(config.clone(), Arc::new(tokens.clone())));
        ctx.add_state(config.clone());

        Self {
            mock_server,
            ctx,
            tokens,
            config,
        }
    }

    pub fn client(&self) -> ApiClient {
        ApiClient::new(self.config.clone(), Arc::new(self.tokens.clone()))
    }

    /// Runs frames of `drive` until a frame dispatches nothing.
    pub async fn frames(&mut self, drive: fn(&mut StateCtx)) {
        for _ in 0..20 {
            self.ctx.update::<Time>(|time| time.set(Utc::now()));
            drive(&mut self.ctx);
            if !self.ctx.has_pending_tasks() {
                return;
            }
            self.ctx.settle().await;
        }
        panic!("page kept dispatching commands after 20 frames");
    }

    pub fn notifications(&self) -> Vec<Notification> {
        self.ctx
            .state::<Notifications>()
            .map(Notifications::drain)
            .unwrap_or_default()
    }

    /// Requests the mock server saw for `method` + `path`.
    pub async fn requests_to(&self, method: &str, path: &str) -> Vec<wiremock::Request> {
        self.mock_server
            .received_requests()
            .await
            .unwrap_or_default()
            .into_iter()
            .filter(|request| request.method.as_str() == method && request.url.path() == path)
            .collect()
    }
}

pub fn paginated(data: Vec<Value>) -> Value {
    let total = data.len();
    json!({
        "data": data,
        "meta": { "total": total, "page": 1, "page_count": 1, "per_page": 10 }
    })
}

pub fn user_json(id: u64, username: &str) -> Value {
    json!({
        "id": id,
        "username": username,
        "name": username,
        "email": format!("{username}@example.com"),
        "status": "active",
        "created_at": "2026-01-15T08:30:00Z"
    })
}

pub fn role_json(id: &str, name: &str, status: bool) -> Value {
    json!({
        "id": id,
        "name": name,
        "description": null,
        "permissions": [],
        "status": status,
        "users_count": 2,
        "created_at": "2026-01-15T08:30:00Z",
        "updated_at": "2026-01-15T08:30:00Z"
    })
}
