//! Harness setup shared by the UI tests: a mock API plus the app or a single page.

#![allow(dead_code)]

use beaute_ui::BeauteApp;
use beaute_ui::state::State;
use egui_kittest::Harness;
use serde_json::{Value, json};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub struct TestCtx<'a, T = BeauteApp> {
    mock_server: MockServer,
    harness: Harness<'a, T>,
}

impl<'a, T> TestCtx<'a, T> {
    pub fn harness_mut(&mut self) -> &mut Harness<'a, T> {
        &mut self.harness
    }

    pub fn harness(&self) -> &Harness<'a, T> {
        &self.harness
    }

    pub fn mock_server(&self) -> &MockServer {
        &self.mock_server
    }
}

impl<'a> TestCtx<'a, BeauteApp> {
    /// Signed out, on the login page.
    pub async fn new_app() -> Self {
        Self::signed_out(MockServer::start().await)
    }

    pub fn signed_out(mock_server: MockServer) -> Self {
        let state = State::test(mock_server.uri());
        Self::with_state(mock_server, state)
    }

    /// Signed in as `admin` with `users` served from `GET /users`.
    pub async fn signed_in_with_users(users: Vec<Value>) -> Self {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/users"))
            .respond_with(ResponseTemplate::new(200).set_body_json(paginated(users)))
            .mount(&mock_server)
            .await;
        Self::signed_in(mock_server)
    }

    /// Signed in as `admin`; mount the mocks on `mock_server` first, the
    /// users page fetches on the first frame.
    pub fn signed_in(mock_server: MockServer) -> Self {
        let state = State::test(mock_server.uri()).with_session("admin", "test-token");
        Self::with_state(mock_server, state)
    }

    pub fn with_state(mock_server: MockServer, state: State) -> Self {
        let app = BeauteApp::new(state);
        let harness = Harness::new_eframe(|_| app);
        Self {
            mock_server,
            harness,
        }
    }

    pub fn state(&self) -> &State {
        &self.harness.state().state
    }

    pub fn state_mut(&mut self) -> &mut State {
        &mut self.harness.state_mut().state
    }

    /// Steps frames, waiting on dispatched commands in between, until a frame
    /// dispatches nothing new.
    pub async fn run_until_idle(&mut self) {
        for _ in 0..20 {
            self.harness.step();
            let ctx = &mut self.harness.state_mut().state.ctx;
            if !ctx.has_pending_tasks() {
                break;
            }
            ctx.settle().await;
        }
        self.harness.step();
    }
}

pub fn paginated(rows: Vec<Value>) -> Value {
    let total = rows.len();
    json!({
        "data": rows,
        "meta": { "total": total, "page": 1, "page_count": 1, "per_page": 10 }
    })
}

pub fn user_json(id: u64, username: &str) -> Value {
    json!({
        "id": id,
        "username": username,
        "name": format!("User {id}"),
        "email": format!("{username}@beaute.test"),
        "status": "active",
        "created_at": "2024-05-01T08:00:00Z",
    })
}

pub fn role_json(id: &str, name: &str, status: bool) -> Value {
    json!({
        "id": id,
        "name": name,
        "description": format!("{name} role"),
        "permissions": [],
        "status": status,
        "users_count": 0,
    })
}
