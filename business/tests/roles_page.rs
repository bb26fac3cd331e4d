//! Roles page: optimistic status toggle and its rollback.

mod common;

use beaute_business::NotificationLevel;
use beaute_business::roles::RolesPage;
use beaute_business::table::{RowActionKind, RowId, TableHandle};
use common::{TestContext, paginated, role_json};
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, ResponseTemplate};

async fn roles_context() -> TestContext {
    let mut ctx = TestContext::new().await;
    Mock::given(method("GET"))
        .and(path("/v2/roles"))
        .respond_with(ResponseTemplate::new(200).set_body_json(paginated(vec![
            role_json("r1", "Admin", true),
            role_json("r2", "Support", true),
        ])))
        .mount(&ctx.mock_server)
        .await;
    RolesPage::install(&mut ctx.ctx, &ctx.config.clone());
    ctx.frames(RolesPage::drive).await;
    ctx
}

fn page(ctx: &mut TestContext) -> &mut RolesPage {
    ctx.ctx.state_mut::<RolesPage>().expect("roles page installed")
}

fn toggle(ctx: &mut TestContext, id: &str) {
    let roles = page(ctx);
    let row = roles.table.row(RowId::new(id)).cloned().expect("role loaded");
    roles
        .table
        .columns()
        .last()
        .expect("actions column")
        .activate(&row, RowId::new(id), RowActionKind::ToggleStatus);
}

fn status_of(ctx: &mut TestContext, id: &str) -> bool {
    page(ctx)
        .table
        .row(RowId::new(id))
        .map(|role| role.status)
        .expect("role loaded")
}

#[tokio::test]
async fn refused_status_change_is_rolled_back() {
    let mut ctx = roles_context().await;
    Mock::given(method("PATCH"))
        .and(path("/v2/roles/r1/status"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({"message": "boom"})))
        .mount(&ctx.mock_server)
        .await;
    assert!(status_of(&mut ctx, "r1"));

    toggle(&mut ctx, "r1");
    ctx.frames(RolesPage::drive).await;

    assert!(status_of(&mut ctx, "r1"));
    assert!(status_of(&mut ctx, "r2"));
    assert!(
        ctx.notifications()
            .iter()
            .any(|n| n.level == NotificationLevel::Error && n.message == "boom")
    );
}

#[tokio::test]
async fn accepted_status_change_invalidates_the_list() {
    let mut ctx = roles_context().await;
    Mock::given(method("PATCH"))
        .and(path("/v2/roles/r2/status"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"data": role_json("r2", "Support", false)})),
        )
        .expect(1)
        .mount(&ctx.mock_server)
        .await;

    toggle(&mut ctx, "r2");
    ctx.frames(RolesPage::drive).await;

    assert_eq!(ctx.requests_to("GET", "/v2/roles").await.len(), 2);
    assert!(
        ctx.notifications()
            .iter()
            .any(|n| n.level == NotificationLevel::Success && n.message == "Role deactivated")
    );
}
