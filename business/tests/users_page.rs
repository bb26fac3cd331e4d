//! Users page driven frame by frame against a mock `/users` backend.

mod common;

use beaute_business::NotificationLevel;
use beaute_business::table::{BulkAction, RowId, TableHandle};
use beaute_business::users::UsersPage;
use common::{TestContext, paginated, user_json};
use serde_json::json;
use wiremock::matchers::{body_json, method, path, query_param};
use wiremock::{Mock, ResponseTemplate};

async fn users_context() -> TestContext {
    let mut ctx = TestContext::new().await;
    Mock::given(method("GET"))
        .and(path("/users"))
        .and(query_param("page", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(paginated(
            (1..=5).map(|id| user_json(id, &format!("user{id}"))).collect(),
        )))
        .mount(&ctx.mock_server)
        .await;
    UsersPage::install(&mut ctx.ctx, &ctx.config.clone());
    ctx
}

fn page(ctx: &mut TestContext) -> &mut UsersPage {
    ctx.ctx.state_mut::<UsersPage>().expect("users page installed")
}

#[tokio::test]
async fn first_frames_load_the_first_page() {
    let mut ctx = users_context().await;
    ctx.frames(UsersPage::drive).await;

    let requests = ctx.requests_to("GET", "/users").await;
    assert_eq!(requests.len(), 1);
    let query: Vec<(String, String)> = requests[0]
        .url
        .query_pairs()
        .map(|(key, value)| (key.into_owned(), value.into_owned()))
        .collect();
    assert_eq!(
        query,
        [
            ("page".to_owned(), "1".to_owned()),
            ("limit".to_owned(), "10".to_owned()),
            ("sort".to_owned(), "created_at".to_owned()),
            ("order".to_owned(), "desc".to_owned()),
        ]
    );

    let users = page(&mut ctx);
    assert!(!users.table.is_loading());
    assert_eq!(users.table.rows().len(), 5);
    assert_eq!(users.table.page_count(), 1);
}

#[tokio::test]
async fn bulk_delete_clears_selection_and_refetches() {
    let mut ctx = users_context().await;
    Mock::given(method("POST"))
        .and(path("/users/bulk-delete"))
        .and(body_json(json!({"ids": [1, 3, 5]})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"message": "ok"})))
        .expect(1)
        .mount(&ctx.mock_server)
        .await;
    ctx.frames(UsersPage::drive).await;

    let users = page(&mut ctx);
    for id in [1, 3, 5] {
        users.table.set_row_selected(RowId::from(id), true);
    }
    assert_eq!(users.bulk_action(BulkAction::Delete), None);
    assert_eq!(
        users.bulk_delete_dialog.as_ref().map(|dialog| dialog.title()),
        Some("Delete 3 items?".to_owned())
    );
    users.confirm_bulk_delete();
    ctx.frames(UsersPage::drive).await;

    let users = page(&mut ctx);
    assert!(users.bulk_delete_dialog.is_none());
    assert!(users.table.selected_ids().is_empty());
    assert_eq!(ctx.requests_to("GET", "/users").await.len(), 2, "list refetched");

    let notifications = ctx.notifications();
    assert!(
        notifications
            .iter()
            .any(|n| n.level == NotificationLevel::Success && n.message == "Deleted 3 users")
    );
}

#[tokio::test]
async fn failed_delete_keeps_dialog_and_input() {
    let mut ctx = users_context().await;
    Mock::given(method("DELETE"))
        .and(path("/users/2"))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({"message": "Forbidden"})))
        .mount(&ctx.mock_server)
        .await;
    ctx.frames(UsersPage::drive).await;

    let users = page(&mut ctx);
    let row = users.table.row(RowId::from(2)).cloned().expect("user 2 loaded");
    users
        .table
        .columns()
        .last()
        .expect("actions column")
        .activate(&row, RowId::from(2), beaute_business::table::RowActionKind::Delete);
    ctx.frames(UsersPage::drive).await;

    let users = page(&mut ctx);
    users
        .delete_dialog
        .as_mut()
        .expect("delete dialog open")
        .set_input("user2");
    users.confirm_delete();
    ctx.frames(UsersPage::drive).await;

    let dialog = page(&mut ctx).delete_dialog.clone().expect("dialog stays open");
    assert_eq!(dialog.input(), "user2");
    assert_eq!(dialog.error().map(|err| err.status), Some(403));
    assert!(!dialog.is_loading());
    assert!(
        ctx.notifications()
            .iter()
            .any(|n| n.level == NotificationLevel::Error)
    );
}
