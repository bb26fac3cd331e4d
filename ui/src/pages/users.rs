//! Users page: server-driven table, bulk actions and the delete dialogs.

use beaute_business::Notifications;
use beaute_business::table::{BulkAction, RowActionKind, TableHandle};
use beaute_business::users::{User, UsersPage};
use egui::Ui;

use crate::state::State;
use crate::widgets::{
    self, DialogAction, FloatingBarEvent, bulk_delete_dialog, delete_confirm_dialog,
    detail_window, floating_bar,
};

pub fn users_page(state: &mut State, ui: &mut Ui) {
    let Some(page) = state.ctx.state_mut::<UsersPage>() else {
        ui.label("Users are not available.");
        return;
    };

    ui.heading("Users");
    ui.add_space(4.0);
    widgets::table_toolbar(ui, &mut page.table, page.toolbar, &page.filter_fields);
    ui.add_space(8.0);
    let view = widgets::data_table(ui, "users_table", &mut page.table, "No users found.");
    ui.add_space(4.0);
    widgets::pagination_footer(ui, "users_table", &mut page.table);

    let dialog_open = page.delete_dialog.is_some() || page.bulk_delete_dialog.is_some();
    let busy = page.bulk_delete_dialog.as_ref().is_some_and(|d| d.is_loading());
    let mut exported = None;
    match floating_bar(
        ui.ctx(),
        "users_table",
        view.floating_bar,
        &BulkAction::ALL,
        busy,
        !dialog_open,
    ) {
        Some(FloatingBarEvent::ClearSelection) => page.table.clear_selection(),
        Some(FloatingBarEvent::Action(action)) => exported = page.bulk_action(action),
        None => {}
    }

    show_dialogs(ui, page);

    if let Some(rows) = exported {
        let count = rows.as_array().map_or(0, Vec::len);
        match serde_json::to_string_pretty(&rows) {
            Ok(text) => {
                ui.ctx().copy_text(text);
                if let Some(notifications) = state.ctx.state::<Notifications>() {
                    notifications.success(format!("Copied {count} users to the clipboard"));
                }
            }
            Err(err) => log::error!("users export failed: {err}"),
        }
    }
}

fn show_dialogs(ui: &Ui, page: &mut UsersPage) {
    let ctx = ui.ctx();

    if let Some(dialog) = page.delete_dialog.as_mut() {
        match delete_confirm_dialog(ctx, "Delete user", dialog) {
            Some(DialogAction::Confirm) => page.confirm_delete(),
            Some(DialogAction::Cancel) => page.cancel_delete(),
            None => {}
        }
    } else if let Some(event) = page.row_action.active() {
        let title = match event.kind {
            RowActionKind::Edit => "Edit user",
            _ => "User details",
        };
        if detail_window(ctx, title, &user_fields(&event.row)) {
            page.close_row_action();
        }
    }

    if let Some(dialog) = page.bulk_delete_dialog.as_ref() {
        match bulk_delete_dialog(ctx, dialog) {
            Some(DialogAction::Confirm) => page.confirm_bulk_delete(),
            Some(DialogAction::Cancel) => page.cancel_bulk_delete(),
            None => {}
        }
    }
}

fn user_fields(user: &User) -> Vec<(&'static str, String)> {
    vec![
        ("Username", user.username.clone()),
        ("Name", user.name.clone()),
        ("Email", user.email.clone()),
        ("Phone", user.phone.clone().unwrap_or_else(|| "-".to_owned())),
        ("Role", user.role.clone().unwrap_or_else(|| "-".to_owned())),
        ("Status", user.status.label().to_owned()),
        (
            "Created",
            user.created_at
                .map(|at| at.format("%d/%m/%Y %H:%M").to_string())
                .unwrap_or_else(|| "-".to_owned()),
        ),
    ]
}
