//! Roles page: the whole role list in a client-side table.

use beaute_business::Notifications;
use beaute_business::roles::{Role, RolesPage};
use beaute_business::table::{BulkAction, RowActionKind, TableHandle};
use egui::Ui;

use crate::state::State;
use crate::widgets::{
    self, DialogAction, FloatingBarEvent, detail_window, floating_bar, role_delete_dialog,
};

pub fn roles_page(state: &mut State, ui: &mut Ui) {
    let Some(page) = state.ctx.state_mut::<RolesPage>() else {
        ui.label("Roles are not available.");
        return;
    };

    ui.heading("Roles");
    ui.add_space(4.0);
    widgets::table_toolbar(ui, &mut page.table, page.toolbar, &[]);
    ui.add_space(8.0);
    let view = widgets::data_table(ui, "roles_table", &mut page.table, "No roles found.");
    ui.add_space(4.0);
    widgets::pagination_footer(ui, "roles_table", &mut page.table);

    let mut exported = None;
    match floating_bar(
        ui.ctx(),
        "roles_table",
        view.floating_bar,
        &[BulkAction::Export],
        false,
        page.delete_dialog.is_none(),
    ) {
        Some(FloatingBarEvent::ClearSelection) => page.table.clear_selection(),
        Some(FloatingBarEvent::Action(BulkAction::Export)) => {
            exported = Some(page.export_selected());
        }
        Some(FloatingBarEvent::Action(action)) => log::debug!("roles have no bulk {action:?}"),
        None => {}
    }

    show_dialogs(ui, page);

    if let Some(rows) = exported {
        let count = rows.as_array().map_or(0, Vec::len);
        match serde_json::to_string_pretty(&rows) {
            Ok(text) => {
                ui.ctx().copy_text(text);
                if let Some(notifications) = state.ctx.state::<Notifications>() {
                    notifications.success(format!("Copied {count} roles to the clipboard"));
                }
            }
            Err(err) => log::error!("roles export failed: {err}"),
        }
    }
}

fn show_dialogs(ui: &Ui, page: &mut RolesPage) {
    let ctx = ui.ctx();

    if let Some(dialog) = page.delete_dialog.as_ref() {
        match role_delete_dialog(ctx, dialog) {
            Some(DialogAction::Confirm) => page.confirm_delete(),
            Some(DialogAction::Cancel) => page.cancel_delete(),
            None => {}
        }
    } else if let Some(event) = page.row_action.active() {
        let title = match event.kind {
            RowActionKind::Edit => "Edit role",
            _ => "Role details",
        };
        if detail_window(ctx, title, &role_fields(&event.row)) {
            page.close_row_action();
        }
    }
}

fn role_fields(role: &Role) -> Vec<(&'static str, String)> {
    let permissions = if role.permissions.is_empty() {
        "-".to_owned()
    } else {
        role.permissions
            .iter()
            .map(|permission| permission.name.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    };
    vec![
        ("Name", role.name.clone()),
        (
            "Description",
            role.description.clone().unwrap_or_else(|| "-".to_owned()),
        ),
        ("Status", role.status_label().to_owned()),
        (
            "Users",
            role.users_count.map_or_else(|| "-".to_owned(), |n| n.to_string()),
        ),
        ("Permissions", permissions),
    ]
}
