//! Modal windows for the confirmation dialogs and the row detail view.

use beaute_business::ApiError;
use beaute_business::dialogs::{
    BulkDeleteDialog, CONFIRMATION_FIELD, DeleteConfirmDialog, RoleDeleteDialog,
};
use egui::{Button, Context, RichText, TextEdit, Ui, Window};

use crate::utils::colors::{COLOR_AMBER, COLOR_RED};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DialogAction {
    Confirm,
    Cancel,
}

/// Delete that needs the row's identifier typed back.
pub fn delete_confirm_dialog(ctx: &Context, title: &str, dialog: &mut DeleteConfirmDialog) -> Option<DialogAction> {
    let mut open = true;
    let mut action = None;

    Window::new(title)
        .open(&mut open)
        .collapsible(false)
        .resizable(false)
        .show(ctx, |ui| {
            ui.label("This action cannot be undone.");
            ui.horizontal(|ui| {
                ui.label(format!("Type the {} to confirm:", dialog.field()));
                ui.label(RichText::new(dialog.identifier()).strong().monospace());
            });
            ui.add_space(4.0);

            let loading = dialog.is_loading();
            let hint = dialog.identifier().to_owned();
            let response = ui.add_enabled(
                !loading,
                TextEdit::singleline(dialog.input_mut()).hint_text(hint),
            );
            let submitted = response.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter));

            if let Some(err) = dialog.error() {
                let field = dialog.field().to_owned();
                show_error(ui, err, &[field.as_str(), CONFIRMATION_FIELD]);
            }

            ui.add_space(8.0);
            action = confirm_buttons(ui, "Delete", dialog.can_confirm(), !loading, loading);
            if action.is_none() && submitted && dialog.can_confirm() {
                action = Some(DialogAction::Confirm);
            }
        });

    if !open {
        action = Some(DialogAction::Cancel);
    }
    action
}

pub fn bulk_delete_dialog(ctx: &Context, dialog: &BulkDeleteDialog) -> Option<DialogAction> {
    let mut open = true;
    let mut action = None;

    Window::new(dialog.title())
        .open(&mut open)
        .collapsible(false)
        .resizable(false)
        .show(ctx, |ui| {
            ui.label("The selected rows will be permanently deleted.");
            if let Some(err) = dialog.error() {
                show_error(ui, err, &[]);
            }
            ui.add_space(8.0);
            let loading = dialog.is_loading();
            action = confirm_buttons(ui, "Delete all", !loading, !loading, loading);
        });

    if !open {
        action = Some(DialogAction::Cancel);
    }
    action
}

pub fn role_delete_dialog(ctx: &Context, dialog: &RoleDeleteDialog) -> Option<DialogAction> {
    let mut open = true;
    let mut action = None;

    Window::new("Delete role")
        .open(&mut open)
        .collapsible(false)
        .resizable(false)
        .show(ctx, |ui| {
            ui.label(format!("Delete the role \"{}\"?", dialog.name()));
            if let Some(warning) = dialog.warning() {
                ui.colored_label(COLOR_AMBER, warning);
            }
            if let Some(err) = dialog.error() {
                show_error(ui, err, &[]);
            }
            ui.add_space(8.0);
            let enabled = dialog.buttons_enabled();
            action = confirm_buttons(ui, "Delete", enabled, enabled, dialog.is_loading());
        });

    if !open {
        action = Some(DialogAction::Cancel);
    }
    action
}

/// Read-only field list for View and Edit. Returns `true` once closed.
pub fn detail_window(ctx: &Context, title: &str, fields: &[(&str, String)]) -> bool {
    let mut open = true;
    let mut close = false;

    Window::new(title)
        .open(&mut open)
        .collapsible(false)
        .resizable(false)
        .show(ctx, |ui| {
            egui::Grid::new((title, "fields"))
                .num_columns(2)
                .spacing([16.0, 6.0])
                .show(ui, |ui| {
                    for (label, value) in fields {
                        ui.strong(*label);
                        ui.label(value.as_str());
                        ui.end_row();
                    }
                });
            ui.add_space(8.0);
            close = ui.button("Close").clicked();
        });

    close || !open
}

fn show_error(ui: &mut Ui, err: &ApiError, fields: &[&str]) {
    ui.colored_label(COLOR_RED, err.message.as_str());
    for field in fields {
        for message in err.field_errors(field) {
            ui.colored_label(COLOR_RED, message.as_str());
        }
    }
}

fn confirm_buttons(
    ui: &mut Ui,
    confirm_label: &str,
    confirm_enabled: bool,
    cancel_enabled: bool,
    loading: bool,
) -> Option<DialogAction> {
    let mut action = None;
    ui.horizontal(|ui| {
        let confirm = Button::new(RichText::new(confirm_label).color(COLOR_RED));
        if ui.add_enabled(confirm_enabled, confirm).clicked() {
            action = Some(DialogAction::Confirm);
        }
        if ui.add_enabled(cancel_enabled, Button::new("Cancel")).clicked() {
            action = Some(DialogAction::Cancel);
        }
        if loading {
            ui.spinner();
        }
    });
    action
}
