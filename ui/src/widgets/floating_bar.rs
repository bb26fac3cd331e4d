//! Bulk-action bar pinned to the bottom of the window while rows are selected.

use beaute_business::table::{BulkAction, FloatingBar};
use egui::{Align2, Area, Button, Context, Frame, Id, Key, RichText, vec2};

use crate::utils::colors::COLOR_RED;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FloatingBarEvent {
    ClearSelection,
    Action(BulkAction),
}

/// Draws the bar when `bar` is set. Escape clears the selection unless
/// `keyboard` is off (a dialog owns the keyboard).
pub fn floating_bar(
    ctx: &Context,
    id_salt: &str,
    bar: Option<FloatingBar>,
    actions: &[BulkAction],
    busy: bool,
    keyboard: bool,
) -> Option<FloatingBarEvent> {
    let bar = bar?;
    let mut event = None;

    if keyboard && ctx.input(|input| input.key_pressed(Key::Escape)) {
        return Some(FloatingBarEvent::ClearSelection);
    }

    Area::new(Id::new((id_salt, "floating_bar")))
        .anchor(Align2::CENTER_BOTTOM, vec2(0.0, -24.0))
        .show(ctx, |ui| {
            Frame::popup(ui.style()).show(ui, |ui| {
                ui.horizontal(|ui| {
                    ui.label(bar.label());
                    if ui
                        .button("✕")
                        .on_hover_text("Clear selection")
                        .clicked()
                    {
                        event = Some(FloatingBarEvent::ClearSelection);
                    }
                    ui.separator();
                    for action in actions {
                        let text = if action.is_destructive() {
                            RichText::new(action.label()).color(COLOR_RED)
                        } else {
                            RichText::new(action.label())
                        };
                        if ui.add_enabled(!busy, Button::new(text)).clicked() {
                            event = Some(FloatingBarEvent::Action(*action));
                        }
                    }
                    if busy {
                        ui.spinner();
                    }
                });
            });
        });

    event
}
