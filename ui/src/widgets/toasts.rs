//! Toast stack in the top-right corner, fed from the [`Notifications`] queue.

use beaute_business::{Notification, NotificationLevel, Notifications};
use egui::{Align2, Area, Color32, Context, Frame, Id, RichText, Stroke, vec2};

use crate::utils::colors::{COLOR_AMBER, COLOR_GRAY, COLOR_GREEN, COLOR_RED};

/// Seconds a toast stays up.
const TOAST_SECONDS: f64 = 4.0;
const MAX_TOASTS: usize = 5;

#[derive(Debug, Default)]
pub struct Toasts {
    shown: Vec<(Notification, f64)>,
}

impl Toasts {
    /// Moves queued notifications onto the stack; `now` is egui's input time.
    pub fn collect(&mut self, notifications: &Notifications, now: f64) {
        for notification in notifications.drain() {
            self.shown.push((notification, now + TOAST_SECONDS));
        }
        if self.shown.len() > MAX_TOASTS {
            let excess = self.shown.len() - MAX_TOASTS;
            self.shown.drain(..excess);
        }
    }

    pub fn messages(&self) -> impl Iterator<Item = &Notification> {
        self.shown.iter().map(|(notification, _)| notification)
    }

    pub fn show(&mut self, ctx: &Context) {
        let now = ctx.input(|input| input.time);
        self.shown.retain(|(_, expires)| *expires > now);
        if self.shown.is_empty() {
            return;
        }

        Area::new(Id::new("toasts"))
            .anchor(Align2::RIGHT_TOP, vec2(-16.0, 16.0))
            .show(ctx, |ui| {
                for (notification, _) in &self.shown {
                    let color = level_color(notification.level);
                    Frame::popup(ui.style())
                        .stroke(Stroke::new(1.0, color))
                        .show(ui, |ui| {
                            ui.label(RichText::new(notification.message.as_str()).color(color));
                        });
                    ui.add_space(4.0);
                }
            });

        let next_expiry = self
            .shown
            .iter()
            .map(|(_, expires)| *expires)
            .fold(f64::INFINITY, f64::min);
        ctx.request_repaint_after(std::time::Duration::from_secs_f64((next_expiry - now).max(0.0)));
    }
}

fn level_color(level: NotificationLevel) -> Color32 {
    match level {
        NotificationLevel::Success => COLOR_GREEN,
        NotificationLevel::Info => COLOR_GRAY,
        NotificationLevel::Warning => COLOR_AMBER,
        NotificationLevel::Error => COLOR_RED,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stack_keeps_the_newest_toasts() {
        let queue = Notifications::new();
        for n in 0..7 {
            queue.info(format!("toast {n}"));
        }
        let mut toasts = Toasts::default();
        toasts.collect(&queue, 0.0);

        let messages: Vec<_> = toasts.messages().map(|n| n.message.as_str()).collect();
        assert_eq!(messages.first(), Some(&"toast 2"));
        assert_eq!(messages.len(), MAX_TOASTS);
        assert!(queue.is_empty());
    }
}
