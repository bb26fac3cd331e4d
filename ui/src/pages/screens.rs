//! Full-page screens for maintenance and HTTP error routes.

use beaute_business::Route;
use egui::{Align, Layout, RichText, Ui};

/// Draws the screen for `route`. Returns where the operator asked to go next.
pub fn status_screen(ui: &mut Ui, route: Route) -> Option<Route> {
    let mut next = None;
    ui.with_layout(Layout::top_down(Align::Center), |ui| {
        ui.add_space(80.0);
        if let Some(code) = status_code(route) {
            ui.label(RichText::new(code).size(48.0).strong());
        }
        ui.heading(route.title());
        ui.add_space(8.0);
        ui.label(message(route));
        ui.add_space(16.0);
        match route {
            Route::Maintenance => {}
            Route::Unauthorized => {
                if ui.button("Sign in").clicked() {
                    next = Some(Route::Login);
                }
            }
            _ => {
                if ui.button("Back to console").clicked() {
                    next = Some(Route::Users);
                }
            }
        }
    });
    next
}

fn status_code(route: Route) -> Option<&'static str> {
    match route {
        Route::Unauthorized => Some("401"),
        Route::Forbidden => Some("403"),
        Route::NotFound => Some("404"),
        _ => None,
    }
}

fn message(route: Route) -> &'static str {
    match route {
        Route::Maintenance => {
            "The console is down for scheduled maintenance. Please check back soon."
        }
        Route::Unauthorized => "Please sign in to continue.",
        Route::Forbidden => "You do not have permission to view this page.",
        _ => "The page you are looking for does not exist.",
    }
}
