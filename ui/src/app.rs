use std::time::Duration;

use beaute_business::Route;
use beaute_business::users::UsersPage;
use beaute_states::Time;
use chrono::Utc;

use crate::state::State;
use crate::widgets::Toasts;
use crate::pages;

/// Poll interval while commands are running.
const TASK_POLL: Duration = Duration::from_millis(50);

pub struct BeauteApp {
    pub state: State,
    toasts: Toasts,
}

impl BeauteApp {
    /// Called once before the first frame.
    pub fn new(state: State) -> Self {
        Self {
            state,
            toasts: Toasts::default(),
        }
    }

    pub fn toasts(&self) -> &Toasts {
        &self.toasts
    }
}

impl eframe::App for BeauteApp {
    /// Called each time the UI needs repainting, which may be many times per second.
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // Apply command results before anything reads state
        self.state.ctx.update::<Time>(|time| time.set(Utc::now()));
        self.state.ctx.sync();
        self.state.follow_session();
        self.state.drive_page();
        self.state.follow_list_error();

        let route = self.state.route();
        if route.requires_session() {
            egui::SidePanel::left("navigation")
                .resizable(false)
                .default_width(180.0)
                .show(ctx, |ui| navigation(&mut self.state, ui, route));
        }

        egui::CentralPanel::default().show(ctx, |ui| match route {
            Route::Login => pages::login_page(&mut self.state, ui),
            Route::Users => pages::users_page(&mut self.state, ui),
            Route::Roles => pages::roles_page(&mut self.state, ui),
            Route::Maintenance | Route::Unauthorized | Route::Forbidden | Route::NotFound => {
                if let Some(next) = pages::status_screen(ui, route) {
                    self.state.navigate(next.path());
                }
            }
        });

        if let Some(notifications) = self.state.notifications() {
            self.toasts.collect(notifications, ctx.input(|input| input.time));
        }
        self.toasts.show(ctx);

        if self.state.ctx.has_pending_tasks() {
            ctx.request_repaint_after(TASK_POLL);
        }
        if let Some(due) = self.search_due_in() {
            ctx.request_repaint_after(due);
        }
    }
}

impl BeauteApp {
    /// Time until a debounced search is due to be sent.
    fn search_due_in(&self) -> Option<Duration> {
        let page = self.state.ctx.state::<UsersPage>()?;
        let due = page.table.search_due_at()?;
        Some((due - Utc::now()).to_std().unwrap_or(Duration::ZERO))
    }
}

fn navigation(state: &mut State, ui: &mut egui::Ui, route: Route) {
    ui.add_space(8.0);
    ui.heading("Beaute Console");
    ui.separator();

    for target in [Route::Users, Route::Roles] {
        if ui.selectable_label(route == target, target.title()).clicked() && route != target {
            state.navigate(target.path());
        }
    }

    ui.with_layout(egui::Layout::bottom_up(egui::Align::Min), |ui| {
        ui.add_space(8.0);
        if ui.button("Sign out").clicked() {
            state.sign_out();
        }
        if let Some(username) = state.session().username() {
            ui.weak(format!("Signed in as {username}"));
        }
    });
}
