//! Sign-in page: password first, then a one-time code when the server asks for one.

use beaute_business::AuthSession;
use beaute_business::auth::{LoginCommand, LoginInput, LoginStatus, VerifyOtpCommand};
use egui::{Align, Button, Layout, TextEdit, Ui};

use crate::state::State;
use crate::utils::colors::{COLOR_AMBER, COLOR_RED};

const FIELD_WIDTH: f32 = 220.0;

pub fn login_page(state: &mut State, ui: &mut Ui) {
    let session = state.session();
    let status = state
        .ctx
        .state::<LoginStatus>()
        .cloned()
        .unwrap_or_default();
    let Some(input) = state.ctx.state_mut::<LoginInput>() else {
        return;
    };

    let mut submit = None;
    ui.with_layout(Layout::top_down(Align::Center), |ui| {
        ui.add_space(40.0);
        ui.heading("Beaute Console");
        ui.add_space(24.0);

        if session == AuthSession::RedirectToLogin {
            ui.colored_label(COLOR_AMBER, "Your session has expired. Please sign in again.");
            ui.add_space(8.0);
        }
        if let Some(error) = &status.error {
            ui.colored_label(COLOR_RED, error.as_str());
            ui.add_space(8.0);
        }

        submit = match &session {
            AuthSession::AwaitingOtp { username, .. } => otp_form(ui, input, username, &status),
            _ => password_form(ui, input, &status),
        };

        if status.in_flight {
            ui.add_space(8.0);
            ui.spinner();
        }
    });

    match submit {
        Some(Submit::Password) => state.ctx.dispatch::<LoginCommand>(),
        Some(Submit::Otp) => state.ctx.dispatch::<VerifyOtpCommand>(),
        Some(Submit::Back) => {
            state.ctx.add_state(AuthSession::SignedOut);
            state.ctx.update::<LoginInput>(|input| input.otp.clear());
        }
        None => {}
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Submit {
    Password,
    Otp,
    Back,
}

fn password_form(ui: &mut Ui, input: &mut LoginInput, status: &LoginStatus) -> Option<Submit> {
    let mut submit = None;

    ui.horizontal(|ui| {
        ui.label("Username:");
        ui.add(TextEdit::singleline(&mut input.username).desired_width(FIELD_WIDTH));
    });
    ui.add_space(8.0);
    ui.horizontal(|ui| {
        ui.label("Password:");
        let response = ui.add(
            TextEdit::singleline(&mut input.password)
                .password(true)
                .desired_width(FIELD_WIDTH),
        );
        if response.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter)) {
            submit = Some(Submit::Password);
        }
    });
    ui.add_space(16.0);

    let ready = !status.in_flight && !input.username.trim().is_empty() && !input.password.is_empty();
    if ui.add_enabled(ready, Button::new("Sign in")).clicked() {
        submit = Some(Submit::Password);
    }
    submit.filter(|_| ready)
}

fn otp_form(ui: &mut Ui, input: &mut LoginInput, username: &str, status: &LoginStatus) -> Option<Submit> {
    let mut submit = None;

    ui.label(format!("Enter the 6-digit code for {username}"));
    ui.add_space(8.0);
    ui.horizontal(|ui| {
        ui.label("OTP Code:");
        let response = ui.add(
            TextEdit::singleline(&mut input.otp)
                .char_limit(6)
                .desired_width(96.0),
        );
        if response.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter)) {
            submit = Some(Submit::Otp);
        }
    });
    ui.add_space(16.0);

    ui.horizontal(|ui| {
        if ui.add_enabled(!status.in_flight, Button::new("Verify")).clicked() {
            submit = Some(Submit::Otp);
        }
        if ui.add_enabled(!status.in_flight, Button::new("Back")).clicked() {
            submit = Some(Submit::Back);
        }
    });
    submit.filter(|_| !status.in_flight)
}
