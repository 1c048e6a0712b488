// src/ui/sign_in.rs
use eframe::egui;

use crate::state::AppState;

pub fn show_sign_in_view(ui: &mut egui::Ui, state: &mut AppState) {
    ui.vertical_centered(|ui| {
        ui.add_space(80.0);
        ui.heading("P&L Flow");
        ui.add_space(8.0);
        ui.label("Sign in to access your P&L data and visualizations");
        ui.add_space(24.0);

        let label = format!("Sign in as {}", state.settings.user.display_name);
        if ui.add(egui::Button::new(label).min_size(egui::vec2(220.0, 32.0))).clicked() {
            state.sign_in();
        }
    });
}
