// src/app.rs
use eframe::egui;

use crate::state::{AppState, Screen};

pub struct PlFlowApp {
    state: AppState,
}

impl PlFlowApp {
    pub fn new(state: AppState) -> Self {
        Self { state }
    }

    fn show_menu(&mut self, ui: &mut egui::Ui) {
        egui::menu::bar(ui, |ui| {
            ui.menu_button("File", |ui| {
                let signed_in = self.state.current_user().is_some();
                if ui.add_enabled(signed_in, egui::Button::new("New Analysis")).clicked() {
                    self.state.create_new_analysis();
                    ui.close_menu();
                }
                if ui.add_enabled(signed_in, egui::Button::new("Quick Entry")).clicked() {
                    self.state.start_draft();
                    ui.close_menu();
                }
                ui.separator();
                if ui.add_enabled(signed_in, egui::Button::new("Sign Out")).clicked() {
                    self.state.sign_out();
                    ui.close_menu();
                }
            });

            ui.separator();

            let user_label = self
                .state
                .current_user()
                .map(|user| format!("👤 {}", user.display_name));
            if let Some(label) = user_label {
                if ui
                    .selectable_label(self.state.current_screen == Screen::Analyses, "Analyses")
                    .clicked()
                {
                    self.state.show_analyses();
                }
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    ui.label(label);
                });
            }
        });
    }
}

impl eframe::App for PlFlowApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        egui::TopBottomPanel::top("top_panel").show(ctx, |ui| {
            self.show_menu(ui);
        });

        egui::CentralPanel::default().show(ctx, |ui| match self.state.current_screen {
            Screen::SignIn => crate::ui::sign_in::show_sign_in_view(ui, &mut self.state),
            Screen::Analyses => crate::ui::analyses::show_analyses_view(ui, &mut self.state),
            Screen::Editor => crate::ui::editor::show_editor_view(ui, &mut self.state),
        });

        // Show error modal if needed
        let error_msg = self.state.error_message.clone();
        if let Some(error) = error_msg {
            egui::Window::new("Error")
                .collapsible(false)
                .resizable(false)
                .anchor(egui::Align2::CENTER_CENTER, egui::vec2(0.0, 0.0))
                .show(ctx, |ui| {
                    ui.label(&error);
                    if ui.button("OK").clicked() {
                        self.state.error_message = None;
                    }
                });
        }
    }
}
