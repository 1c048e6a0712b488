// src/ui/analyses.rs
use eframe::egui;

use crate::state::AppState;

enum ListAction {
    New,
    QuickEntry,
    Refresh,
    Open(String),
    SignOut,
}

pub fn show_analyses_view(ui: &mut egui::Ui, state: &mut AppState) {
    let mut action = None;

    ui.horizontal(|ui| {
        if let Some(user) = state.current_user() {
            ui.label(format!("Signed in as {}", user.display_name));
            if !user.email.is_empty() {
                ui.weak(format!("({})", user.email));
            }
        }
        ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
            if ui.button("Sign Out").clicked() {
                action = Some(ListAction::SignOut);
            }
        });
    });
    ui.separator();

    ui.horizontal(|ui| {
        ui.heading("My Analyses");
        if ui.button("+ New Analysis").clicked() {
            action = Some(ListAction::New);
        }
        if ui
            .button("Quick Entry")
            .on_hover_text("Fill in a P&L and save it as a new analysis")
            .clicked()
        {
            action = Some(ListAction::QuickEntry);
        }
        if ui.button("⟳ Refresh").clicked() {
            action = Some(ListAction::Refresh);
        }
    });
    ui.add_space(8.0);

    if state.analyses.is_empty() {
        ui.label("No analyses yet. Create one to get started.");
    } else {
        egui::ScrollArea::vertical()
            .id_source("analyses_list")
            .show(ui, |ui| {
                for analysis in &state.analyses {
                    ui.horizontal(|ui| {
                        if ui.link(&analysis.name).clicked() {
                            action = Some(ListAction::Open(analysis.id.clone()));
                        }
                        ui.weak(analysis.created_at.format("%Y-%m-%d %H:%M").to_string());
                    });
                }
            });
    }

    match action {
        Some(ListAction::New) => state.create_new_analysis(),
        Some(ListAction::QuickEntry) => state.start_draft(),
        Some(ListAction::Refresh) => {
            if let Err(e) = state.refresh_analyses() {
                state.error_message = Some(e.to_string());
            }
        }
        Some(ListAction::Open(id)) => state.open_analysis(&id),
        Some(ListAction::SignOut) => state.sign_out(),
        None => {}
    }
}
