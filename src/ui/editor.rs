// src/ui/editor.rs
use eframe::egui;
use rfd::FileDialog;

use super::{charts, sankey};
use crate::analysis::{format_amount, FlowGraph};
use crate::config::analysis::NAME_MAX_LEN;
use crate::config::PlLine;
use crate::file::export::save_flows_csv;
use crate::state::{AnalysisEditor, AppState, EditScope};

enum EditorAction {
    Save(EditScope),
    Back,
    Export(FlowGraph),
}

pub fn show_editor_view(ui: &mut egui::Ui, state: &mut AppState) {
    if let Some(message) = state.page_error.as_ref().map(ToString::to_string) {
        ui.vertical_centered(|ui| {
            ui.add_space(40.0);
            ui.heading(message);
            ui.add_space(16.0);
            if ui.button("← Back to analyses").clicked() {
                state.show_analyses();
            }
        });
        return;
    }

    let options = state.diagram_options();
    let mut action = None;

    if let Some(editor) = state.editor.as_mut() {
        egui::ScrollArea::both()
            .id_source("editor_scroll")
            .show(ui, |ui| {
                if ui.button("← Back to analyses").clicked() {
                    action = Some(EditorAction::Back);
                }
                ui.add_space(8.0);

                draw_name(ui, editor, &mut action);
                ui.add_space(12.0);
                draw_table(ui, editor, &mut action);
                ui.add_space(16.0);

                let flows = editor.flows();
                draw_flow_table(ui, &flows, &mut action);
                ui.add_space(16.0);

                egui::CollapsingHeader::new("P&L Waterfall")
                    .default_open(false)
                    .show(ui, |ui| charts::show_waterfall(ui, editor.rows()));
                ui.add_space(8.0);

                ui.heading("Sankey Diagram");
                ui.add_space(4.0);
                sankey::show_sankey(ui, &flows, &options);
            });
    }

    match action {
        Some(EditorAction::Save(scope)) => state.save_editor(scope),
        Some(EditorAction::Back) => state.show_analyses(),
        Some(EditorAction::Export(flows)) => export_flows(state, &flows),
        None => {}
    }
}

fn save_label(editor: &AnalysisEditor) -> &'static str {
    if editor.saving() {
        "Saving..."
    } else {
        "Save"
    }
}

fn draw_name(ui: &mut egui::Ui, editor: &mut AnalysisEditor, action: &mut Option<EditorAction>) {
    if editor.editing_name() {
        ui.horizontal(|ui| {
            let mut name = editor.name().to_string();
            let response = ui.add_enabled(
                !editor.saving(),
                egui::TextEdit::singleline(&mut name)
                    .char_limit(NAME_MAX_LEN)
                    .desired_width(320.0)
                    .hint_text("Enter analysis name"),
            );
            if response.changed() {
                editor.set_name(name);
            }

            if ui.add_enabled(!editor.saving(), egui::Button::new(save_label(editor))).clicked() {
                *action = Some(EditorAction::Save(EditScope::Name));
            }
            if !editor.is_new()
                && ui.add_enabled(!editor.saving(), egui::Button::new("Cancel")).clicked()
            {
                editor.cancel_name();
            }
        });
        if let Some(error) = editor.name_error() {
            ui.colored_label(egui::Color32::RED, error.to_string());
        }
    } else {
        ui.horizontal(|ui| {
            ui.heading(editor.name());
            if ui.small_button("✏").on_hover_text("Edit name").clicked() {
                editor.begin_edit_name();
            }
        });
    }

    if let Some(analysis) = editor.analysis() {
        ui.label(format!("Created {}", analysis.created_at.format("%Y-%m-%d %H:%M UTC")));
    }
}

fn draw_table(ui: &mut egui::Ui, editor: &mut AnalysisEditor, action: &mut Option<EditorAction>) {
    ui.group(|ui| {
        ui.horizontal(|ui| {
            ui.heading("P&L Table");
            if !editor.editing_table()
                && ui.small_button("✏").on_hover_text("Edit table").clicked()
            {
                editor.begin_edit_table();
            }
        });
        ui.add_space(4.0);

        egui::Grid::new("pl_table")
            .num_columns(2)
            .striped(true)
            .spacing([16.0, 6.0])
            .show(ui, |ui| {
                ui.strong("Line Item");
                ui.strong("Value");
                ui.end_row();

                for line in PlLine::ALL {
                    ui.label(line.label());
                    if line == PlLine::NetProfit {
                        ui.label(format_amount(editor.rows().net_profit()));
                    } else if editor.editing_table() {
                        let mut value = editor.rows().value(line).to_string();
                        let response = ui.add_enabled(
                            !editor.saving(),
                            egui::TextEdit::singleline(&mut value)
                                .desired_width(140.0)
                                .hint_text(format!("Enter {}", line.label())),
                        );
                        if response.changed() {
                            editor.set_row_value(line, value);
                        }
                    } else {
                        ui.label(editor.rows().value(line));
                    }
                    ui.end_row();
                }
            });

        if editor.editing_table() {
            ui.add_space(6.0);
            ui.horizontal(|ui| {
                let save = egui::Button::new(save_label(editor));
                if ui.add_enabled(!editor.saving(), save).clicked() {
                    *action = Some(EditorAction::Save(EditScope::Table));
                }
                if !editor.is_new()
                    && ui.add_enabled(!editor.saving(), egui::Button::new("Cancel")).clicked()
                {
                    editor.cancel_table();
                }
            });
        }

        if let Some(error) = editor.table_error() {
            ui.colored_label(egui::Color32::RED, error.to_string());
        }
        if let Some(error) = editor.save_error() {
            ui.colored_label(egui::Color32::RED, error);
        }
    });
}

fn draw_flow_table(ui: &mut egui::Ui, flows: &FlowGraph, action: &mut Option<EditorAction>) {
    ui.horizontal(|ui| {
        ui.heading("Flow Data");
        if ui.button("Export CSV…").clicked() {
            *action = Some(EditorAction::Export(flows.clone()));
        }
    });
    ui.label("Generated from the P&L table and visualized below.");
    ui.add_space(4.0);

    egui::Grid::new("flow_table")
        .num_columns(3)
        .striped(true)
        .spacing([24.0, 4.0])
        .show(ui, |ui| {
            ui.strong("Source");
            ui.strong("Target");
            ui.strong("Value");
            ui.end_row();

            for edge in &flows.edges {
                ui.label(&edge.source);
                ui.label(&edge.target);
                ui.label(format_amount(edge.value));
                ui.end_row();
            }
        });
}

fn export_flows(state: &mut AppState, flows: &FlowGraph) {
    let Some(path) = FileDialog::new()
        .add_filter("CSV files", &["csv"])
        .set_title("Export Flows")
        .set_file_name("flows.csv")
        .save_file()
    else {
        return;
    };

    if let Err(e) = save_flows_csv(&path, flows) {
        state.error_message = Some(format!("{e:#}"));
    }
}
