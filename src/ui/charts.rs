// src/ui/charts.rs
use eframe::egui;
use egui_plot::{Bar, BarChart, Plot};

use super::sankey::node_color;
use crate::analysis::flow::amount_or_zero;
use crate::config::{PlLine, PlTable};

/// One floating bar: drawn from `base` to `base + delta`.
#[derive(Debug, Clone, PartialEq)]
pub struct WaterfallStep {
    pub line: PlLine,
    pub base: f64,
    pub delta: f64,
}

/// Revenue, minus COGs, minus Operating Expenses, landing on Net Profit.
pub fn waterfall_steps(rows: &PlTable) -> Vec<WaterfallStep> {
    let revenue = amount_or_zero(rows.value(PlLine::Revenue));
    let cogs = amount_or_zero(rows.value(PlLine::Cogs));
    let opex = amount_or_zero(rows.value(PlLine::OperatingExpenses));

    vec![
        WaterfallStep { line: PlLine::Revenue, base: 0.0, delta: revenue },
        WaterfallStep { line: PlLine::Cogs, base: revenue, delta: -cogs },
        WaterfallStep { line: PlLine::OperatingExpenses, base: revenue - cogs, delta: -opex },
        WaterfallStep { line: PlLine::NetProfit, base: 0.0, delta: rows.net_profit() },
    ]
}

pub fn show_waterfall(ui: &mut egui::Ui, rows: &PlTable) {
    let bars: Vec<Bar> = waterfall_steps(rows)
        .into_iter()
        .enumerate()
        .map(|(i, step)| {
            Bar::new(i as f64, step.delta)
                .base_offset(step.base)
                .name(step.line.label())
                .width(0.6)
                .fill(node_color(step.line.label()))
        })
        .collect();

    Plot::new("pl_waterfall")
        .height(200.0)
        .allow_zoom(false)
        .allow_drag(false)
        .allow_scroll(false)
        .show_background(false)
        .include_y(0.0)
        .show(ui, |plot_ui| {
            plot_ui.bar_chart(BarChart::new(bars));
        });
}
