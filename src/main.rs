// src/main.rs
use anyhow::Result;
use eframe::egui;
use tracing_subscriber::EnvFilter;

mod analysis;
mod app;
mod config;
mod error;
mod file;
mod state;
mod ui;

use app::PlFlowApp;
use config::Settings;
use state::AppState;

fn main() -> Result<()> {
    let settings = Settings::load()?;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&settings.log_filter));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let state = AppState::from_settings(settings)?;

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1024.0, 768.0])
            .with_title("P&L Flow"),
        ..Default::default()
    };

    eframe::run_native(
        "P&L Flow",
        options,
        Box::new(|_cc| Box::new(PlFlowApp::new(state))),
    )
    .map_err(|e| anyhow::anyhow!("Failed to run application: {}", e))
}
