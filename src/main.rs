use std::path::Path;

use eframe::egui;
use trendslice::app::TrendsliceApp;
use trendslice::config::DashboardConfig;
use trendslice::state::AppState;
use trendslice::ui::panels;

fn main() -> eframe::Result {
    env_logger::init();

    let config = DashboardConfig::from_env().unwrap_or_else(|e| {
        log::warn!("Falling back to default configuration: {e:#}");
        DashboardConfig::default()
    });

    let mut state = AppState::new(config);
    if let Some(path) = std::env::args_os().nth(1) {
        panels::load_path(&mut state, Path::new(&path));
    }

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 860.0])
            .with_min_inner_size([640.0, 420.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Trendslice – Time-Series Slicer",
        options,
        Box::new(move |_cc| Ok(Box::new(TrendsliceApp::new(state)))),
    )
}
