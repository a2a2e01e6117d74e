mod app;
mod color;
mod config;
mod data;
mod error;
mod state;
mod ui;

use app::NexusApp;
use config::DashboardConfig;
use eframe::egui;

fn main() -> eframe::Result {
    env_logger::init();

    let config = DashboardConfig::from_env();
    log::info!(
        "Starting with data {} and reference {}",
        config.data_path.display(),
        config.reference_path.display()
    );

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 860.0])
            .with_min_inner_size([720.0, 480.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Nexus Dashboard",
        options,
        Box::new(|_cc| Ok(Box::new(NexusApp::new(config)))),
    )
}
