mod app;
mod color;
mod ui;

use app::ExoscopeApp;
use eframe::egui;
use exoscope::config::Config;

fn main() -> eframe::Result {
    env_logger::init();

    let config = Config::from_env();

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 820.0])
            .with_min_inner_size([720.0, 480.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Exoscope – Exoplanet Classifier",
        options,
        Box::new(move |_cc| Ok(Box::new(ExoscopeApp::new(&config)))),
    )
}
