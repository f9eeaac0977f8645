mod app;
mod color;
mod console;
mod data;
mod fit;
mod plotting;
mod state;
mod ui;

use app::HysteresisApp;
use eframe::egui;

fn main() -> eframe::Result {
    env_logger::init();

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title("Hysteresis Viewer")
            .with_inner_size([1280.0, 820.0])
            .with_min_inner_size([700.0, 450.0])
            .with_drag_and_drop(true),
        ..Default::default()
    };

    eframe::run_native(
        "Hysteresis Viewer",
        options,
        Box::new(|_cc| Ok(Box::new(HysteresisApp::default()))),
    )
}
