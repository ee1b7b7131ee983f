mod domain;
mod infrastructure;
mod presentation;

use eframe::egui;

fn main() -> Result<(), eframe::Error> {
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([880.0, 640.0])
            .with_title("FPV Drone Controller"),
        ..Default::default()
    };

    eframe::run_native(
        "FPV Drone Controller",
        options,
        Box::new(|cc| Ok(Box::new(presentation::app::DroneApp::new(cc)))),
    )
}
