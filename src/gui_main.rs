use eframe::{run_native, NativeOptions};
use egui::ViewportBuilder;

use pdfstudio::gui::StudioApp;

fn main() -> Result<(), eframe::Error> {
    env_logger::init();

    let options = NativeOptions {
        viewport: ViewportBuilder::default()
            .with_inner_size([1280.0, 800.0])
            .with_min_inner_size([900.0, 600.0])
            .with_title("PDF Smart Studio"),
        ..Default::default()
    };

    run_native(
        "PDF Smart Studio",
        options,
        Box::new(|cc| Box::new(StudioApp::new(cc))),
    )
}
