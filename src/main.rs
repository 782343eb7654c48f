//! StoreLens - Sales Analytics Dashboard
//!
//! A Rust application for exploring store sales exports: filter by date
//! range and store, then review profit and breakdown analyses as tables
//! and charts.

mod analysis;
mod charts;
mod data;
mod gui;

use eframe::egui;
use gui::StoreLensApp;

fn main() -> eframe::Result<()> {
    env_logger::init();

    // Configure native options
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1400.0, 800.0])
            .with_min_inner_size([1100.0, 700.0])
            .with_title("StoreLens"),
        ..Default::default()
    };

    // Run the application
    eframe::run_native(
        "StoreLens",
        options,
        Box::new(|cc| Ok(Box::new(StoreLensApp::new(cc)))),
    )
}
