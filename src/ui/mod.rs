pub mod app;
pub mod components;
pub mod state;
pub mod theme;

pub use app::CaresmaApp;
pub use state::{ActiveView, AppState};
pub use theme::Theme;

use crate::integration::OrchestratorHandle;

/// Launch the desktop UI. Blocks until the window closes.
pub fn run(handle: OrchestratorHandle) -> eframe::Result<()> {
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1100.0, 760.0])
            .with_min_inner_size([800.0, 600.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Caresma",
        options,
        Box::new(move |cc| Ok(Box::new(CaresmaApp::new(cc, handle)))),
    )
}
