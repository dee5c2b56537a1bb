//! Top-level entry point for running the viewer as a native window.

use eframe::egui;

use super::EegPagerApp;

/// Initial window size in points.
pub const WINDOW_SIZE: [f32; 2] = [1400.0, 900.0];

/// Plot size assumed before the first frame measures it; close to what the
/// default window leaves for the plot.
pub const INITIAL_PLOT_PX: [u32; 2] = [1380, 800];

/// Open a native window and enter the eframe event loop.
///
/// The call blocks until the window is closed. Dropping the app closes the
/// session, which asks the page server to exit.
pub fn run_viewer(app: EegPagerApp, title: &str) -> eframe::Result<()> {
    let opts = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title(title)
            .with_inner_size(egui::vec2(WINDOW_SIZE[0], WINDOW_SIZE[1])),
        ..Default::default()
    };
    eframe::run_native(title, opts, Box::new(|_cc| Ok(Box::new(app))))
}
