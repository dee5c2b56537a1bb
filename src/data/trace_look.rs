//! TraceLook: colour and width of the channel traces.

use eframe::egui;

/// Trace colour when all channels share one colour.
pub const SINGLE_TRACE_COLOR: egui::Color32 = egui::Color32::from_rgb(0, 113, 189);

const PALETTE: [egui::Color32; 10] = [
    egui::Color32::from_rgb(31, 119, 180),
    egui::Color32::from_rgb(255, 127, 14),
    egui::Color32::from_rgb(44, 160, 44),
    egui::Color32::from_rgb(214, 39, 40),
    egui::Color32::from_rgb(148, 103, 189),
    egui::Color32::from_rgb(140, 86, 75),
    egui::Color32::from_rgb(227, 119, 194),
    egui::Color32::from_rgb(127, 127, 127),
    egui::Color32::from_rgb(188, 189, 34),
    egui::Color32::from_rgb(23, 190, 207),
];

/// The visual presentation of one channel trace.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TraceLook {
    pub color: egui::Color32,
    pub width: f32,
}

impl Default for TraceLook {
    fn default() -> Self {
        Self {
            color: SINGLE_TRACE_COLOR,
            width: 1.0,
        }
    }
}

impl TraceLook {
    /// Look of channel `index`: a palette colour in multicolour mode, the
    /// single trace colour otherwise.
    pub fn for_channel(index: usize, multicolor: bool) -> Self {
        let color = if multicolor {
            Self::alloc_color(index)
        } else {
            SINGLE_TRACE_COLOR
        };
        Self {
            color,
            ..Default::default()
        }
    }

    /// Allocate a distinct color for the given channel index.
    pub fn alloc_color(index: usize) -> egui::Color32 {
        PALETTE[index % PALETTE.len()]
    }
}
