//! Buffer progress strip under the plot. A click jumps to that position.

use eframe::egui;
use egui::{Color32, CornerRadius, Rect, Sense};

use crate::data::status::StripSegment;
use crate::data::trace_look::SINGLE_TRACE_COLOR;

use super::input::ViewerAction;
use super::EegPagerApp;

const STRIP_HEIGHT: f32 = 14.0;
const BACKGROUND: Color32 = Color32::from_gray(225);
const BUFFERED: Color32 = Color32::from_rgb(140, 200, 140);
const GAP: Color32 = Color32::from_rgb(210, 60, 60);

fn segment_rect(strip: Rect, seg: StripSegment) -> Rect {
    let x0 = strip.left() + seg.x.clamp(0.0, 1.0) as f32 * strip.width();
    let x1 = strip.left() + (seg.x + seg.width).clamp(0.0, 1.0) as f32 * strip.width();
    Rect::from_min_max(
        egui::pos2(x0, strip.top()),
        egui::pos2(x1.max(x0), strip.bottom()),
    )
}

impl EegPagerApp {
    pub(super) fn render_buffer_strip(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::bottom("buffer_strip").show(ctx, |ui| {
            let width = ui.available_width();
            let (rect, response) =
                ui.allocate_exact_size(egui::vec2(width, STRIP_HEIGHT), Sense::click());
            let painter = ui.painter_at(rect);
            painter.rect_filled(rect, CornerRadius::same(2), BACKGROUND);

            let strip_px = f64::from(rect.width() * ctx.pixels_per_point());
            if let Some(status) = self.pager.buffer_status(strip_px) {
                if let Some(buffer) = status.buffer {
                    painter.rect_filled(segment_rect(rect, buffer), CornerRadius::ZERO, BUFFERED);
                }
                for gap in &status.gaps {
                    painter.rect_filled(segment_rect(rect, *gap), CornerRadius::ZERO, GAP);
                }
                painter.rect_filled(
                    segment_rect(rect, status.page),
                    CornerRadius::ZERO,
                    SINGLE_TRACE_COLOR,
                );
            }

            if response.clicked() {
                if let Some(pos) = response.interact_pointer_pos() {
                    let fraction = f64::from((pos.x - rect.left()) / rect.width());
                    self.pending.push(ViewerAction::JumpTo(fraction));
                }
            }
        });
    }
}
