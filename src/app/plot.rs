//! Central page plot: stacked channel traces, channel labels and event markers.
//!
//! The page is drawn with y growing downwards (channel 0 on top), so every
//! rendered y is negated before it reaches egui_plot.

use eframe::egui;
use egui::{Align2, Color32, RichText};
use egui_plot::{Line, Plot, PlotPoint, Text, VLine};

use crate::data::trace_look::TraceLook;

use super::EegPagerApp;

/// Room left of x = 0 for the channel labels, as a fraction of the page.
const LABEL_MARGIN: f64 = 0.06;

impl EegPagerApp {
    pub(super) fn render_central_plot(&mut self, ctx: &egui::Context) {
        egui::CentralPanel::default().show(ctx, |ui| {
            let size = ui.available_size() * ctx.pixels_per_point();
            self.plot_px = Some([
                size.x.round().max(1.0) as u32,
                size.y.round().max(1.0) as u32,
            ]);

            let Some(page) = self.pager.render(self.view.negative_up) else {
                ui.centered_and_justified(|ui| ui.label("Waiting for page data..."));
                return;
            };
            let labels = self.pager.catalog().labels();
            let markers = if self.view.hide_annotations {
                Vec::new()
            } else {
                self.pager.event_markers()
            };
            let multicolor = self.view.multicolor;
            let vlim = page.vertical_limit;
            let spp = page.seconds_per_page;

            Plot::new("eeg_page")
                .allow_drag(false)
                .allow_zoom(false)
                .allow_scroll(false)
                .allow_boxed_zoom(false)
                .allow_double_click_reset(false)
                .show_axes([true, false])
                .show_grid([true, false])
                .show(ui, |plot_ui| {
                    plot_ui.set_plot_bounds_x(-LABEL_MARGIN * spp..=spp);
                    plot_ui.set_plot_bounds_y(-vlim..=0.0);

                    for (i, offset) in page.offsets.iter().enumerate() {
                        let look = TraceLook::for_channel(i, multicolor);
                        let name = labels.get(i).cloned().unwrap_or_default();
                        for seg in page.segments(i) {
                            let pts: Vec<[f64; 2]> = seg.into_iter().map(|[x, y]| [x, -y]).collect();
                            plot_ui.line(
                                Line::new(name.clone(), pts)
                                    .color(look.color)
                                    .width(look.width),
                            );
                        }
                        plot_ui.text(
                            Text::new(
                                format!("label_{}", i),
                                PlotPoint::new(0.0, -offset),
                                RichText::new(format!("{} ", name)).color(look.color),
                            )
                            .anchor(Align2::RIGHT_CENTER),
                        );
                    }

                    for (i, m) in markers.iter().enumerate() {
                        plot_ui.vline(
                            VLine::new(format!("event_{}", i), m.x)
                                .color(Color32::BLACK)
                                .width(1.0),
                        );
                        plot_ui.text(
                            Text::new(
                                format!("event_text_{}", i),
                                PlotPoint::new(m.x, -m.label_y),
                                RichText::new(m.text.as_str())
                                    .color(Color32::BLACK)
                                    .background_color(Color32::from_rgb(245, 222, 179)),
                            )
                            .anchor(Align2::LEFT_TOP),
                        );
                    }
                });
        });
    }
}
