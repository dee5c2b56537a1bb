//! Per-frame update: input, control bar, progress strip, plot, then the
//! queued pager actions.

use std::time::Duration;

use eframe::egui;

use crate::config::SecondsPerPage;
use crate::data::clock::uv_per_cm_label;

use super::input::{actions_from_input, ViewerAction};
use super::EegPagerApp;

/// The server keeps decoding ahead; redraw the strip at this rate.
const IDLE_REPAINT: Duration = Duration::from_millis(500);

impl EegPagerApp {
    fn render_controls(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::top("pager_controls").show(ctx, |ui| {
            ui.horizontal(|ui| {
                let current = self.pager.seconds_per_page();
                let mut spp = current;
                egui::ComboBox::from_label("sec/page")
                    .selected_text(spp.to_string())
                    .show_ui(ui, |ui| {
                        for choice in SecondsPerPage::all() {
                            ui.selectable_value(&mut spp, choice, choice.to_string());
                        }
                    });
                if spp != current {
                    self.change_seconds_per_page(spp);
                }

                ui.separator();
                let mut changed = false;
                changed |= ui.checkbox(&mut self.view.negative_up, "Negative up").changed();
                changed |= ui.checkbox(&mut self.view.multicolor, "Multicolor").changed();
                changed |= ui
                    .checkbox(&mut self.view.hide_annotations, "Hide annotations")
                    .changed();
                if changed {
                    self.save_view_state();
                }

                ui.separator();
                if ui.button("<<").on_hover_text("Previous page (Left)").clicked() {
                    self.pending.push(ViewerAction::PageBack);
                }
                if ui.button(">>").on_hover_text("Next page (Right)").clicked() {
                    self.pending.push(ViewerAction::PageForward);
                }
                if ui.button("+").on_hover_text("Increase gain (Up)").clicked() {
                    self.pending.push(ViewerAction::ScaleUp);
                }
                if ui.button("-").on_hover_text("Decrease gain (Down)").clicked() {
                    self.pending.push(ViewerAction::ScaleDown);
                }
                if ui.button("Autoscale").clicked() {
                    self.pending.push(ViewerAction::ResetAutoscale);
                }
            });
            ui.horizontal(|ui| {
                ui.label(self.pager.clock_label());
                if let Some(v) = self.pager.uv_per_cm(self.dpi) {
                    ui.monospace(uv_per_cm_label(v));
                }
                if self.pager.server_alive() == Some(false) {
                    ui.colored_label(egui::Color32::LIGHT_RED, "page server not responding");
                }
                if self.pager.is_stale() {
                    ui.colored_label(egui::Color32::YELLOW, "page out of date");
                    if ui.button("Retry").clicked() {
                        self.pending.push(ViewerAction::Reload);
                    }
                }
                ui.separator();
                ui.label("Events file");
                ui.text_edit_singleline(&mut self.events_path);
                if ui
                    .button("Load")
                    .on_hover_text("Empty path reloads the server's events")
                    .clicked()
                {
                    self.load_events_file();
                }
                if let Some(msg) = &self.status_line {
                    ui.colored_label(egui::Color32::LIGHT_RED, msg.as_str());
                }
            });
        });
    }
}

impl eframe::App for EegPagerApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        if !ctx.wants_keyboard_input() {
            let actions = ctx.input(actions_from_input);
            self.pending.extend(actions);
        }

        self.render_controls(ctx);
        self.render_buffer_strip(ctx);
        self.render_central_plot(ctx);

        if !self.sized && self.plot_px.is_some() {
            self.sync_size();
            self.sized = true;
        }

        let pending = std::mem::take(&mut self.pending);
        if !pending.is_empty() {
            for action in pending {
                self.apply_action(action);
            }
            ctx.request_repaint();
        }
        ctx.request_repaint_after(IDLE_REPAINT);
    }
}
