//! egui front end: a page plot, a control bar and the buffer progress strip.
//!
//! The app owns the [`Pager`] and drives it from the UI thread. Each
//! navigation blocks until the page server has produced the page, the same
//! way a paused scope waits for its next acquisition.

mod input;
mod plot;
mod run;
mod strip;
mod update;

use std::path::PathBuf;

use crate::config::SecondsPerPage;
use crate::error::Error;
use crate::pager::Pager;
use crate::persistence::{save_state_to_path, ViewStateSerde};

pub use input::{actions_from_input, ViewerAction};
pub use run::{run_viewer, INITIAL_PLOT_PX, WINDOW_SIZE};

pub struct EegPagerApp {
    pager: Pager,
    view: ViewStateSerde,
    dpi: f64,
    /// Where toggles are written when they change.
    state_path: Option<PathBuf>,
    /// Plot area in physical pixels, measured every frame.
    plot_px: Option<[u32; 2]>,
    sized: bool,
    pending: Vec<ViewerAction>,
    events_path: String,
    status_line: Option<String>,
}

impl EegPagerApp {
    pub fn new(pager: Pager, view: ViewStateSerde, dpi: f64) -> Self {
        Self {
            pager,
            view,
            dpi,
            state_path: None,
            plot_px: None,
            sized: false,
            pending: Vec::new(),
            events_path: String::new(),
            status_line: None,
        }
    }

    pub fn with_state_path(mut self, path: PathBuf) -> Self {
        self.state_path = Some(path);
        self
    }

    pub fn view_state(&self) -> &ViewStateSerde {
        &self.view
    }

    pub fn pager(&self) -> &Pager {
        &self.pager
    }

    fn report(&mut self, what: &str, e: Error) {
        tracing::warn!(error = %e, "{} failed", what);
        self.status_line = Some(format!("{}: {}", what, e));
    }

    /// Push the measured plot size to the pager. A width change makes the
    /// server rebuild its buffer, so this runs once at startup and otherwise
    /// only right before a navigation.
    fn sync_size(&mut self) -> bool {
        let Some([w, h]) = self.plot_px else {
            return true;
        };
        match self.pager.resize(w, h) {
            Ok(_) => true,
            Err(e) => {
                self.report("resize", e);
                false
            }
        }
    }

    fn apply_action(&mut self, action: ViewerAction) {
        if !self.sync_size() {
            return;
        }
        let result = match action {
            ViewerAction::PageForward => self.pager.page_forward().map(|_| ()),
            ViewerAction::PageBack => self.pager.page_back().map(|_| ()),
            ViewerAction::StepForward => self.pager.step_forward().map(|_| ()),
            ViewerAction::JumpTo(fraction) => self.pager.jump_to_fraction(fraction).map(|_| ()),
            ViewerAction::Reload => self.pager.reload(),
            ViewerAction::ScaleUp => {
                self.pager.scale_up();
                Ok(())
            }
            ViewerAction::ScaleDown => {
                self.pager.scale_down();
                Ok(())
            }
            ViewerAction::ResetAutoscale => {
                self.pager.reset_autoscale();
                Ok(())
            }
        };
        match result {
            Ok(()) => self.status_line = None,
            Err(e) => self.report("navigation", e),
        }
    }

    fn change_seconds_per_page(&mut self, seconds_per_page: SecondsPerPage) {
        if !self.sync_size() {
            return;
        }
        match self.pager.set_seconds_per_page(seconds_per_page) {
            Ok(_) => {
                self.view.seconds_per_page = seconds_per_page;
                self.save_view_state();
            }
            Err(e) => self.report("page length change", e),
        }
    }

    fn load_events_file(&mut self) {
        let path = self.events_path.trim();
        if path.is_empty() {
            self.pager.reload_overlays();
            return;
        }
        let path = PathBuf::from(path);
        if self.pager.load_annotations_csv(&path) {
            self.status_line = None;
        } else {
            self.status_line = Some(format!("could not read events from {}", path.display()));
        }
    }

    fn save_view_state(&mut self) {
        let Some(path) = self.state_path.clone() else {
            return;
        };
        if let Err(e) = save_state_to_path(&self.view, &path) {
            self.report("saving view state", e);
        }
    }
}
