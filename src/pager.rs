//! Navigation controller: owns a negotiated session and keeps the current
//! page in sync with the cursor.
//!
//! Every cursor move follows the same sequence: publish `current_sec`, wait
//! for the buffer window to cover the page, read the page. Changes to the
//! page geometry additionally republish `page_specs` and invalidate
//! `buffer_limits` first.
//!
//! The cursor, window and page are only replaced together, after a successful
//! read. A failed load leaves the previous page in place and marks it stale;
//! the next navigation or geometry call then reloads even if nothing moved.

use std::path::Path;

use crate::config::{ProtocolTiming, SecondsPerPage};
use crate::data::annotations::AnnotationStore;
use crate::data::buffer::{BufferWindow, WindowBufferProtocol};
use crate::data::catalog::ChannelCatalog;
use crate::data::clock::clock_label;
use crate::data::discontinuity::DiscontinuityStore;
use crate::data::page::{PageReader, SampleMatrix};
use crate::data::render::{microvolts_per_cm, Autoscale, RenderTransform, RenderedPage};
use crate::data::status::{BufferStatus, BufferStatusProjector};
use crate::error::{Error, Result};
use crate::session::cancel::CancelToken;
use crate::session::heartbeat::now_secs;
use crate::session::Session;

/// The page server stops on its own once the viewer's heartbeat is this old;
/// the same threshold is used to judge the server's heartbeat.
pub const SERVER_STALE_SECS: f64 = 5.0;

/// Label y position as a fraction of the vertical limit.
const EVENT_LABEL_HEIGHT: f64 = 0.05;

/// One annotation placed on the current page.
#[derive(Debug, Clone, PartialEq)]
pub struct EventMarker {
    /// Seconds since page start.
    pub x: f64,
    pub label_y: f64,
    pub text: String,
}

pub struct Pager {
    session: Session,
    catalog: ChannelCatalog,
    buffer: WindowBufferProtocol,
    reader: PageReader,
    autoscale: Autoscale,
    annotations: AnnotationStore,
    discontinuities: DiscontinuityStore,
    token: CancelToken,
    curr_sec: i64,
    pixel_height: u32,
    window: Option<BufferWindow>,
    page: Option<SampleMatrix>,
    /// The page does not reflect the current cursor or geometry.
    stale: bool,
    /// `buffer_limits` still has to be invalidated for a geometry change.
    needs_reset: bool,
}

impl Pager {
    pub fn new(
        session: Session,
        catalog: ChannelCatalog,
        timing: ProtocolTiming,
        pixel_height: u32,
    ) -> Self {
        let token = CancelToken::new();
        let dir = session.directory().clone();
        let curr_sec = session.start_time().floor() as i64;
        Self {
            buffer: WindowBufferProtocol::new(dir.clone(), timing.clone(), token.clone()),
            reader: PageReader::new(dir, timing, token.clone()),
            session,
            catalog,
            autoscale: Autoscale::new(),
            annotations: AnnotationStore::default(),
            discontinuities: DiscontinuityStore::default(),
            token,
            curr_sec,
            pixel_height: pixel_height.max(1),
            window: None,
            page: None,
            stale: true,
            needs_reset: false,
        }
    }

    /// Load the first page, then the annotation and discontinuity sources.
    pub fn start(&mut self) -> Result<()> {
        self.load_at(self.clamp_cursor(self.curr_sec))?;
        self.reload_overlays();
        Ok(())
    }

    /// Re-read `events` (or the user CSV) and `discon`.
    pub fn reload_overlays(&mut self) {
        self.annotations =
            AnnotationStore::load(self.session.directory(), self.session.data_dir());
        self.discontinuities = DiscontinuityStore::load(self.session.directory());
        tracing::debug!(
            events = self.annotations.events().len(),
            discontinuities = self.discontinuities.records().len(),
            "overlays loaded"
        );
    }

    /// Replace the annotations with a user-selected CSV file.
    pub fn load_annotations_csv(&mut self, path: &Path) -> bool {
        self.annotations = AnnotationStore::load_csv(path);
        self.annotations.is_available()
    }

    /// Re-read the page at the current cursor.
    pub fn reload(&mut self) -> Result<()> {
        self.load_at(self.curr_sec)
    }

    /// Publish `target`, wait for the buffer to cover it, read the page, and
    /// only then make it current.
    fn load_at(&mut self, target: i64) -> Result<()> {
        match self.fetch(target) {
            Ok((window, page)) => {
                self.curr_sec = target;
                self.window = Some(window);
                self.page = Some(page);
                self.stale = false;
                Ok(())
            }
            Err(e) => {
                self.stale = true;
                tracing::warn!(
                    requested = target,
                    curr_sec = self.curr_sec,
                    error = %e,
                    "page load failed"
                );
                Err(e)
            }
        }
    }

    fn fetch(&self, target: i64) -> Result<(BufferWindow, SampleMatrix)> {
        if self.token.is_cancelled() {
            return Err(Error::Cancelled);
        }
        let spp = self.seconds_per_page().as_f64();
        self.session.write_cursor(target)?;
        let window = self.buffer.await_window(target as f64, target as f64 + spp)?;
        let page = self.reader.read(
            &window,
            target as f64,
            spp,
            self.session.pixel_width(),
            self.catalog.len(),
        )?;
        Ok((window, page))
    }

    /// Whether the last load failed and the shown page is out of date.
    pub fn is_stale(&self) -> bool {
        self.stale
    }

    fn min_cursor(&self) -> i64 {
        self.session.start_time().floor() as i64
    }

    fn max_cursor(&self) -> i64 {
        let spp = self.seconds_per_page().as_f64();
        let upper = (self.session.end_time() - spp).floor() as i64;
        upper.max(self.min_cursor())
    }

    fn clamp_cursor(&self, t: i64) -> i64 {
        t.clamp(self.min_cursor(), self.max_cursor())
    }

    /// Move the cursor to `target` (clamped) and reload if it changed or the
    /// current page is stale.
    fn move_to(&mut self, target: i64) -> Result<bool> {
        let target = self.clamp_cursor(target);
        if target == self.curr_sec && !self.stale {
            return Ok(false);
        }
        self.load_at(target)?;
        Ok(true)
    }

    fn advance(&mut self, secs: i64) -> Result<bool> {
        let spp = self.seconds_per_page().as_f64();
        if self.curr_sec as f64 + spp > self.session.end_time() {
            return Ok(false);
        }
        self.move_to(self.curr_sec + secs)
    }

    /// One page later; no-op once the page would run past the session end.
    pub fn page_forward(&mut self) -> Result<bool> {
        self.advance(i64::from(self.seconds_per_page().get()))
    }

    /// One page earlier, stopping at the session start.
    pub fn page_back(&mut self) -> Result<bool> {
        self.move_to(self.curr_sec - i64::from(self.seconds_per_page().get()))
    }

    /// One second later, same end rule as [`Self::page_forward`].
    pub fn step_forward(&mut self) -> Result<bool> {
        self.advance(1)
    }

    /// Jump to a position on the progress strip, `fraction` in [0, 1].
    pub fn jump_to_fraction(&mut self, fraction: f64) -> Result<bool> {
        let Some(projector) = self.projector() else {
            return Ok(false);
        };
        let t = projector.time_at(fraction.clamp(0.0, 1.0));
        self.move_to(t.floor() as i64)
    }

    pub fn set_seconds_per_page(&mut self, seconds_per_page: SecondsPerPage) -> Result<bool> {
        if self.session.set_seconds_per_page(seconds_per_page)? {
            self.needs_reset = true;
        } else if !self.stale {
            return Ok(false);
        }
        self.apply_geometry()?;
        Ok(true)
    }

    /// Track the plot size. Only a width change reaches the server.
    pub fn resize(&mut self, pixel_width: u32, pixel_height: u32) -> Result<bool> {
        self.pixel_height = pixel_height.max(1);
        if self.session.set_pixel_width(pixel_width)? {
            tracing::debug!(pixel_width, "plot width changed");
            self.needs_reset = true;
        } else if !self.stale {
            return Ok(false);
        }
        self.apply_geometry()?;
        Ok(true)
    }

    /// Invalidate the buffer if the geometry changed, then load the page at
    /// the clamped cursor.
    fn apply_geometry(&mut self) -> Result<()> {
        if self.needs_reset {
            self.stale = true;
            self.buffer.reset(self.seconds_per_page())?;
            self.needs_reset = false;
        }
        self.load_at(self.clamp_cursor(self.curr_sec))
    }

    pub fn scale_up(&mut self) {
        self.autoscale.scale_up();
    }

    pub fn scale_down(&mut self) {
        self.autoscale.scale_down();
    }

    /// Forget the vertical limit; the next render recomputes it.
    pub fn reset_autoscale(&mut self) {
        self.autoscale.reset();
    }

    /// The current page ready for plotting, `None` before the first load.
    pub fn render(&mut self, negative_up: bool) -> Option<RenderedPage> {
        let page = self.page.as_ref()?;
        let transform =
            RenderTransform::new(f64::from(self.pixel_height), self.seconds_per_page().as_f64());
        Some(transform.render(page, negative_up, &mut self.autoscale))
    }

    /// Annotations inside the current page, positioned relative to its start.
    pub fn event_markers(&self) -> Vec<EventMarker> {
        let curr = self.curr_sec as f64;
        let label_y = self.autoscale.vertical_limit().unwrap_or(0.0) * EVENT_LABEL_HEIGHT;
        self.annotations
            .visible(curr, self.seconds_per_page().as_f64())
            .map(|e| EventMarker {
                x: e.start_sec - curr,
                label_y,
                text: e.text.clone(),
            })
            .collect()
    }

    fn projector(&self) -> Option<BufferStatusProjector> {
        BufferStatusProjector::new(self.session.start_time(), self.session.end_time())
    }

    /// Progress strip contents for a strip `strip_px` pixels wide.
    pub fn buffer_status(&self, strip_px: f64) -> Option<BufferStatus> {
        let window = self.buffer.current().or(self.window);
        Some(self.projector()?.status(
            self.curr_sec as f64,
            self.seconds_per_page().as_f64(),
            strip_px,
            window.as_ref(),
            self.discontinuities.records(),
        ))
    }

    /// `None` until the server reports its own heartbeat.
    pub fn server_alive(&self) -> Option<bool> {
        self.buffer
            .current()
            .and_then(|w| w.server_alive(now_secs(), SERVER_STALE_SECS))
    }

    pub fn uv_per_cm(&self, dpi: f64) -> Option<f64> {
        self.autoscale
            .vertical_limit()
            .map(|v| microvolts_per_cm(v, f64::from(self.pixel_height), dpi))
    }

    pub fn clock_label(&self) -> String {
        clock_label(self.curr_sec)
    }

    pub fn curr_sec(&self) -> i64 {
        self.curr_sec
    }

    pub fn seconds_per_page(&self) -> SecondsPerPage {
        self.session.seconds_per_page()
    }

    pub fn pixel_width(&self) -> u32 {
        self.session.pixel_width()
    }

    pub fn pixel_height(&self) -> u32 {
        self.pixel_height
    }

    pub fn catalog(&self) -> &ChannelCatalog {
        &self.catalog
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn window(&self) -> Option<&BufferWindow> {
        self.window.as_ref()
    }

    pub fn page(&self) -> Option<&SampleMatrix> {
        self.page.as_ref()
    }

    pub fn annotations(&self) -> &AnnotationStore {
        &self.annotations
    }

    pub fn discontinuities(&self) -> &DiscontinuityStore {
        &self.discontinuities
    }

    pub fn vertical_limit(&self) -> Option<f64> {
        self.autoscale.vertical_limit()
    }

    /// Cancel pending waits, ask the server to exit, stop the liveness signal.
    ///
    /// Cancellation is permanent: every later load fails with
    /// [`Error::Cancelled`] without touching the session directory.
    pub fn close(&mut self) -> Result<()> {
        self.token.cancel();
        self.session.close()
    }
}
