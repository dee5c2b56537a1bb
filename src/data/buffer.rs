//! The producer/consumer handshake over `buffer_limits`.
//!
//! The page server decodes ahead of the viewer and advertises the decoded time
//! range in `buffer_limits`. Before reading a page the viewer waits until that
//! range covers the requested window. After a change that alters how much data
//! the server must produce per pixel column, the viewer invalidates the file
//! with a sentinel pair that no request can satisfy.

use crate::config::{ProtocolTiming, SecondsPerPage};
use crate::error::Result;
use crate::session::cancel::{CancelToken, Waiter};
use crate::session::directory::{files, SessionDirectory};

/// Decoded, readable time range advertised by the page server.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BufferWindow {
    pub available_start_sec: f64,
    pub available_end_sec: f64,
    /// Server wall-clock timestamp from the optional third line.
    pub server_heartbeat: Option<f64>,
}

impl BufferWindow {
    pub fn new(available_start_sec: f64, available_end_sec: f64) -> Self {
        Self {
            available_start_sec,
            available_end_sec,
            server_heartbeat: None,
        }
    }

    /// The invalidation pair `(0.0, -seconds_per_page)`.
    pub fn sentinel(seconds_per_page: SecondsPerPage) -> Self {
        Self::new(0.0, -seconds_per_page.as_f64())
    }

    /// Parse the file body. `None` for fewer than two lines or unparsable numbers.
    pub fn parse(text: &str) -> Option<Self> {
        let mut lines = text.lines().map(str::trim);
        let start = lines.next()?.parse::<f64>().ok()?;
        let end = lines.next()?.parse::<f64>().ok()?;
        let server_heartbeat = lines.next().and_then(|l| l.parse::<f64>().ok());
        Some(Self {
            available_start_sec: start,
            available_end_sec: end,
            server_heartbeat,
        })
    }

    pub fn render(&self) -> String {
        format!("{:?}\n{:?}\n", self.available_start_sec, self.available_end_sec)
    }

    /// `false` for the sentinel (start after end).
    pub fn is_valid(&self) -> bool {
        self.available_start_sec <= self.available_end_sec
    }

    pub fn covers(&self, requested_start_sec: f64, requested_end_sec: f64) -> bool {
        requested_start_sec >= self.available_start_sec
            && requested_end_sec <= self.available_end_sec
    }

    /// Whether the server's own heartbeat is fresher than `stale_after` seconds.
    /// `None` when the server did not report one.
    pub fn server_alive(&self, now: f64, stale_after: f64) -> Option<bool> {
        self.server_heartbeat.map(|hb| now - hb <= stale_after)
    }
}

/// Client side of the `buffer_limits` handshake.
pub struct WindowBufferProtocol {
    dir: SessionDirectory,
    timing: ProtocolTiming,
    token: CancelToken,
}

impl WindowBufferProtocol {
    pub fn new(dir: SessionDirectory, timing: ProtocolTiming, token: CancelToken) -> Self {
        Self { dir, timing, token }
    }

    /// One non-blocking read of the advertised window.
    pub fn current(&self) -> Option<BufferWindow> {
        self.dir
            .read_text(files::BUFFER_LIMITS)
            .ok()
            .and_then(|text| BufferWindow::parse(&text))
    }

    /// Block until the advertised window covers `[requested_start_sec, requested_end_sec]`.
    ///
    /// A missing or half-written file is retried after the short interval, an
    /// insufficient window after the long one. Only cancellation or the
    /// configured deadline end the wait early.
    pub fn await_window(
        &self,
        requested_start_sec: f64,
        requested_end_sec: f64,
    ) -> Result<BufferWindow> {
        let waiter = Waiter::new(&self.token, "buffer window", self.timing.window_timeout());
        let mut polls = 0u64;
        loop {
            match self.current() {
                None => waiter.pause(self.timing.retry())?,
                Some(w) if w.covers(requested_start_sec, requested_end_sec) => {
                    if polls > 0 {
                        tracing::debug!(
                            polls,
                            available_start = w.available_start_sec,
                            available_end = w.available_end_sec,
                            "buffer window ready"
                        );
                    }
                    return Ok(w);
                }
                Some(w) => {
                    if polls == 0 {
                        tracing::debug!(
                            requested_start = requested_start_sec,
                            requested_end = requested_end_sec,
                            available_start = w.available_start_sec,
                            available_end = w.available_end_sec,
                            valid = w.is_valid(),
                            "waiting for buffer window"
                        );
                    }
                    waiter.pause(self.timing.window_wait())?
                }
            }
            polls += 1;
        }
    }

    /// Invalidate the advertised window so the next wait blocks until the
    /// server publishes data produced under the new page configuration.
    ///
    /// The sentinel is written, then written again after `reset_settle`. A
    /// server pass that read the previous `page_specs` and publishes its
    /// window late is overwritten by the second write, as long as one pass
    /// takes less than `reset_settle`. With a zero settle time only the first
    /// write happens.
    pub fn reset(&self, seconds_per_page: SecondsPerPage) -> Result<()> {
        let sentinel = BufferWindow::sentinel(seconds_per_page).render();
        self.dir.publish(files::BUFFER_LIMITS, &sentinel)?;
        let settle = self.timing.reset_settle();
        if !settle.is_zero() {
            if self.token.sleep(settle) {
                return Err(crate::error::Error::Cancelled);
            }
            self.dir.publish(files::BUFFER_LIMITS, &sentinel)?;
        }
        tracing::info!(%seconds_per_page, "buffer limits reset");
        Ok(())
    }
}
