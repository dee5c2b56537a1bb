//! Session lifecycle: the shared directory, the liveness signal and the page
//! server process bound to one loaded recording.

pub mod cancel;
pub mod directory;
pub mod heartbeat;
pub mod negotiator;

use std::path::{Path, PathBuf};
use std::process::Child;
use std::thread;
use std::time::{Duration, Instant};

use crate::config::SecondsPerPage;
use crate::data::page_specs::{write_current_sec, PageSpecChannel};
use crate::error::Result;

pub use cancel::{CancelToken, Waiter};
pub use directory::{files, SessionDirectory};
pub use heartbeat::LivenessSignal;
pub use negotiator::{
    Attempt, PageServerLauncher, PasswordPrompt, ProcessLauncher, SessionNegotiator,
    SessionRequest,
};

/// Cursor value that asks the page server to exit.
pub const SERVER_EXIT_CURSOR: i64 = -1;

/// How long a closing session waits for the server process to exit before
/// killing it.
pub const SERVER_EXIT_GRACE: Duration = Duration::from_secs(2);

const EXIT_POLL: Duration = Duration::from_millis(20);

/// One negotiated viewing session.
///
/// Owns the session directory handle, the liveness signal, the page server
/// child (when launched as a process) and the page spec file. Closing the
/// session asks the server to exit, stops the liveness signal and reaps the
/// child; the directory itself is left for the OS to clean up.
pub struct Session {
    dir: SessionDirectory,
    heartbeat: LivenessSignal,
    server: Option<Child>,
    specs: PageSpecChannel,
    data_dir: PathBuf,
    password: Option<String>,
    start_time: f64,
    end_time: f64,
    closed: bool,
}

impl Session {
    pub(crate) fn new(
        dir: SessionDirectory,
        heartbeat: LivenessSignal,
        server: Option<Child>,
        specs: PageSpecChannel,
        data_dir: PathBuf,
        password: Option<String>,
    ) -> Self {
        Self {
            dir,
            heartbeat,
            server,
            specs,
            data_dir,
            password,
            start_time: 0.0,
            end_time: 0.0,
            closed: false,
        }
    }

    pub(crate) fn set_bounds(&mut self, start_time: f64, end_time: f64) {
        self.start_time = start_time;
        self.end_time = end_time;
    }

    pub fn directory(&self) -> &SessionDirectory {
        &self.dir
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn password(&self) -> Option<&str> {
        self.password.as_deref()
    }

    pub fn start_time(&self) -> f64 {
        self.start_time
    }

    pub fn end_time(&self) -> f64 {
        self.end_time
    }

    pub fn seconds_per_page(&self) -> SecondsPerPage {
        self.specs.spec().seconds_per_page
    }

    pub fn pixel_width(&self) -> u32 {
        self.specs.spec().pixel_width
    }

    pub fn channel_paths(&self) -> &[PathBuf] {
        &self.specs.spec().channel_paths
    }

    /// Rewrites `page_specs` when the width changed; returns whether it did.
    pub fn set_pixel_width(&mut self, pixel_width: u32) -> Result<bool> {
        self.specs.set_pixel_width(pixel_width.max(1))
    }

    /// Rewrites `page_specs` when the page length changed; returns whether it did.
    pub fn set_seconds_per_page(&mut self, seconds_per_page: SecondsPerPage) -> Result<bool> {
        self.specs.set_seconds_per_page(seconds_per_page)
    }

    pub fn write_cursor(&self, curr_sec: i64) -> Result<()> {
        write_current_sec(&self.dir, curr_sec)
    }

    pub fn heartbeat_running(&self) -> bool {
        self.heartbeat.is_running()
    }

    /// Process id of the launched page server, if it is a child process.
    pub fn server_pid(&self) -> Option<u32> {
        self.server.as_ref().map(Child::id)
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Ask the server to exit, stop the liveness signal and reap the server
    /// process. Idempotent.
    pub fn close(&mut self) -> Result<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        let result = self.write_cursor(SERVER_EXIT_CURSOR);
        self.heartbeat.stop();
        if let Some(child) = self.server.take() {
            reap(child, SERVER_EXIT_GRACE);
        }
        tracing::info!(dir = %self.dir.path().display(), "session closed");
        result
    }
}

/// Wait up to `grace` for `child` to exit, then kill it. Always waits on the
/// child so it does not linger as a zombie.
fn reap(mut child: Child, grace: Duration) {
    let pid = child.id();
    let deadline = Instant::now() + grace;
    loop {
        match child.try_wait() {
            Ok(Some(status)) => {
                tracing::debug!(pid, %status, "page server exited");
                return;
            }
            Ok(None) if Instant::now() < deadline => thread::sleep(EXIT_POLL),
            Ok(None) => break,
            Err(e) => {
                tracing::warn!(pid, error = %e, "could not poll page server");
                break;
            }
        }
    }
    tracing::warn!(pid, "page server ignored the exit request, killing it");
    if let Err(e) = child.kill() {
        tracing::debug!(pid, error = %e, "kill failed");
    }
    if let Err(e) = child.wait() {
        tracing::warn!(pid, error = %e, "could not reap page server");
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            tracing::warn!(error = %e, "failed to signal page server exit");
        }
    }
}
