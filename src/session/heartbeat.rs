//! Liveness signal: a background thread that keeps `heartbeat_ui` fresh so the
//! page server can tell the viewer is still running.

use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::thread::JoinHandle;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use crate::error::{Error, Result};
use crate::session::cancel::CancelToken;
use crate::session::directory::{files, SessionDirectory};

/// Periodic writer of the client liveness timestamp.
///
/// The thread wakes every `tick` to check its cancellation token and writes the
/// timestamp on every other wake, so cancellation is observed within one tick
/// while the file is refreshed every two. Each signal owns its own token;
/// [`LivenessSignal::stop`] waits (up to the grace period) for the thread to
/// acknowledge before returning.
pub struct LivenessSignal {
    token: CancelToken,
    done_rx: Receiver<()>,
    handle: Option<JoinHandle<()>>,
    grace: Duration,
}

impl LivenessSignal {
    pub fn start(dir: &SessionDirectory, tick: Duration, grace: Duration) -> Result<Self> {
        let token = CancelToken::new();
        let (done_tx, done_rx) = mpsc::channel();
        let dir = dir.clone();
        let thread_token = token.clone();
        let handle = std::thread::Builder::new()
            .name("heartbeat_ui".to_string())
            .spawn(move || {
                let mut cycle = true;
                while !thread_token.sleep(tick) {
                    cycle = !cycle;
                    if cycle {
                        if let Err(e) = dir.publish(files::HEARTBEAT_UI, &format_timestamp(now_secs())) {
                            tracing::warn!(error = %e, "failed to write heartbeat");
                        }
                    }
                }
                let _ = done_tx.send(());
            })
            .map_err(|e| Error::io("heartbeat thread", e))?;
        tracing::debug!(?tick, "liveness signal started");
        Ok(Self {
            token,
            done_rx,
            handle: Some(handle),
            grace,
        })
    }

    pub fn is_running(&self) -> bool {
        self.handle.is_some()
    }

    /// Cancel and wait for the thread to acknowledge. Idempotent.
    ///
    /// Returns `false` if the thread did not acknowledge within the grace
    /// period; it is then detached and will exit on its next wake.
    pub fn stop(&mut self) -> bool {
        self.token.cancel();
        let Some(handle) = self.handle.take() else {
            return true;
        };
        match self.done_rx.recv_timeout(self.grace) {
            Ok(()) | Err(RecvTimeoutError::Disconnected) => {
                let _ = handle.join();
                tracing::debug!("liveness signal stopped");
                true
            }
            Err(RecvTimeoutError::Timeout) => {
                tracing::warn!(grace = ?self.grace, "liveness signal did not stop in time");
                false
            }
        }
    }
}

impl Drop for LivenessSignal {
    fn drop(&mut self) {
        self.stop();
    }
}

pub(crate) fn now_secs() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or(0.0)
}

fn format_timestamp(secs: f64) -> String {
    format!("{:.6}\n", secs)
}
