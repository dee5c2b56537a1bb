//! Cancellation token and the deadline-aware sleep used by every polling loop.

use std::sync::{Arc, Condvar, Mutex};
use std::time::{Duration, Instant};

use crate::error::{Error, Result};

/// Shared cancellation flag that also wakes sleepers immediately.
///
/// Cloning yields another handle to the same flag. A token is never reset:
/// once cancelled, create a new one.
#[derive(Clone, Default)]
pub struct CancelToken {
    inner: Arc<(Mutex<bool>, Condvar)>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        let (lock, cvar) = &*self.inner;
        let mut cancelled = lock.lock().unwrap_or_else(|p| p.into_inner());
        *cancelled = true;
        cvar.notify_all();
    }

    pub fn is_cancelled(&self) -> bool {
        let (lock, _) = &*self.inner;
        *lock.lock().unwrap_or_else(|p| p.into_inner())
    }

    /// Sleep for up to `dur`. Returns `true` if the token was (or became) cancelled.
    pub fn sleep(&self, dur: Duration) -> bool {
        let (lock, cvar) = &*self.inner;
        let guard = lock.lock().unwrap_or_else(|p| p.into_inner());
        let (guard, _) = cvar
            .wait_timeout_while(guard, dur, |cancelled| !*cancelled)
            .unwrap_or_else(|p| p.into_inner());
        *guard
    }
}

impl std::fmt::Debug for CancelToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CancelToken")
            .field("cancelled", &self.is_cancelled())
            .finish()
    }
}

/// One bounded wait: a cancellation token plus an optional deadline.
///
/// Polling loops call [`Waiter::pause`] between attempts; it fails with
/// [`Error::Cancelled`] or [`Error::TimedOut`] instead of sleeping forever.
pub struct Waiter<'a> {
    token: &'a CancelToken,
    what: &'static str,
    timeout: Option<Duration>,
    deadline: Option<Instant>,
}

impl<'a> Waiter<'a> {
    pub fn new(token: &'a CancelToken, what: &'static str, timeout: Option<Duration>) -> Self {
        Self {
            token,
            what,
            timeout,
            deadline: timeout.map(|t| Instant::now() + t),
        }
    }

    pub fn pause(&self, dur: Duration) -> Result<()> {
        let dur = match self.deadline {
            Some(deadline) => {
                let now = Instant::now();
                if now >= deadline {
                    return Err(self.timed_out());
                }
                dur.min(deadline - now)
            }
            None => dur,
        };
        if self.token.sleep(dur) {
            return Err(Error::Cancelled);
        }
        Ok(())
    }

    fn timed_out(&self) -> Error {
        Error::TimedOut {
            what: self.what,
            after: self.timeout.unwrap_or_default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cancel_wakes_sleeper_early() {
        let token = CancelToken::new();
        let t2 = token.clone();
        let h = std::thread::spawn(move || {
            let start = Instant::now();
            let cancelled = t2.sleep(Duration::from_secs(10));
            (cancelled, start.elapsed())
        });
        std::thread::sleep(Duration::from_millis(20));
        token.cancel();
        let (cancelled, elapsed) = h.join().unwrap();
        assert!(cancelled);
        assert!(elapsed < Duration::from_secs(5));
    }

    #[test]
    fn waiter_times_out() {
        let token = CancelToken::new();
        let waiter = Waiter::new(&token, "nothing", Some(Duration::from_millis(30)));
        let mut result = Ok(());
        for _ in 0..100 {
            result = waiter.pause(Duration::from_millis(10));
            if result.is_err() {
                break;
            }
        }
        assert!(matches!(result, Err(Error::TimedOut { what: "nothing", .. })));
    }

    #[test]
    fn waiter_reports_cancellation() {
        let token = CancelToken::new();
        token.cancel();
        let waiter = Waiter::new(&token, "nothing", None);
        assert!(matches!(
            waiter.pause(Duration::from_millis(1)),
            Err(Error::Cancelled)
        ));
    }
}
