//! The per-session shared directory and the names of the files exchanged through it.

use std::ffi::OsString;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use crate::error::{Error, Result};

/// File names inside a session directory.
///
/// Direction is noted per file; each file has exactly one writer.
pub mod files {
    /// client → server: display configuration.
    pub const PAGE_SPECS: &str = "page_specs";
    /// client → server: integer cursor; a negative value asks the server to exit.
    pub const CURRENT_SEC: &str = "current_sec";
    /// client → server: wall-clock liveness timestamp.
    pub const HEARTBEAT_UI: &str = "heartbeat_ui";
    /// server → client: channel metadata.
    pub const SERVER_INFO: &str = "server_info";
    /// server → client: presence-only marker.
    pub const PASSWORD_NEEDED: &str = "password_needed";
    /// server → client (client writes only the invalidation sentinel).
    pub const BUFFER_LIMITS: &str = "buffer_limits";
    /// server → client: interleaved little-endian f32 samples.
    pub const PAGE_DATA: &str = "page_data";
    /// server → client: decoded annotation records.
    pub const EVENTS: &str = "events";
    /// server → client: recording gaps.
    pub const DISCON: &str = "discon";
}

static PUBLISH_SEQ: AtomicU64 = AtomicU64::new(0);

/// Prefix of every session directory name.
pub const SESSION_DIR_PREFIX: &str = "eeg_view_";

/// A uniquely named directory shared with one page server process.
///
/// The directory is never removed by the client: the page server may still be
/// writing into it after the viewer moved on, and the OS temp cleaner owns it.
#[derive(Debug, Clone)]
pub struct SessionDirectory {
    path: PathBuf,
}

impl SessionDirectory {
    /// Create `<root>/eeg_view_<uuid>`.
    pub fn create_in(root: &Path) -> Result<Self> {
        let path = root.join(format!("{}{}", SESSION_DIR_PREFIX, uuid::Uuid::new_v4()));
        fs::create_dir(&path).map_err(|e| Error::io(&path, e))?;
        tracing::info!(dir = %path.display(), "session directory created");
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn file(&self, name: &str) -> PathBuf {
        self.path.join(name)
    }

    /// Directory argument handed to the page server.
    ///
    /// The server builds some of its file paths by plain concatenation, so the
    /// argument always ends with a path separator.
    pub fn server_arg(&self) -> OsString {
        let mut arg = self.path.clone().into_os_string();
        arg.push(std::path::MAIN_SEPARATOR_STR);
        arg
    }

    /// Replace `name` in one step: write a sibling temp file, then rename over.
    ///
    /// A reader polling `name` sees either the old or the new content, never a
    /// partial write. Every call stages under its own name, so concurrent
    /// writers of the same file do not steal each other's temp file.
    pub fn publish(&self, name: &str, contents: &str) -> Result<()> {
        let target = self.file(name);
        let seq = PUBLISH_SEQ.fetch_add(1, Ordering::Relaxed);
        let staging = self.file(&format!(".{}.{}.{}.tmp", name, std::process::id(), seq));
        fs::write(&staging, contents).map_err(|e| Error::io(&staging, e))?;
        fs::rename(&staging, &target).map_err(|e| Error::io(&target, e))
    }

    /// Read a text file written by the server. `NotFound` is the normal
    /// "not yet" answer and is returned as-is for the caller to poll on.
    pub fn read_text(&self, name: &str) -> io::Result<String> {
        fs::read_to_string(self.file(name))
    }

    pub fn exists(&self, name: &str) -> bool {
        self.file(name).exists()
    }
}
