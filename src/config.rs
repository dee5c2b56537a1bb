//! Viewer configuration: page server location, display defaults and protocol timing.
//!
//! The configuration is a plain serde struct stored as YAML (by default in
//! `$HOME/.eegpager/config.yaml`). Every field has a default so a partial file,
//! or no file at all, yields a working setup.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Base name of the page server executable (platform suffix appended at runtime).
pub const PAGE_SERVER_NAME: &str = "eeg_page_server";

// ─────────────────────────────────────────────────────────────────────────────
// SecondsPerPage
// ─────────────────────────────────────────────────────────────────────────────

/// Length of the visible window in whole seconds, restricted to a fixed set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct SecondsPerPage(u32);

impl SecondsPerPage {
    /// Every selectable page length, shortest first.
    pub const CHOICES: [u32; 6] = [5, 10, 15, 30, 45, 60];

    /// Returns `None` unless `secs` is one of [`Self::CHOICES`].
    pub fn new(secs: u32) -> Option<Self> {
        Self::CHOICES.contains(&secs).then_some(Self(secs))
    }

    pub fn get(self) -> u32 {
        self.0
    }

    pub fn as_f64(self) -> f64 {
        f64::from(self.0)
    }

    pub fn all() -> impl Iterator<Item = SecondsPerPage> {
        Self::CHOICES.into_iter().map(SecondsPerPage)
    }
}

impl Default for SecondsPerPage {
    fn default() -> Self {
        SecondsPerPage(30)
    }
}

impl TryFrom<u32> for SecondsPerPage {
    type Error = String;

    fn try_from(secs: u32) -> std::result::Result<Self, Self::Error> {
        Self::new(secs).ok_or_else(|| {
            format!(
                "seconds per page must be one of {:?}, got {}",
                Self::CHOICES,
                secs
            )
        })
    }
}

impl From<SecondsPerPage> for u32 {
    fn from(s: SecondsPerPage) -> u32 {
        s.0
    }
}

impl std::fmt::Display for SecondsPerPage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Protocol timing
// ─────────────────────────────────────────────────────────────────────────────

/// Poll intervals and optional deadlines of the file protocol.
///
/// The defaults reproduce the page server's expectations: 100 ms between
/// attempts to open a file that is not there yet, 500 ms between checks of a
/// buffer window that does not cover the request, and a liveness write every
/// second observed on a 500 ms tick. Deadlines default to `None` (wait forever).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProtocolTiming {
    pub retry_ms: u64,
    pub window_wait_ms: u64,
    /// Window after invalidating `buffer_limits` during which a late write
    /// from a server still on the previous `page_specs` is discarded.
    pub reset_settle_ms: u64,
    pub heartbeat_tick_ms: u64,
    /// How long a stopping liveness task may take to acknowledge cancellation.
    pub heartbeat_grace_ms: u64,
    pub negotiation_timeout_secs: Option<u64>,
    pub window_timeout_secs: Option<u64>,
}

impl Default for ProtocolTiming {
    fn default() -> Self {
        Self {
            retry_ms: 100,
            window_wait_ms: 500,
            reset_settle_ms: 200,
            heartbeat_tick_ms: 500,
            heartbeat_grace_ms: 600,
            negotiation_timeout_secs: None,
            window_timeout_secs: None,
        }
    }
}

impl ProtocolTiming {
    pub fn retry(&self) -> Duration {
        Duration::from_millis(self.retry_ms)
    }

    pub fn window_wait(&self) -> Duration {
        Duration::from_millis(self.window_wait_ms)
    }

    pub fn reset_settle(&self) -> Duration {
        Duration::from_millis(self.reset_settle_ms)
    }

    pub fn heartbeat_tick(&self) -> Duration {
        Duration::from_millis(self.heartbeat_tick_ms)
    }

    pub fn heartbeat_grace(&self) -> Duration {
        Duration::from_millis(self.heartbeat_grace_ms)
    }

    pub fn negotiation_timeout(&self) -> Option<Duration> {
        self.negotiation_timeout_secs.map(Duration::from_secs)
    }

    pub fn window_timeout(&self) -> Option<Duration> {
        self.window_timeout_secs.map(Duration::from_secs)
    }

    /// Millisecond-scale timing for tests driving an in-process fake server.
    pub fn fast() -> Self {
        Self {
            retry_ms: 5,
            window_wait_ms: 10,
            reset_settle_ms: 0,
            heartbeat_tick_ms: 10,
            heartbeat_grace_ms: 50,
            negotiation_timeout_secs: Some(5),
            window_timeout_secs: Some(5),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// ViewerConfig
// ─────────────────────────────────────────────────────────────────────────────

/// Top-level configuration.
///
/// | Field              | Purpose |
/// |--------------------|---------|
/// | `server_path`      | Page server executable (default: next to this binary) |
/// | `seconds_per_page` | Initial page length |
/// | `negative_up`      | Plot polarity |
/// | `multicolor`       | One palette colour per channel instead of a single colour |
/// | `hide_annotations` | Suppress event overlays |
/// | `dpi`              | Screen density used for the µV/cm readout |
/// | `channel_exclude`  | Channel directory name fragments to skip |
/// | `temp_root`        | Parent of session directories (default: OS temp dir) |
/// | `timing`           | Poll intervals and deadlines |
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    pub server_path: Option<PathBuf>,
    pub seconds_per_page: SecondsPerPage,
    pub negative_up: bool,
    pub multicolor: bool,
    pub hide_annotations: bool,
    pub dpi: f64,
    pub channel_exclude: Vec<String>,
    pub temp_root: Option<PathBuf>,
    pub timing: ProtocolTiming,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            server_path: None,
            seconds_per_page: SecondsPerPage::default(),
            negative_up: true,
            multicolor: false,
            hide_annotations: false,
            dpi: 100.0,
            channel_exclude: vec!["accel".to_string()],
            temp_root: None,
            timing: ProtocolTiming::default(),
        }
    }
}

impl ViewerConfig {
    /// `$HOME/.eegpager/config.yaml`
    pub fn default_path() -> Result<PathBuf> {
        let home = std::env::var("HOME")
            .map_err(|e| Error::Config(format!("HOME env var not set: {}", e)))?;
        Ok(PathBuf::from(home).join(".eegpager").join("config.yaml"))
    }

    pub fn load_from_path(path: &Path) -> Result<ViewerConfig> {
        let s = fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        serde_yaml::from_str(&s)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))
    }

    /// Load `path` if it exists, otherwise fall back to defaults.
    pub fn load_or_default(path: &Path) -> Result<ViewerConfig> {
        if path.exists() {
            Self::load_from_path(path)
        } else {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            Ok(ViewerConfig::default())
        }
    }

    pub fn save_to_path(&self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir).map_err(|e| Error::io(dir, e))?;
        }
        let s = serde_yaml::to_string(self)
            .map_err(|e| Error::Config(format!("serialization error: {}", e)))?;
        fs::write(path, s).map_err(|e| Error::io(path, e))
    }

    /// Page server executable: the configured path, or `eeg_page_server`
    /// (plus the platform executable suffix) beside the running binary.
    pub fn resolve_server_path(&self) -> Result<PathBuf> {
        if let Some(p) = &self.server_path {
            return Ok(p.clone());
        }
        let exe = std::env::current_exe().map_err(|e| Error::io("current executable", e))?;
        let dir = exe.parent().unwrap_or_else(|| Path::new("."));
        Ok(dir.join(format!("{}{}", PAGE_SERVER_NAME, std::env::consts::EXE_SUFFIX)))
    }

    pub fn temp_root(&self) -> PathBuf {
        self.temp_root.clone().unwrap_or_else(std::env::temp_dir)
    }
}
