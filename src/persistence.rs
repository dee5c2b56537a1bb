//! View state persistence: save and load display preferences to/from JSON files.
//!
//! Only user-facing toggles are stored; the cursor and the vertical scale
//! belong to a single session and start fresh on every load.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::config::{SecondsPerPage, ViewerConfig};
use crate::error::{Error, Result};

/// Display preferences carried from one run to the next.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewStateSerde {
    pub seconds_per_page: SecondsPerPage,
    pub negative_up: bool,
    pub multicolor: bool,
    pub hide_annotations: bool,
}

impl Default for ViewStateSerde {
    fn default() -> Self {
        Self::from(&ViewerConfig::default())
    }
}

impl From<&ViewerConfig> for ViewStateSerde {
    fn from(c: &ViewerConfig) -> Self {
        Self {
            seconds_per_page: c.seconds_per_page,
            negative_up: c.negative_up,
            multicolor: c.multicolor,
            hide_annotations: c.hide_annotations,
        }
    }
}

impl ViewStateSerde {
    /// Apply stored preferences on top of a loaded configuration.
    pub fn apply_to(&self, c: &mut ViewerConfig) {
        c.seconds_per_page = self.seconds_per_page;
        c.negative_up = self.negative_up;
        c.multicolor = self.multicolor;
        c.hide_annotations = self.hide_annotations;
    }

    /// `view_state.json` next to the configuration file.
    pub fn default_path(config_path: &Path) -> PathBuf {
        config_path
            .parent()
            .unwrap_or_else(|| Path::new("."))
            .join("view_state.json")
    }
}

// ---------- Public API ----------

/// Serialize the view state as pretty JSON.
pub fn state_to_json(state: &ViewStateSerde) -> Result<String> {
    serde_json::to_string_pretty(state).map_err(|e| Error::Persistence(e.to_string()))
}

/// Deserialize view state from JSON.
pub fn state_from_json(json: &str) -> Result<ViewStateSerde> {
    serde_json::from_str(json).map_err(|e| Error::Persistence(e.to_string()))
}

/// Save the view state to a JSON file at the given path.
pub fn save_state_to_path(state: &ViewStateSerde, path: &Path) -> Result<()> {
    let txt = state_to_json(state)?;
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir).map_err(|e| Error::io(dir, e))?;
    }
    std::fs::write(path, txt).map_err(|e| Error::io(path, e))
}

/// Load the view state from a JSON file at the given path.
pub fn load_state_from_path(path: &Path) -> Result<ViewStateSerde> {
    let txt = std::fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
    state_from_json(&txt)
}
