//! Client-to-server display configuration: `page_specs` and `current_sec`.

use std::path::PathBuf;

use crate::config::SecondsPerPage;
use crate::error::Result;
use crate::session::directory::{files, SessionDirectory};

/// Placeholder the server expects in the password and events-file slots.
const BLANK: &str = "blank";

/// What the page server should decode: which channels, how many pixel columns,
/// over how many seconds.
#[derive(Debug, Clone, PartialEq)]
pub struct PageSpec {
    pub data_dir: PathBuf,
    pub channel_paths: Vec<PathBuf>,
    pub pixel_width: u32,
    pub seconds_per_page: SecondsPerPage,
}

impl PageSpec {
    /// Serialize with the given nonce. The server re-reads the whole file only
    /// when the nonce on the first line differs from the last one it saw.
    pub fn render(&self, nonce: f64) -> String {
        let mut out = String::new();
        out.push_str(&format!("{}\n", nonce));
        out.push_str(&format!("{}\n", self.data_dir.display()));
        out.push_str(&format!("{}\n", self.channel_paths.len()));
        for p in &self.channel_paths {
            out.push_str(&format!("{}\n", p.display()));
        }
        out.push_str(&format!("{}\n", self.pixel_width));
        out.push_str(&format!("{}\n", self.seconds_per_page));
        out.push_str(BLANK);
        out.push('\n');
        out.push_str(BLANK);
        out.push('\n');
        out
    }
}

/// Fresh nonce in (0, 1), never equal to the server's initial zero.
pub fn new_nonce() -> f64 {
    let bits = uuid::Uuid::new_v4().as_u128() >> 75;
    (bits as f64 + 1.0) / ((1u64 << 53) as f64 + 1.0)
}

/// Owner of the `page_specs` file for one session.
pub struct PageSpecChannel {
    dir: SessionDirectory,
    spec: PageSpec,
    nonce: f64,
}

impl PageSpecChannel {
    pub fn new(dir: SessionDirectory, spec: PageSpec) -> Self {
        Self {
            dir,
            spec,
            nonce: 0.0,
        }
    }

    pub fn spec(&self) -> &PageSpec {
        &self.spec
    }

    pub fn nonce(&self) -> f64 {
        self.nonce
    }

    /// Write the current spec under a new nonce.
    pub fn publish(&mut self) -> Result<()> {
        let mut nonce = new_nonce();
        while nonce == self.nonce {
            nonce = new_nonce();
        }
        self.dir.publish(files::PAGE_SPECS, &self.spec.render(nonce))?;
        self.nonce = nonce;
        tracing::debug!(
            pixel_width = self.spec.pixel_width,
            seconds_per_page = %self.spec.seconds_per_page,
            nonce,
            "page specs published"
        );
        Ok(())
    }

    /// Returns `true` (and republishes) only if the width actually changed.
    pub fn set_pixel_width(&mut self, pixel_width: u32) -> Result<bool> {
        if self.spec.pixel_width == pixel_width {
            return Ok(false);
        }
        self.spec.pixel_width = pixel_width;
        self.publish()?;
        Ok(true)
    }

    /// Returns `true` (and republishes) only if the page length actually changed.
    pub fn set_seconds_per_page(&mut self, seconds_per_page: SecondsPerPage) -> Result<bool> {
        if self.spec.seconds_per_page == seconds_per_page {
            return Ok(false);
        }
        self.spec.seconds_per_page = seconds_per_page;
        self.publish()?;
        Ok(true)
    }
}

/// Publish the integer cursor. A negative value is the server's exit request.
pub fn write_current_sec(dir: &SessionDirectory, curr_sec: i64) -> Result<()> {
    dir.publish(files::CURRENT_SEC, &format!("{}\n", curr_sec))
}
