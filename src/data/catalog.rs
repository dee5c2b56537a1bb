//! Channel metadata reported by the page server and the session bounds derived from it.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::session::directory::files;

/// One signal stream of the recording.
#[derive(Debug, Clone, PartialEq)]
pub struct Channel {
    /// Channel path exactly as reported by the server.
    pub path: String,
    /// Display label: last path segment without extension.
    pub name: String,
    pub start_usec: i64,
    pub end_usec: i64,
    /// Position in the decoded stream (the server's acquisition channel number).
    pub channel_index: i64,
    /// Parsed but not applied to plotted values.
    pub units_conversion_factor: f64,
}

impl Channel {
    pub fn new(
        path: impl Into<String>,
        start_usec: i64,
        end_usec: i64,
        channel_index: i64,
        units_conversion_factor: f64,
    ) -> Result<Self> {
        let path = path.into();
        if path.is_empty() {
            return Err(Error::malformed(files::SERVER_INFO, "empty channel name"));
        }
        if end_usec < start_usec {
            return Err(Error::malformed(
                files::SERVER_INFO,
                format!("channel {} ends ({}) before it starts ({})", path, end_usec, start_usec),
            ));
        }
        Ok(Self {
            name: channel_label(&path),
            path,
            start_usec,
            end_usec,
            channel_index,
            units_conversion_factor,
        })
    }

    /// Parse `name start_usec end_usec channel_index units_conversion_factor`.
    pub fn from_info_line(line: &str) -> Result<Self> {
        let bad = |what: &str| Error::malformed(files::SERVER_INFO, format!("{} in line {:?}", what, line));
        let mut tokens = line.split_whitespace();
        let path = tokens.next().ok_or_else(|| bad("missing channel name"))?;
        let start: i64 = tokens
            .next()
            .and_then(|t| t.parse().ok())
            .ok_or_else(|| bad("bad start time"))?;
        let end: i64 = tokens
            .next()
            .and_then(|t| t.parse().ok())
            .ok_or_else(|| bad("bad end time"))?;
        let index: i64 = tokens
            .next()
            .and_then(|t| t.parse().ok())
            .ok_or_else(|| bad("bad channel index"))?;
        let ucf: f64 = tokens
            .next()
            .and_then(|t| t.parse().ok())
            .ok_or_else(|| bad("bad units conversion factor"))?;
        Channel::new(path, start, end, index, ucf)
    }

    pub fn start_time(&self) -> f64 {
        usec_to_sec(self.start_usec)
    }

    pub fn end_time(&self) -> f64 {
        usec_to_sec(self.end_usec)
    }
}

pub(crate) fn usec_to_sec(usec: i64) -> f64 {
    usec as f64 / 1_000_000.0
}

/// `"/data/sub1/LA1.timd"` → `"LA1"`.
pub fn channel_label(path: &str) -> String {
    let last = path.rsplit(['/', '\\']).next().unwrap_or(path);
    last.split('.').next().unwrap_or(last).to_string()
}

/// Channels of a negotiated session, in stream order, plus the session bounds.
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelCatalog {
    channels: Vec<Channel>,
    start_time: f64,
    end_time: f64,
}

impl ChannelCatalog {
    /// Build from parsed channels.
    ///
    /// The session starts at the earliest channel start and ends at the
    /// *earliest* channel end, so no channel is ever read past its recorded end.
    pub fn new(channels: Vec<Channel>) -> Result<Self> {
        if channels.is_empty() {
            return Err(Error::NoChannels);
        }
        let start_time = channels
            .iter()
            .map(Channel::start_time)
            .fold(f64::INFINITY, f64::min);
        let end_time = channels
            .iter()
            .map(Channel::end_time)
            .fold(f64::INFINITY, f64::min);
        Ok(Self {
            channels,
            start_time,
            end_time,
        })
    }

    /// Parse `server_info` for `expected` channels.
    ///
    /// Returns `Ok(None)` while the file holds fewer than `expected + 2` lines
    /// (count header, one line per channel, trailer): the server is still
    /// writing and the caller should poll again.
    pub fn from_server_info(text: &str, expected: usize) -> Result<Option<Self>> {
        let lines: Vec<&str> = text.lines().collect();
        if lines.len() < expected + 2 {
            return Ok(None);
        }
        let channels = lines[1..=expected]
            .iter()
            .map(|line| Channel::from_info_line(line))
            .collect::<Result<Vec<_>>>()?;
        Self::new(channels).map(Some)
    }

    pub fn channels(&self) -> &[Channel] {
        &self.channels
    }

    pub fn len(&self) -> usize {
        self.channels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    pub fn labels(&self) -> Vec<String> {
        self.channels.iter().map(|c| c.name.clone()).collect()
    }

    pub fn start_time(&self) -> f64 {
        self.start_time
    }

    pub fn end_time(&self) -> f64 {
        self.end_time
    }
}

/// List channel directories of a recording: the immediate sub-directories of
/// `data_dir` whose names contain none of `exclude`, sorted by name.
pub fn discover_channel_paths(data_dir: &Path, exclude: &[String]) -> Result<Vec<PathBuf>> {
    let entries = fs::read_dir(data_dir).map_err(|e| Error::io(data_dir, e))?;
    let mut paths = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| Error::io(data_dir, e))?;
        let is_dir = entry.file_type().map(|t| t.is_dir()).unwrap_or(false);
        if !is_dir {
            continue;
        }
        let name = entry.file_name().to_string_lossy().into_owned();
        if exclude.iter().any(|ex| !ex.is_empty() && name.contains(ex.as_str())) {
            tracing::debug!(channel = %name, "skipping excluded channel");
            continue;
        }
        paths.push(entry.path());
    }
    paths.sort();
    if paths.is_empty() {
        return Err(Error::NoChannels);
    }
    Ok(paths)
}
