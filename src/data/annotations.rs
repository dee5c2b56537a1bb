//! Time-indexed annotations: decoder-provided `events` and user `events.csv`.

use std::fs;
use std::path::Path;

use crate::data::catalog::usec_to_sec;
use crate::error::{Error, Result};
use crate::session::directory::{files, SessionDirectory};

/// File name of the user-supplied annotation fallback inside the data directory.
pub const USER_EVENTS_FILE: &str = "events.csv";

/// A single annotation.
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    pub start_sec: f64,
    pub text: String,
}

impl Event {
    pub fn new(start_usec: i64, text: impl Into<String>) -> Self {
        Self {
            start_sec: usec_to_sec(start_usec),
            text: text.into(),
        }
    }

    /// `start_time_usec,text` (the text may itself contain commas).
    pub fn from_csv_line(line: &str) -> Result<Self> {
        let (time, text) = line
            .split_once(',')
            .ok_or_else(|| Error::malformed(USER_EVENTS_FILE, format!("no text in {:?}", line)))?;
        Ok(Self::new(parse_usec(USER_EVENTS_FILE, time)?, text))
    }

    /// `start_time_usec,kind,rest`.
    ///
    /// `Note` records carry their text in `rest`; `Epoch` records pack
    /// `duration_usec,type,text` into it and are shown as
    /// `"type: text (N sec)"`. Other kinds yield `Ok(None)`.
    pub fn from_server_line(line: &str) -> Result<Option<Self>> {
        let bad = |why: &str| Error::malformed(files::EVENTS, format!("{} in {:?}", why, line));
        let mut parts = line.splitn(3, ',');
        let time = parts.next().ok_or_else(|| bad("missing time"))?;
        let kind = parts.next().ok_or_else(|| bad("missing kind"))?;
        let rest = parts.next().ok_or_else(|| bad("missing body"))?;
        let start_usec = parse_usec(files::EVENTS, time)?;
        match kind {
            "Note" => Ok(Some(Self::new(start_usec, rest))),
            "Epoch" => {
                let mut fields = rest.splitn(3, ',');
                let duration = fields.next().ok_or_else(|| bad("missing epoch duration"))?;
                let epoch_type = fields.next().ok_or_else(|| bad("missing epoch type"))?;
                let text = fields.next().ok_or_else(|| bad("missing epoch text"))?;
                let duration_sec = parse_usec(files::EVENTS, duration)? / 1_000_000;
                Ok(Some(Self::new(
                    start_usec,
                    format!("{}: {} ({} sec)", epoch_type, text, duration_sec),
                )))
            }
            other => {
                tracing::debug!(kind = other, "ignoring unknown event kind");
                Ok(None)
            }
        }
    }
}

fn parse_usec(file: &str, s: &str) -> Result<i64> {
    s.trim()
        .parse::<i64>()
        .map_err(|e| Error::malformed(file, format!("bad timestamp {:?}: {}", s, e)))
}

/// Strict open interval: an event exactly on either page edge is not shown.
pub fn is_visible(start_sec: f64, curr_sec: f64, seconds_per_page: f64) -> bool {
    curr_sec < start_sec && start_sec < curr_sec + seconds_per_page
}

/// Where the current annotations came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnnotationSource {
    Server,
    UserCsv,
}

/// Annotations of the session, or nothing if no source could be parsed.
#[derive(Debug, Clone, Default)]
pub struct AnnotationStore {
    events: Option<Vec<Event>>,
    source: Option<AnnotationSource>,
}

impl AnnotationStore {
    pub fn parse_server_events(text: &str) -> Result<Vec<Event>> {
        let mut out = Vec::new();
        for line in text.lines().map(str::trim_end).filter(|l| !l.is_empty()) {
            if let Some(ev) = Event::from_server_line(line)? {
                out.push(ev);
            }
        }
        Ok(out)
    }

    pub fn parse_csv(text: &str) -> Result<Vec<Event>> {
        text.lines()
            .map(str::trim_end)
            .filter(|l| !l.is_empty())
            .map(Event::from_csv_line)
            .collect()
    }

    /// Load the server's `events` file. Missing or malformed → empty store.
    pub fn load_server(dir: &SessionDirectory) -> Self {
        let parsed = dir
            .read_text(files::EVENTS)
            .map_err(|e| Error::io(dir.file(files::EVENTS), e))
            .and_then(|text| Self::parse_server_events(&text));
        Self::from_parsed(parsed, AnnotationSource::Server)
    }

    /// Load a user CSV. Missing or malformed → empty store.
    pub fn load_csv(path: &Path) -> Self {
        let parsed = fs::read_to_string(path)
            .map_err(|e| Error::io(path, e))
            .and_then(|text| Self::parse_csv(&text));
        Self::from_parsed(parsed, AnnotationSource::UserCsv)
    }

    /// Server events first, `<data_dir>/events.csv` if those are unavailable.
    pub fn load(dir: &SessionDirectory, data_dir: &Path) -> Self {
        let store = Self::load_server(dir);
        if store.is_available() {
            return store;
        }
        Self::load_csv(&data_dir.join(USER_EVENTS_FILE))
    }

    fn from_parsed(parsed: Result<Vec<Event>>, source: AnnotationSource) -> Self {
        match parsed {
            Ok(events) => {
                tracing::info!(count = events.len(), ?source, "annotations loaded");
                Self {
                    events: Some(events),
                    source: Some(source),
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, ?source, "annotations unavailable");
                Self::default()
            }
        }
    }

    pub fn is_available(&self) -> bool {
        self.events.is_some()
    }

    pub fn source(&self) -> Option<&AnnotationSource> {
        self.source.as_ref()
    }

    pub fn events(&self) -> &[Event] {
        self.events.as_deref().unwrap_or(&[])
    }

    pub fn visible(&self, curr_sec: f64, seconds_per_page: f64) -> impl Iterator<Item = &Event> {
        self.events()
            .iter()
            .filter(move |e| is_visible(e.start_sec, curr_sec, seconds_per_page))
    }
}
