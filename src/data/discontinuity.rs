//! Known gaps in the recording, reported by the page server in `discon`.

use crate::data::catalog::usec_to_sec;
use crate::error::{Error, Result};
use crate::session::directory::{files, SessionDirectory};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Discontinuity {
    pub start_sec: f64,
    pub end_sec: f64,
}

impl Discontinuity {
    pub fn new(start_usec: i64, end_usec: i64) -> Result<Self> {
        if end_usec < start_usec {
            return Err(Error::malformed(
                files::DISCON,
                format!("gap ends ({}) before it starts ({})", end_usec, start_usec),
            ));
        }
        Ok(Self {
            start_sec: usec_to_sec(start_usec),
            end_sec: usec_to_sec(end_usec),
        })
    }

    /// `start_time_usec,end_time_usec`
    pub fn from_line(line: &str) -> Result<Self> {
        let bad = || Error::malformed(files::DISCON, format!("bad line {:?}", line));
        let (a, b) = line.split_once(',').ok_or_else(bad)?;
        let start = a.trim().parse::<i64>().map_err(|_| bad())?;
        let end = b.trim().parse::<i64>().map_err(|_| bad())?;
        Self::new(start, end)
    }

    pub fn duration(&self) -> f64 {
        self.end_sec - self.start_sec
    }

    /// Whether any part of the gap lies inside the page.
    pub fn overlaps(&self, curr_sec: f64, seconds_per_page: f64) -> bool {
        self.start_sec < curr_sec + seconds_per_page && self.end_sec > curr_sec
    }
}

/// Gaps of the session; empty if `discon` is missing or malformed.
#[derive(Debug, Clone, Default)]
pub struct DiscontinuityStore {
    records: Option<Vec<Discontinuity>>,
}

impl DiscontinuityStore {
    pub fn parse(text: &str) -> Result<Vec<Discontinuity>> {
        text.lines()
            .map(str::trim_end)
            .filter(|l| !l.is_empty())
            .map(Discontinuity::from_line)
            .collect()
    }

    pub fn load(dir: &SessionDirectory) -> Self {
        let parsed = dir
            .read_text(files::DISCON)
            .map_err(|e| Error::io(dir.file(files::DISCON), e))
            .and_then(|text| Self::parse(&text));
        match parsed {
            Ok(records) => {
                tracing::info!(count = records.len(), "discontinuities loaded");
                Self {
                    records: Some(records),
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "discontinuities unavailable");
                Self::default()
            }
        }
    }

    pub fn from_records(records: Vec<Discontinuity>) -> Self {
        Self {
            records: Some(records),
        }
    }

    pub fn is_available(&self) -> bool {
        self.records.is_some()
    }

    pub fn records(&self) -> &[Discontinuity] {
        self.records.as_deref().unwrap_or(&[])
    }

    pub fn visible(
        &self,
        curr_sec: f64,
        seconds_per_page: f64,
    ) -> impl Iterator<Item = &Discontinuity> {
        self.records()
            .iter()
            .filter(move |d| d.overlaps(curr_sec, seconds_per_page))
    }
}
