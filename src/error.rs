//! Error type shared by the session protocol, page pipeline and configuration.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Everything that can go wrong while talking to the page server.
///
/// Files that are merely *not there yet* are not errors: the protocol polls for
/// them. Only an elapsed caller deadline or an explicit cancellation turns a
/// wait into an error.
#[derive(Debug, Error)]
pub enum Error {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to launch page server {program}: {source}")]
    Spawn {
        program: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed {file}: {reason}")]
    Malformed { file: String, reason: String },

    #[error("wait cancelled")]
    Cancelled,

    #[error("timed out after {after:?} waiting for {what}")]
    TimedOut { what: &'static str, after: Duration },

    #[error("no channels found in data directory")]
    NoChannels,

    #[error("configuration error: {0}")]
    Config(String),

    #[error("persistence error: {0}")]
    Persistence(String),

    #[error("viewer error: {0}")]
    Viewer(String),
}

impl Error {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn malformed(file: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::Malformed {
            file: file.into(),
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
