//! eegpager crate root: re-exports and module wiring.
//!
//! A paged viewer for multichannel recordings decoded by an external page
//! server. Viewer and server share nothing but a session directory of small
//! text files and one binary page buffer.
//!
//! Modules:
//! - `session`: session directory, liveness signal, negotiation and lifecycle
//! - `data`: channel catalog, page specs, buffer handshake, page reading,
//!   rendering, annotations, discontinuities and the progress strip model
//! - `pager`: navigation controller tying the pipeline together
//! - `config`: viewer configuration and protocol timing
//! - `persistence`: display preferences saved between runs
//! - `app`: egui/eframe front end

pub mod app;
pub mod config;
pub mod data;
pub mod error;
pub mod pager;
pub mod persistence;
pub mod session;

// Public re-exports for a compact external API
pub use app::{run_viewer, EegPagerApp};
pub use config::{ProtocolTiming, SecondsPerPage, ViewerConfig};
pub use error::{Error, Result};
pub use pager::{EventMarker, Pager};
pub use persistence::ViewStateSerde;
pub use session::{
    Attempt, CancelToken, PageServerLauncher, PasswordPrompt, ProcessLauncher, Session,
    SessionDirectory, SessionNegotiator, SessionRequest,
};
