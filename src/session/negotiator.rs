//! Session negotiation: launch the page server, publish the initial page
//! specs, then wait for channel metadata or a password request.

use std::path::{Path, PathBuf};
use std::process::{Child, Command};

use crate::config::{ProtocolTiming, SecondsPerPage};
use crate::data::catalog::{discover_channel_paths, ChannelCatalog};
use crate::data::page_specs::{write_current_sec, PageSpec, PageSpecChannel};
use crate::error::{Error, Result};
use crate::session::cancel::{CancelToken, Waiter};
use crate::session::directory::{files, SessionDirectory};
use crate::session::heartbeat::LivenessSignal;
use crate::session::Session;

/// Starts a page server for a session directory.
///
/// Implementations may return `None` when the server is not a child process
/// (for example an in-process fake in tests).
pub trait PageServerLauncher {
    fn launch(&self, dir: &SessionDirectory, password: Option<&str>) -> Result<Option<Child>>;
}

/// Launches the page server executable as `<exe> <session_dir> [password]`.
#[derive(Debug, Clone)]
pub struct ProcessLauncher {
    program: PathBuf,
}

impl ProcessLauncher {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl PageServerLauncher for ProcessLauncher {
    fn launch(&self, dir: &SessionDirectory, password: Option<&str>) -> Result<Option<Child>> {
        let mut cmd = Command::new(&self.program);
        cmd.arg(dir.server_arg());
        if let Some(p) = password {
            cmd.arg(p);
        }
        let child = cmd.spawn().map_err(|source| Error::Spawn {
            program: self.program.clone(),
            source,
        })?;
        tracing::info!(
            program = %self.program.display(),
            pid = child.id(),
            with_password = password.is_some(),
            "page server launched"
        );
        Ok(Some(child))
    }
}

/// Supplies a password after the server asked for one. `None` aborts the load.
pub trait PasswordPrompt {
    fn prompt(&mut self) -> Option<String>;
}

impl<F> PasswordPrompt for F
where
    F: FnMut() -> Option<String>,
{
    fn prompt(&mut self) -> Option<String> {
        self()
    }
}

/// What to open: the recording directory, its channels and the initial view.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionRequest {
    pub data_dir: PathBuf,
    pub channel_paths: Vec<PathBuf>,
    pub pixel_width: u32,
    pub seconds_per_page: SecondsPerPage,
}

impl SessionRequest {
    /// Request every channel directory of `data_dir` not matching `exclude`.
    pub fn discover(
        data_dir: &Path,
        exclude: &[String],
        pixel_width: u32,
        seconds_per_page: SecondsPerPage,
    ) -> Result<Self> {
        Ok(Self {
            data_dir: data_dir.to_path_buf(),
            channel_paths: discover_channel_paths(data_dir, exclude)?,
            pixel_width: pixel_width.max(1),
            seconds_per_page,
        })
    }

    fn page_spec(&self) -> PageSpec {
        PageSpec {
            data_dir: self.data_dir.clone(),
            channel_paths: self.channel_paths.clone(),
            pixel_width: self.pixel_width,
            seconds_per_page: self.seconds_per_page,
        }
    }
}

/// Result of one negotiation round.
pub enum Attempt {
    Ready(Session, ChannelCatalog),
    /// The server found encrypted channels; retry with a password.
    AuthRequired,
}

impl std::fmt::Debug for Attempt {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Attempt::Ready(_, catalog) => write!(f, "Ready({} channels)", catalog.len()),
            Attempt::AuthRequired => write!(f, "AuthRequired"),
        }
    }
}

pub struct SessionNegotiator<L> {
    launcher: L,
    temp_root: PathBuf,
    timing: ProtocolTiming,
    token: CancelToken,
}

impl<L: PageServerLauncher> SessionNegotiator<L> {
    pub fn new(launcher: L, temp_root: impl Into<PathBuf>, timing: ProtocolTiming) -> Self {
        Self {
            launcher,
            temp_root: temp_root.into(),
            timing,
            token: CancelToken::new(),
        }
    }

    pub fn launcher(&self) -> &L {
        &self.launcher
    }

    /// Token that aborts a pending negotiation from another thread.
    pub fn cancel_token(&self) -> CancelToken {
        self.token.clone()
    }

    /// One negotiation round in a fresh session directory.
    pub fn attempt(&self, request: &SessionRequest, password: Option<&str>) -> Result<Attempt> {
        let dir = SessionDirectory::create_in(&self.temp_root)?;
        let heartbeat = LivenessSignal::start(
            &dir,
            self.timing.heartbeat_tick(),
            self.timing.heartbeat_grace(),
        )?;
        let server = self.launcher.launch(&dir, password)?;

        write_current_sec(&dir, 0)?;
        let mut specs = PageSpecChannel::new(dir.clone(), request.page_spec());
        specs.publish()?;

        let mut session = Session::new(
            dir.clone(),
            heartbeat,
            server,
            specs,
            request.data_dir.clone(),
            password.map(str::to_string),
        );

        let expected = request.channel_paths.len();
        let waiter = Waiter::new(&self.token, "server info", self.timing.negotiation_timeout());
        let catalog = loop {
            if dir.exists(files::PASSWORD_NEEDED) {
                tracing::info!(dir = %dir.path().display(), "page server requires a password");
                session.close()?;
                return Ok(Attempt::AuthRequired);
            }
            if let Ok(text) = dir.read_text(files::SERVER_INFO) {
                if let Some(catalog) = ChannelCatalog::from_server_info(&text, expected)? {
                    break catalog;
                }
            }
            waiter.pause(self.timing.retry())?;
        };

        session.set_bounds(catalog.start_time(), catalog.end_time());
        session.write_cursor(catalog.start_time() as i64)?;
        tracing::info!(
            channels = catalog.len(),
            start = catalog.start_time(),
            end = catalog.end_time(),
            "session negotiated"
        );
        Ok(Attempt::Ready(session, catalog))
    }

    /// Negotiate, prompting for a password as often as the server asks.
    ///
    /// Every retry runs in a new session directory with a new liveness signal;
    /// the previous one is stopped first. `Ok(None)` means the prompt was
    /// cancelled and nothing was loaded.
    pub fn open(
        &self,
        request: &SessionRequest,
        password: Option<String>,
        prompt: &mut dyn PasswordPrompt,
    ) -> Result<Option<(Session, ChannelCatalog)>> {
        let mut password = password;
        loop {
            match self.attempt(request, password.as_deref())? {
                Attempt::Ready(session, catalog) => return Ok(Some((session, catalog))),
                Attempt::AuthRequired => match prompt.prompt() {
                    Some(p) => password = Some(p),
                    None => {
                        tracing::info!("password prompt cancelled, session load aborted");
                        return Ok(None);
                    }
                },
            }
        }
    }
}
