//! eegpager binary: parse arguments, negotiate a session with the page
//! server, then open the viewer window.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use dialoguer::theme::ColorfulTheme;
use dialoguer::Password;

use eegpager::app::{run_viewer, EegPagerApp, INITIAL_PLOT_PX};
use eegpager::persistence::{load_state_from_path, ViewStateSerde};
use eegpager::{
    Error, Pager, ProcessLauncher, Result, SecondsPerPage, SessionNegotiator, SessionRequest,
    ViewerConfig,
};

#[derive(Parser)]
#[command(name = "eegpager")]
#[command(about = "Paged viewer for multichannel recordings served by eeg_page_server")]
#[command(version)]
struct Cli {
    /// Recording directory (one sub-directory per channel)
    data_dir: PathBuf,

    /// Page server executable
    #[arg(long, env = "EEGPAGER_SERVER")]
    server: Option<PathBuf>,

    /// Initial page length in seconds (5, 10, 15, 30, 45 or 60)
    #[arg(short, long, value_parser = parse_seconds_per_page)]
    seconds_per_page: Option<SecondsPerPage>,

    /// Password for encrypted recordings; prompted for when needed otherwise
    #[arg(long, env = "EEGPAGER_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    /// Configuration file (default: ~/.eegpager/config.yaml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Give up waiting for the page server after this many seconds
    #[arg(long)]
    timeout: Option<u64>,
}

fn parse_seconds_per_page(s: &str) -> std::result::Result<SecondsPerPage, String> {
    let secs: u32 = s.parse().map_err(|e| format!("{}", e))?;
    SecondsPerPage::try_from(secs)
}

fn prompt_password() -> Option<String> {
    let entered = Password::with_theme(&ColorfulTheme::default())
        .with_prompt("Recording password (empty to cancel)")
        .allow_empty_password(true)
        .interact();
    match entered {
        Ok(p) if !p.is_empty() => Some(p),
        Ok(_) => None,
        Err(e) => {
            tracing::warn!(error = %e, "password prompt failed");
            None
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let config_path = match cli.config {
        Some(p) => p,
        None => ViewerConfig::default_path()?,
    };
    let mut config = ViewerConfig::load_or_default(&config_path)?;

    let state_path = ViewStateSerde::default_path(&config_path);
    match load_state_from_path(&state_path) {
        Ok(state) => state.apply_to(&mut config),
        Err(Error::Io { .. }) => {}
        Err(e) => tracing::warn!(error = %e, "ignoring saved view state"),
    }

    if let Some(server) = cli.server {
        config.server_path = Some(server);
    }
    if let Some(spp) = cli.seconds_per_page {
        config.seconds_per_page = spp;
    }
    if let Some(secs) = cli.timeout {
        config.timing.negotiation_timeout_secs = Some(secs);
        config.timing.window_timeout_secs = Some(secs);
    }

    let request = SessionRequest::discover(
        &cli.data_dir,
        &config.channel_exclude,
        INITIAL_PLOT_PX[0],
        config.seconds_per_page,
    )?;
    tracing::info!(
        data_dir = %cli.data_dir.display(),
        channels = request.channel_paths.len(),
        "opening recording"
    );

    let launcher = ProcessLauncher::new(config.resolve_server_path()?);
    let negotiator =
        SessionNegotiator::new(launcher, config.temp_root(), config.timing.clone());
    let mut prompt = prompt_password;
    let Some((session, catalog)) = negotiator.open(&request, cli.password, &mut prompt)? else {
        return Ok(());
    };

    let mut pager = Pager::new(session, catalog, config.timing.clone(), INITIAL_PLOT_PX[1]);
    pager.start()?;

    let app = EegPagerApp::new(pager, ViewStateSerde::from(&config), config.dpi)
        .with_state_path(state_path);
    let title = format!("eegpager - {}", cli.data_dir.display());
    run_viewer(app, &title).map_err(|e| Error::Viewer(e.to_string()))
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("eegpager=info")),
        )
        .init();

    match run(Cli::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "eegpager failed");
            eprintln!("eegpager: {}", e);
            ExitCode::FAILURE
        }
    }
}
