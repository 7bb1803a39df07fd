//! Cadence CLI - music library client

mod commands;
mod logging;

use anyhow::Result;
use cadence_core::{FileSessionStore, SessionEvent, SessionManager, Settings};
use cadence_http::{ApiClient, ClientError};
use clap::{Parser, ValueEnum};
use commands::Commands;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tracing::{Level, debug, error, info, warn};

#[derive(Parser)]
#[command(name = "cadence")]
#[command(about = "Browse and manage a Cadence music library")]
#[command(version)]
struct Cli {
    /// Set logging level
    #[arg(short = 'l', long, global = true, default_value = "warn")]
    log_level: LogLevel,

    /// Data directory for the session file and logs
    #[arg(short = 'd', long, global = true)]
    data_dir: Option<PathBuf>,

    /// Configuration file (TOML or YAML)
    #[arg(short = 'c', long, global = true)]
    config: Option<PathBuf>,

    /// API base URL, e.g. https://music.example.com/api
    #[arg(long, global = true)]
    api_base: Option<String>,

    /// Per-request timeout in seconds (0 = no timeout)
    #[arg(short = 't', long, global = true)]
    timeout: Option<u64>,

    /// Disable file logging (only log to stderr)
    #[arg(long, global = true)]
    no_file_log: bool,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut settings = Settings::load(cli.config.as_deref())?;
    if let Some(data_dir) = cli.data_dir {
        settings.data_dir = data_dir;
    }
    if let Some(api_base) = cli.api_base {
        settings.api.base_url = api_base;
    }
    if let Some(timeout) = cli.timeout {
        settings.api.timeout_secs = timeout;
    }

    logging::init_logging(cli.log_level.into(), &settings.data_dir, cli.no_file_log)?;

    info!(base_url = %settings.api.base_url, "Starting Cadence CLI");

    let session = SessionManager::new(Arc::new(FileSessionStore::new(&settings.data_dir)));
    let client = ApiClient::builder()
        .settings(&settings.api)
        .session(session.clone())
        .build()?;
    let watcher = watch_session(&session);

    let result = cli.command.execute(&client).await;
    watcher.abort();

    match result {
        Ok(()) => {
            info!("Command completed successfully");
        }
        Err(e) => {
            if e.downcast_ref::<ClientError>()
                .is_some_and(ClientError::requires_login)
            {
                error!("{e}");
                eprintln!("Session ended, please log in again with `cadence login`");
            } else {
                error!("Command failed: {e}");
                eprintln!("Error: {e}");
            }
            std::process::exit(1);
        }
    }

    Ok(())
}

/// Report sessions ended by a failed refresh while a command runs
fn watch_session(session: &SessionManager) -> JoinHandle<()> {
    let mut events = session.subscribe();
    tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(event) if event.is_forced_end() => {
                    warn!("Session ended by the server, sign in again to continue");
                    break;
                }
                Ok(SessionEvent::Refreshed { user_id }) => {
                    debug!(%user_id, "Access token renewed");
                }
                Ok(event) => debug!(?event, "Session event"),
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "Session event listener fell behind");
                }
                Err(RecvError::Closed) => break,
            }
        }
    })
}

#[derive(Clone, Debug, ValueEnum)]
enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for Level {
    fn from(log_level: LogLevel) -> Self {
        match log_level {
            LogLevel::Error => Level::ERROR,
            LogLevel::Warn => Level::WARN,
            LogLevel::Info => Level::INFO,
            LogLevel::Debug => Level::DEBUG,
            LogLevel::Trace => Level::TRACE,
        }
    }
}
