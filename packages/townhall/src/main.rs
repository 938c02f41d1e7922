use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Mutex;
use tracing::info;
use tracing_subscriber::prelude::*;

mod api;
mod cli;
mod config;
mod socket;
mod store;
mod tui;

use townhall_state::protocol::SessionId;
use townhall_state::{Action, SessionAction};

use crate::config::{ClientConfig, FileConfig, TownhallConfig};

#[derive(Parser)]
#[command(name = "townhall")]
#[command(about = "Terminal client for live Q&A sessions")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Custom config/data directory (defaults to ~/.townhall)
    #[arg(long, global = true)]
    config_dir: Option<PathBuf>,

    /// Server base URL, overrides server.api_url
    #[arg(long, global = true)]
    api_url: Option<String>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    debug: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// List sessions
    List(ListArgs),

    /// Create a session and open it as the answerer
    Create(CreateArgs),

    /// Join a session as a questioner
    Join(JoinArgs),

    /// Reopen a session you already belong to
    Rejoin(RejoinArgs),
}

#[derive(Parser)]
struct ListArgs {
    /// Output as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Parser)]
struct CreateArgs {
    /// Session topic
    topic: String,

    /// Your display name
    #[arg(short, long)]
    name: String,
}

#[derive(Parser)]
struct JoinArgs {
    session_id: String,

    /// Your display name (omit to join anonymously)
    #[arg(short, long)]
    name: Option<String>,
}

#[derive(Parser)]
struct RejoinArgs {
    session_id: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let dirs = TownhallConfig::new(cli.config_dir.clone())?;
    init_logging(&dirs, cli.debug)?;

    let mut file_config: FileConfig = config::load_config(&dirs.data_dir)
        .extract()
        .with_context(|| format!("Invalid config in {}", dirs.config_toml_path().display()))?;
    if let Some(api_url) = cli.api_url {
        file_config.server.api_url = api_url;
    }
    let client_config = ClientConfig::from_file(&file_config)?;
    info!(
        api_url = %client_config.api_url,
        ws_url = %client_config.ws_url,
        "townhall starting"
    );

    match cli.command {
        None => cli::run_interactive(&client_config, None).await,
        Some(Commands::List(args)) => cli::list_command(&client_config, args.json).await,
        Some(Commands::Create(args)) => {
            let action = SessionAction::Create {
                topic: args.topic,
                name: args.name,
            };
            cli::run_interactive(&client_config, Some(Action::Session(action))).await
        }
        Some(Commands::Join(args)) => {
            let action = SessionAction::Join {
                session_id: SessionId::new(args.session_id),
                name: args.name,
            };
            cli::run_interactive(&client_config, Some(Action::Session(action))).await
        }
        Some(Commands::Rejoin(args)) => {
            let action = SessionAction::Rejoin {
                session_id: SessionId::new(args.session_id),
            };
            cli::run_interactive(&client_config, Some(Action::Session(action))).await
        }
    }
}

/// Log to `<data_dir>/logs/townhall.log`; the terminal belongs to the UI.
fn init_logging(dirs: &TownhallConfig, debug: bool) -> Result<()> {
    let log_path = dirs.log_path();
    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .with_context(|| format!("Failed to open log file: {}", log_path.display()))?;

    let default_directive = if debug {
        "townhall=debug,townhall_state=debug,warn"
    } else {
        "townhall=info,townhall_state=info,warn"
    };
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_directive));
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(Mutex::new(file))
                .with_ansi(false),
        )
        .with(env_filter)
        .init();
    Ok(())
}
