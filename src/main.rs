//! visualdisk - Live system dashboard for your terminal
//!
//! Polls a metrics backend (or the local machine) and renders CPU, memory and volume
//! utilization, with every mounted volume drawn as an animated 3D ring.

mod config;
mod core;
mod integrations;
mod refresh;
mod ui;
mod viz;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::Level;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::config::{Config, API_BASE_ENV};
use crate::core::app::App;
use crate::integrations::api::ApiClient;
use crate::integrations::system::LocalSource;
use crate::integrations::MetricsSource;

#[derive(Parser)]
#[command(name = "visualdisk")]
#[command(author = "Visualdisk Contributors")]
#[command(version = "0.1.0")]
#[command(about = "Live system dashboard with an animated 3D volume ring view", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Base URL of the metrics backend
    #[arg(short, long, value_name = "URL", env = API_BASE_ENV)]
    api_base: Option<String>,

    /// Sample this machine instead of calling a backend
    #[arg(short, long)]
    local: bool,

    /// Start with auto refresh enabled
    #[arg(long)]
    auto: bool,

    /// Enable verbose logging
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Configuration file path
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Print a one-shot system report
    Status,

    /// Save a snapshot of the current metrics
    Snapshot,

    /// List recent snapshots
    Snapshots {
        /// Number of snapshots to show
        #[arg(short = 'n', long, default_value = "10")]
        limit: usize,
    },

    /// Check that the backend is reachable
    Health,

    /// Write a default configuration file
    Init {
        /// Force overwrite existing configuration
        #[arg(short, long)]
        force: bool,
    },
}

fn setup_logging(verbosity: u8) -> Result<tracing_appender::non_blocking::WorkerGuard> {
    let level = match verbosity {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };

    let filter = EnvFilter::from_default_env().add_directive(level.into());

    // The terminal belongs to the dashboard, so logs go to a file
    let log_dir = dirs::cache_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("visualdisk")
        .join("logs");

    std::fs::create_dir_all(&log_dir)?;

    let file_appender = tracing_appender::rolling::daily(&log_dir, "visualdisk.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(non_blocking).with_ansi(false))
        .init();

    Ok(guard)
}

fn build_source(config: &Config, local: bool) -> Result<Arc<dyn MetricsSource>> {
    if local {
        return Ok(Arc::new(LocalSource::new()));
    }
    let client = ApiClient::new(&config.api.base_url, config.request_timeout())?;
    Ok(Arc::new(client))
}

/// Resolve configuration from file, environment and flags.
fn load_config(cli: &Cli) -> Result<Config> {
    let mut config = Config::load_or_default(cli.config.as_deref())?;
    config.resolve_api_base(cli.api_base.clone());
    if cli.auto {
        config.refresh.auto_start = true;
    }
    tracing::info!(base_url = %config.api.base_url, local = cli.local, "configuration loaded");
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Keep the guard alive for the duration of the program
    let _logging_guard = setup_logging(cli.verbose)?;

    match cli.command {
        Some(Commands::Init { force }) => {
            let path = match &cli.config {
                Some(path) => path.clone(),
                None => Config::default_path()
                    .ok_or_else(|| anyhow::anyhow!("no configuration directory on this system"))?,
            };
            config::init_config(&path, force)?;
        }
        Some(Commands::Status) => {
            let config = load_config(&cli)?;
            let source = build_source(&config, cli.local)?;
            integrations::print_status(source.as_ref()).await?;
        }
        Some(Commands::Snapshot) => {
            let config = load_config(&cli)?;
            let source = build_source(&config, cli.local)?;
            let id = source.create_snapshot().await?;
            println!("Snapshot saved (id {id}).");
        }
        Some(Commands::Snapshots { limit }) => {
            let config = load_config(&cli)?;
            let source = build_source(&config, cli.local)?;
            integrations::print_snapshots(source.as_ref(), limit).await?;
        }
        Some(Commands::Health) => {
            if cli.local {
                println!("local source: ok");
            } else {
                let config = load_config(&cli)?;
                let client = ApiClient::new(&config.api.base_url, config.request_timeout())?;
                let health = client.health().await?;
                println!("{}: {}", client.base_url(), health.status);
            }
        }
        None => {
            // Launch the main TUI
            let config = load_config(&cli)?;
            let source = build_source(&config, cli.local)?;
            let mut app = App::new(config, source)?;
            app.run().await?;
        }
    }

    Ok(())
}
