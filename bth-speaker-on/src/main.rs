/*!
 * bth-speaker-on
 * Keeps a paired Bluetooth speaker connected to this machine
 */

use anyhow::{Context, Result};
use clap::{Args, CommandFactory, Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{debug, error, info};

mod config;
mod device;
mod error;
mod logfile;
mod manager;
mod shutdown;

use config::Config;
use manager::{DeviceManager, LoggingManager};

#[derive(Parser)]
#[command(name = "bth-speaker-on", version)]
#[command(about = "bth-speaker-on is a tool to keep bluetooth speaker on")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    debug: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Start bth-speaker-on
    Start(StartArgs),
}

#[derive(Args)]
struct StartArgs {
    /// Speaker label, recorded in the log
    label: String,

    /// Interval in seconds to check if devices are up [default: 5]
    #[arg(short = 'u', long = "up-interval", value_parser = clap::value_parser!(u64).range(1..=config::MAX_UP_INTERVAL_SECS))]
    up_interval: Option<u64>,

    /// Configuration file path
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        None => Cli::command().print_help().map_err(Into::into),
        Some(Commands::Start(args)) => start(args, cli.debug).await,
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            if tracing::dispatcher::has_been_set() {
                error!("{:#}", e);
            } else {
                eprintln!("Error: {:#}", e);
            }
            ExitCode::FAILURE
        }
    }
}

async fn start(args: StartArgs, debug: bool) -> Result<()> {
    let config = Config::load_or_default(args.config.as_deref())
        .and_then(|config| config.with_up_interval(args.up_interval))
        .context("Failed to load configuration")?;

    logfile::init(&config.logging.file, debug)?;
    logfile::announce(&config.logging.file);
    debug!("Effective configuration:\n{}", config.to_toml()?);
    info!("Keeping {} connected", args.label);

    let manager = manager::select(std::env::consts::OS)
        .await
        .context("Failed to set up device manager")?;
    let manager = LoggingManager::new(manager);

    let shutdown = shutdown::shutdown_token().context("Failed to install signal handlers")?;
    manager.start(shutdown, config.up_interval()).await?;

    info!("bth-speaker-on stopped");
    Ok(())
}
