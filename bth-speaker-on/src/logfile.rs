/*!
 * Log File & Startup Banner
 * Console plus a log file that is truncated on every start
 */

use anyhow::{Context, Result};
use std::fs::File;
use std::path::Path;
use std::sync::Mutex;
use tracing::Metadata;
use tracing_subscriber::filter::{filter_fn, FilterFn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Banner and environment events: printed to stdout directly, so the
/// console layer skips them and only the file receives them.
const STARTUP_TARGET: &str = "bth_speaker_on::startup";

const BANNER: &str = r"
  ___ _____ _  _   ___                _               ___  _  _
 | _ )_   _| || | / __|_ __  ___ __ _| |_____ _ _    / _ \| \| |
 | _ \ | | | __ | \__ \ '_ \/ -_) _` | / / -_) '_|  | (_) | .` |
 |___/ |_| |_||_| |___/ .__/\___\__,_|_\_\___|_|     \___/|_|\_|
                      |_|
";

/// Installs the global subscriber. `RUST_LOG` wins over `debug` when set.
pub fn init(path: &Path, debug: bool) -> Result<()> {
    let file = File::create(path).with_context(|| format!("Cannot open log file {}", path.display()))?;

    let level = if debug { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("bth_speaker_on={}", level)));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).with_filter(console_filter()))
        .with(fmt::layer().with_ansi(false).with_writer(Mutex::new(file)))
        .try_init()
        .context("Logging already initialized")?;

    Ok(())
}

fn console_filter() -> FilterFn<impl Fn(&Metadata<'_>) -> bool> {
    filter_fn(|meta| meta.target() != STARTUP_TARGET)
}

pub fn startup_info(log_file: &Path) -> Vec<String> {
    vec![
        format!("OS: {}", std::env::consts::OS),
        format!("Arch: {}", std::env::consts::ARCH),
        format!("Version: {}", env!("CARGO_PKG_VERSION")),
        format!("Log file: {}", log_file.display()),
        format!("Started: {}", chrono::Local::now().to_rfc3339()),
    ]
}

/// Prints the banner and environment to stdout and mirrors them into the log.
pub fn announce(log_file: &Path) {
    println!("{}", BANNER);
    tracing::info!(target: STARTUP_TARGET, "{}", BANNER);
    for line in startup_info(log_file) {
        println!("{}", line);
        tracing::info!(target: STARTUP_TARGET, "{}", line);
    }
}
