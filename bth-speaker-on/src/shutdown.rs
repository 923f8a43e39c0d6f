/*!
 * Shutdown Signals
 * SIGINT and SIGTERM cancel a token the keep-alive loop watches
 */

use std::io;
use tokio_util::sync::CancellationToken;
use tracing::info;

/// Registers the handlers up front, so a failure surfaces before the loop starts.
#[cfg(unix)]
pub fn shutdown_token() -> io::Result<CancellationToken> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut sigint = signal(SignalKind::interrupt())?;
    let mut sigterm = signal(SignalKind::terminate())?;

    let token = CancellationToken::new();
    let trigger = token.clone();
    tokio::spawn(async move {
        let name = tokio::select! {
            _ = sigint.recv() => "SIGINT",
            _ = sigterm.recv() => "SIGTERM",
        };
        info!("Received {}, shutting down", name);
        trigger.cancel();
    });

    Ok(token)
}

#[cfg(not(unix))]
pub fn shutdown_token() -> io::Result<CancellationToken> {
    let token = CancellationToken::new();
    let trigger = token.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => info!("Received Ctrl-C, shutting down"),
            Err(e) => tracing::error!("Ctrl-C handler failed, shutting down: {}", e),
        }
        trigger.cancel();
    });

    Ok(token)
}
