//! Signal handling for interrupting a running command.
//!
//! Provisioning can block for minutes on downloads and on the first run of a
//! world. Waiting on [`wait_for_shutdown`] next to the command lets the user
//! abort it; dropping the command future cancels in-flight requests and
//! kills a running first-run process.

use tokio::signal;
use tracing::warn;

/// Resolves when a termination signal arrives.
///
/// # Platform Support
///
/// * **Unix platforms**: Handles SIGINT and SIGTERM signals
/// * **Windows**: Handles Ctrl+C signal
pub async fn wait_for_shutdown() -> Result<(), Box<dyn std::error::Error>> {
    wait_for_shutdown_silent().await?;
    warn!("📡 Received shutdown signal - cancelling current command");
    Ok(())
}

async fn wait_for_shutdown_silent() -> Result<(), Box<dyn std::error::Error>> {
    #[cfg(unix)]
    {
        use signal::unix::{signal, SignalKind};

        let mut sigint = signal(SignalKind::interrupt())?;
        let mut sigterm = signal(SignalKind::terminate())?;

        tokio::select! {
            _ = sigint.recv() => (),
            _ = sigterm.recv() => ()
        }
    }

    #[cfg(windows)]
    signal::ctrl_c().await?;

    Ok(())
}
