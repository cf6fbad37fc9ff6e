//! OS signal handling.
//!
//! SIGINT/SIGTERM trigger graceful shutdown; SIGHUP drops the cached mapping
//! and reloads it without restarting.

use std::sync::Arc;

use crate::lifecycle::reload::{ReloadHub, ReloadReason};
use crate::lifecycle::shutdown::Shutdown;

/// Translate signals into shutdown and reload actions until shutdown.
#[cfg(unix)]
pub async fn handle_signals(hub: Arc<ReloadHub>, shutdown: Arc<Shutdown>) -> std::io::Result<()> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut hangup = signal(SignalKind::hangup())?;
    let mut terminate = signal(SignalKind::terminate())?;

    loop {
        tokio::select! {
            _ = hangup.recv() => {
                tracing::info!("SIGHUP received, reloading mapping");
                hub.force_reload(ReloadReason::Signal);
            }
            _ = terminate.recv() => {
                tracing::info!("SIGTERM received");
                break;
            }
            result = tokio::signal::ctrl_c() => {
                result?;
                tracing::info!("SIGINT received");
                break;
            }
            _ = shutdown.wait() => return Ok(()),
        }
    }

    shutdown.trigger();
    Ok(())
}

#[cfg(not(unix))]
pub async fn handle_signals(_hub: Arc<ReloadHub>, shutdown: Arc<Shutdown>) -> std::io::Result<()> {
    tokio::select! {
        result = tokio::signal::ctrl_c() => {
            result?;
            tracing::info!("Ctrl+C received");
        }
        _ = shutdown.wait() => return Ok(()),
    }
    shutdown.trigger();
    Ok(())
}
