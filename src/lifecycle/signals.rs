//! OS signal handling.
//!
//! # Responsibilities
//! - Register signal handlers (SIGTERM, SIGINT, SIGHUP)
//! - Translate signals to internal events
//! - Trigger appropriate actions (shutdown, reload)
//!
//! # Design Decisions
//! - Uses Tokio's signal handling (async-safe)
//! - A second SIGTERM/SIGINT forces exit
//! - SIGHUP triggers config reload, not shutdown

use std::path::PathBuf;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use super::shutdown::Shutdown;
use crate::config::watcher::reload_into;
use crate::config::GateConfig;

/// Resolve on the first SIGINT (Ctrl+C) or SIGTERM.
pub async fn wait_for_termination() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}

/// Trigger `shutdown` on the first termination signal; exit on the second.
pub fn spawn_shutdown_handler(shutdown: Shutdown) -> JoinHandle<()> {
    tokio::spawn(async move {
        wait_for_termination().await;
        tracing::info!("Termination signal received, shutting down gracefully");
        shutdown.trigger();

        wait_for_termination().await;
        tracing::warn!("Second termination signal received, forcing exit");
        std::process::exit(130);
    })
}

/// Reload `path` into `updates` on every SIGHUP.
#[cfg(unix)]
pub fn spawn_reload_on_hangup(
    path: PathBuf,
    updates: mpsc::UnboundedSender<GateConfig>,
) -> std::io::Result<JoinHandle<()>> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut hangup = signal(SignalKind::hangup())?;
    Ok(tokio::spawn(async move {
        while hangup.recv().await.is_some() {
            tracing::info!(path = ?path, "SIGHUP received, reloading configuration");
            reload_into(&path, &updates);
        }
    }))
}

#[cfg(not(unix))]
pub fn spawn_reload_on_hangup(
    _path: PathBuf,
    _updates: mpsc::UnboundedSender<GateConfig>,
) -> std::io::Result<JoinHandle<()>> {
    Ok(tokio::spawn(async {}))
}
