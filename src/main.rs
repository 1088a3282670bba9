use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;
use tokio::sync::mpsc;

use access_gate::config::{load_config, ConfigWatcher, GateConfig};
use access_gate::lifecycle::{signals, Shutdown};
use access_gate::observability::{logging, metrics};
use access_gate::GateServer;

#[derive(Parser)]
#[command(name = "access-gate")]
#[command(about = "Inline access-control gate (forward-auth endpoint)", long_about = None)]
struct Args {
    /// Path to the TOML configuration file. Defaults apply when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => load_config(path)?,
        None => GateConfig::default(),
    };

    logging::init_tracing(&config.observability.log_level);
    tracing::info!("access-gate v{} starting", env!("CARGO_PKG_VERSION"));

    tracing::info!(
        bind_address = %config.listener.bind_address,
        rules = config.rules.len(),
        dns_enabled = config.dns.enabled,
        decision_timeout_ms = config.request.decision_timeout_ms,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    // Hot reload: file changes and SIGHUP both feed the same channel.
    let (config_updates, _watcher) = match &args.config {
        Some(path) => {
            let (watcher, rx) = ConfigWatcher::new(path);
            signals::spawn_reload_on_hangup(path.clone(), watcher.sender())?;
            let handle = match watcher.run() {
                Ok(handle) => Some(handle),
                Err(e) => {
                    tracing::warn!(error = %e, "Config watcher unavailable; SIGHUP reload only");
                    None
                }
            };
            (rx, handle)
        }
        None => {
            let (_, rx) = mpsc::unbounded_channel();
            (rx, None)
        }
    };

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    signals::spawn_shutdown_handler(shutdown);

    let server = GateServer::new(config)?;
    server.run(listener, config_updates, server_shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
