//! Configuration file watcher for hot reload.

use std::path::{Path, PathBuf};
use std::time::Duration;

use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;

use crate::config::loader::load_config;
use crate::config::schema::GateConfig;
use crate::observability::metrics;

/// A watcher that monitors the configuration file for changes.
pub struct ConfigWatcher {
    path: PathBuf,
    update_tx: mpsc::UnboundedSender<GateConfig>,
}

impl ConfigWatcher {
    /// Create a new ConfigWatcher.
    ///
    /// Returns the watcher and a receiver for configuration updates.
    pub fn new(path: &Path) -> (Self, mpsc::UnboundedReceiver<GateConfig>) {
        let (update_tx, update_rx) = mpsc::unbounded_channel();

        (
            Self {
                path: path.to_path_buf(),
                update_tx,
            },
            update_rx,
        )
    }

    /// Sender for pushing reloads from other triggers (e.g. SIGHUP).
    pub fn sender(&self) -> mpsc::UnboundedSender<GateConfig> {
        self.update_tx.clone()
    }

    /// Start watching the file in a background thread.
    ///
    /// The returned handle must be kept alive for as long as reloads are wanted.
    pub fn run(self) -> Result<RecommendedWatcher, notify::Error> {
        let tx = self.update_tx.clone();
        let path = self.path.clone();

        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) => {
                    if event.kind.is_modify() || event.kind.is_create() {
                        tracing::info!("Config file change detected, reloading...");
                        reload_into(&path, &tx);
                    }
                }
                Err(e) => tracing::error!("Watch error: {:?}", e),
            },
            Config::default().with_poll_interval(Duration::from_secs(2)),
        )?;

        watcher.watch(&self.path, RecursiveMode::NonRecursive)?;

        tracing::info!(path = ?self.path, "Config watcher started");
        Ok(watcher)
    }
}

/// Load `path` and forward it on success; keep the current config otherwise.
pub fn reload_into(path: &Path, tx: &mpsc::UnboundedSender<GateConfig>) {
    match load_config(path) {
        Ok(new_config) => {
            metrics::record_config_reload("loaded");
            let _ = tx.send(new_config);
        }
        Err(e) => {
            metrics::record_config_reload("rejected");
            tracing::error!(
                "Failed to reload config: {}. Keeping current configuration.",
                e
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reload_into_forwards_valid_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gate.toml");
        std::fs::write(
            &path,
            "[[rules]]\ntype = \"ip_range\"\nname = \"a\"\nranges = [\"10.0.0.0/8\"]\n",
        )
        .unwrap();

        let (watcher, mut rx) = ConfigWatcher::new(&path);
        reload_into(&path, &watcher.sender());

        let config = rx.try_recv().unwrap();
        assert_eq!(config.rules.len(), 1);
    }

    #[test]
    fn test_reload_into_drops_invalid_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gate.toml");
        std::fs::write(&path, "[challenge]\nstatus = 200\n").unwrap();

        let (watcher, mut rx) = ConfigWatcher::new(&path);
        reload_into(&path, &watcher.sender());

        assert!(rx.try_recv().is_err());
    }
}
