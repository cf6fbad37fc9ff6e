//! Mapping file watcher for hot reload on external edits.
//!
//! The parent directory is watched rather than the file itself, because
//! deploys and editors replace the file by rename.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};

use crate::lifecycle::reload::{ReloadHub, ReloadReason};

/// Watches the active mapping file and reloads consumers when it changes.
pub struct MappingWatcher {
    path: PathBuf,
    poll_interval: Duration,
    hub: Arc<ReloadHub>,
}

impl MappingWatcher {
    pub fn new(path: &Path, poll_interval: Duration, hub: Arc<ReloadHub>) -> Self {
        Self {
            path: path.to_path_buf(),
            poll_interval,
            hub,
        }
    }

    /// Start watching. The returned watcher must be kept alive.
    pub fn run(self) -> Result<RecommendedWatcher, notify::Error> {
        let watch_dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        let file_name = self.path.file_name().map(ToOwned::to_owned);
        let hub = self.hub.clone();

        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) => {
                    if !(event.kind.is_modify() || event.kind.is_create()) {
                        return;
                    }
                    let touches_active = event
                        .paths
                        .iter()
                        .any(|p| p.file_name().is_some() && p.file_name() == file_name.as_deref());
                    if touches_active {
                        tracing::debug!(kind = ?event.kind, "Mapping file change detected");
                        hub.reload_if_changed(ReloadReason::FileChanged);
                    }
                }
                Err(e) => tracing::error!("Watch error: {:?}", e),
            },
            Config::default().with_poll_interval(self.poll_interval),
        )?;

        watcher.watch(&watch_dir, RecursiveMode::NonRecursive)?;

        tracing::info!(path = ?self.path, "Mapping watcher started");
        Ok(watcher)
    }
}
