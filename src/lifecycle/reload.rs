//! Reload fan-out to live mapping consumers.
//!
//! The hub keeps the latest validated mapping in an `ArcSwap` so consumers
//! read it without locking, and broadcasts a [`ReloadEvent`] whenever the
//! active document may have changed.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use arc_swap::ArcSwap;
use serde::Serialize;
use serde_json::Value;
use tokio::sync::broadcast;

use crate::mapping::MappingStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReloadReason {
    /// A deploy or rollback through the admin API.
    Admin,
    /// SIGHUP.
    Signal,
    /// The active file was edited outside the admin API.
    FileChanged,
}

#[derive(Debug, Clone)]
pub struct ReloadEvent {
    pub reason: ReloadReason,
    pub generation: u64,
    pub document: Arc<Value>,
}

pub struct ReloadHub {
    store: Arc<MappingStore>,
    path: PathBuf,
    live: ArcSwap<Value>,
    generation: AtomicU64,
    tx: broadcast::Sender<ReloadEvent>,
}

impl ReloadHub {
    /// Create a hub and load the initial live snapshot.
    pub fn new(store: Arc<MappingStore>, path: &Path) -> Self {
        let (tx, _) = broadcast::channel(16);
        let initial = store.read_active(path);
        Self {
            store,
            path: path.to_path_buf(),
            live: ArcSwap::new(initial),
            generation: AtomicU64::new(0),
            tx,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ReloadEvent> {
        self.tx.subscribe()
    }

    /// The mapping consumers should currently use.
    pub fn current(&self) -> Arc<Value> {
        self.live.load_full()
    }

    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    /// Re-read the active mapping, publish it and notify subscribers.
    pub fn reload(&self, reason: ReloadReason) -> ReloadEvent {
        let document = self.store.read_active(&self.path);
        self.publish(reason, document)
    }

    /// Drop the cached document first, then reload. Used when the file may
    /// have changed behind the store's back.
    pub fn force_reload(&self, reason: ReloadReason) -> ReloadEvent {
        self.store.invalidate(&self.path);
        self.reload(reason)
    }

    /// Like [`force_reload`](Self::force_reload) but only notifies when the
    /// freshly loaded document differs from the live one.
    pub fn reload_if_changed(&self, reason: ReloadReason) -> Option<ReloadEvent> {
        self.store.invalidate(&self.path);
        let document = self.store.read_active(&self.path);
        if *document == *self.live.load_full() {
            tracing::debug!(path = %self.path.display(), "Mapping unchanged, reload skipped");
            return None;
        }
        Some(self.publish(reason, document))
    }

    /// A callback suitable for the admin API's post-deploy hook.
    pub fn admin_callback(self: &Arc<Self>) -> crate::admin::ReloadCallback {
        let hub = Arc::clone(self);
        Arc::new(move || {
            hub.reload(ReloadReason::Admin);
        })
    }

    fn publish(&self, reason: ReloadReason, document: Arc<Value>) -> ReloadEvent {
        self.live.store(document.clone());
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let event = ReloadEvent {
            reason,
            generation,
            document,
        };
        let receivers = self.tx.send(event.clone()).unwrap_or(0);
        tracing::info!(
            path = %self.path.display(),
            reason = ?reason,
            generation,
            receivers,
            "Mapping reloaded"
        );
        event
    }
}
