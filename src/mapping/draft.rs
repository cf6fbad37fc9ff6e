//! Draft/version manager: staged edits on top of the mapping store.
//!
//! Drafts live beside the active file and are not schema-checked when saved;
//! deploy promotes them (see `deploy.rs`), history and rollback are in
//! `history.rs`.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde_json::Value;

use crate::mapping::clock::{Clock, SystemClock};
use crate::mapping::error::{MappingError, MappingResult};
use crate::mapping::paths::MappingPaths;
use crate::mapping::schema::apply_patch;
use crate::mapping::store::MappingStore;

/// Default number of history snapshots kept per mapping file.
pub const DEFAULT_HISTORY_LIMIT: usize = 50;

/// Staged-edit workflow for mapping files: drafts, deploys, history, rollback.
pub struct DraftManager {
    pub(crate) store: Arc<MappingStore>,
    pub(crate) clock: Arc<dyn Clock>,
    pub(crate) history_limit: usize,
}

impl DraftManager {
    pub fn new(store: Arc<MappingStore>) -> Self {
        Self {
            store,
            clock: Arc::new(SystemClock),
            history_limit: DEFAULT_HISTORY_LIMIT,
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Number of snapshots that survive pruning. Values below 1 are raised to 1.
    pub fn with_history_limit(mut self, limit: usize) -> Self {
        self.history_limit = limit.max(1);
        self
    }

    pub fn store(&self) -> &Arc<MappingStore> {
        &self.store
    }

    pub fn history_limit(&self) -> usize {
        self.history_limit
    }

    /// Write `content` to `<path>.draft`, replacing any existing draft.
    pub fn save_draft(&self, path: &Path, content: &Value) -> MappingResult<()> {
        let paths = MappingPaths::new(path);
        write_json(paths.draft(), content)?;
        tracing::debug!(draft = %paths.draft().display(), "Draft saved");
        Ok(())
    }

    /// The draft when it exists and parses, otherwise the raw active file.
    ///
    /// Unlike [`MappingStore::read_active`] this does not fall back to an
    /// empty document and does not apply schema defaults.
    pub fn read_draft_or_active(&self, path: &Path) -> MappingResult<Value> {
        let paths = MappingPaths::new(path);
        if paths.draft().exists() {
            match read_json(paths.draft()) {
                Ok(draft) => return Ok(draft),
                Err(e) => {
                    tracing::warn!(
                        draft = %paths.draft().display(),
                        error = %e,
                        "Draft unreadable, falling back to active mapping"
                    );
                }
            }
        }
        read_json(paths.active())
    }

    /// Apply an RFC 6902 patch to the draft-or-active document and save the
    /// result as the new draft.
    pub fn patch_draft(&self, path: &Path, patch: Value) -> MappingResult<Value> {
        let mut document = self.read_draft_or_active(path)?;
        apply_patch(&mut document, patch)?;
        self.save_draft(path, &document)?;
        Ok(document)
    }

    /// Delete the draft. Returns whether one existed.
    pub fn discard_draft(&self, path: &Path) -> MappingResult<bool> {
        let paths = MappingPaths::new(path);
        match std::fs::remove_file(paths.draft()) {
            Ok(()) => {
                tracing::debug!(draft = %paths.draft().display(), "Draft discarded");
                Ok(true)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(MappingError::io(paths.draft(), e)),
        }
    }

    /// Location of the draft staged for `path`.
    pub fn draft_path(&self, path: &Path) -> PathBuf {
        MappingPaths::new(path).draft().to_path_buf()
    }

    pub fn has_draft(&self, path: &Path) -> bool {
        MappingPaths::new(path).draft().is_file()
    }
}

pub(crate) fn read_json(path: &Path) -> MappingResult<Value> {
    let content = std::fs::read_to_string(path).map_err(|e| MappingError::io(path, e))?;
    serde_json::from_str(&content).map_err(|e| MappingError::parse(path.display().to_string(), e))
}

pub(crate) fn write_json(path: &Path, content: &Value) -> MappingResult<()> {
    let mut text = serde_json::to_string_pretty(content)
        .map_err(|e| MappingError::parse(path.display().to_string(), e))?;
    text.push('\n');
    std::fs::write(path, text).map_err(|e| MappingError::io(path, e))
}
