//! Version history listing and rollback.

use std::cmp::Ordering;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::Value;

use crate::mapping::clock::format_epoch_id;
use crate::mapping::draft::{read_json, DraftManager};
use crate::mapping::error::{MappingError, MappingResult};
use crate::mapping::paths::MappingPaths;
use crate::observability::metrics;

/// A history snapshot of a previously active mapping document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VersionEntry {
    /// Filename suffix, normally the epoch second of the deploy that replaced it.
    pub id: String,
    #[serde(skip)]
    pub filename: PathBuf,
    pub comment: String,
    pub date: String,
}

impl VersionEntry {
    fn read(filename: PathBuf, id: String) -> Self {
        let mut comment = String::new();
        let mut date = String::new();

        if let Ok(document) = read_json(&filename) {
            if let Some(meta) = document.get("meta") {
                if let Some(c) = meta.get("comment").and_then(Value::as_str) {
                    comment = c.to_string();
                }
                if let Some(d) = meta.get("created").and_then(Value::as_str) {
                    date = d.to_string();
                }
            }
        }

        if date.is_empty() {
            date = format_epoch_id(&id).unwrap_or_else(|| "Unknown".to_string());
        }

        Self {
            id,
            filename,
            comment,
            date,
        }
    }
}

/// Newest first. Numeric ids compare numerically; ids that are not integers
/// compare as strings and sort after all numeric ids.
pub fn compare_ids_desc(a: &str, b: &str) -> Ordering {
    match (a.parse::<i64>(), b.parse::<i64>()) {
        (Ok(x), Ok(y)) => y.cmp(&x),
        (Ok(_), Err(_)) => Ordering::Less,
        (Err(_), Ok(_)) => Ordering::Greater,
        (Err(_), Err(_)) => b.cmp(a),
    }
}

impl DraftManager {
    /// List history snapshots for `path`, newest first.
    pub fn history(&self, path: &Path) -> MappingResult<Vec<VersionEntry>> {
        let paths = MappingPaths::new(path);
        let dir = paths.versions_dir();
        if !dir.is_dir() {
            return Ok(Vec::new());
        }

        let mut entries = Vec::new();
        for entry in std::fs::read_dir(dir).map_err(|e| MappingError::io(dir, e))? {
            let entry = entry.map_err(|e| MappingError::io(dir, e))?;
            if entry.file_type().map(|t| t.is_dir()).unwrap_or(false) {
                continue;
            }
            let name = entry.file_name();
            if let Some(id) = paths.version_id(&name.to_string_lossy()) {
                entries.push(VersionEntry::read(entry.path(), id.to_string()));
            }
        }

        entries.sort_by(|a, b| compare_ids_desc(&a.id, &b.id));
        Ok(entries)
    }

    /// Read one snapshot verbatim.
    pub fn read_version(&self, path: &Path, version_id: &str) -> MappingResult<Value> {
        let file = locate_version(&MappingPaths::new(path), version_id)?;
        read_json(&file)
    }

    /// Restore a snapshot as the active document.
    ///
    /// The snapshot must satisfy the current schema. On success any pending
    /// draft is deleted and the cache entry is evicted; on failure the active
    /// file and cache are left alone. Once the active file is replaced the
    /// rollback counts as done, even if the stale draft cannot be removed.
    pub fn rollback_to(&self, path: &Path, version_id: &str) -> MappingResult<()> {
        let paths = MappingPaths::new(path);

        let result: MappingResult<()> = self.store.exclusive(path, |slot| {
            let snapshot = locate_version(&paths, version_id)?;
            let document = read_json(&snapshot)?;
            self.store.validator().validate(&document)?;

            std::fs::copy(&snapshot, paths.active())
                .map_err(|e| MappingError::io(paths.active(), e))?;
            slot.evict();

            if let Err(e) = self.discard_draft(path) {
                tracing::warn!(
                    draft = %paths.draft().display(),
                    code = e.code(),
                    error = %e,
                    "Rolled back but could not remove pending draft"
                );
            }
            Ok(())
        });

        match &result {
            Ok(()) => {
                metrics::record_rollback("restored");
                tracing::info!(path = %path.display(), version = %version_id, "Rolled back mapping");
            }
            Err(e) => {
                metrics::record_rollback(e.code());
                tracing::warn!(
                    path = %path.display(),
                    version = %version_id,
                    code = e.code(),
                    error = %e,
                    "Rollback rejected"
                );
            }
        }
        result
    }
}

fn locate_version(paths: &MappingPaths, version_id: &str) -> MappingResult<PathBuf> {
    let plausible = !version_id.is_empty()
        && !version_id.contains(['/', '\\'])
        && version_id != "."
        && version_id != "..";
    let file = paths.version_file(version_id);
    if plausible && file.is_file() {
        Ok(file)
    } else {
        Err(MappingError::VersionNotFound(version_id.to_string()))
    }
}
