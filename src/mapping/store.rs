//! Process-wide cache of parsed, validated mapping documents.
//!
//! Each path owns one slot guarded by its own mutex. `read_active` fills the
//! slot while holding that mutex, and deploy/rollback hold it across their
//! whole filesystem sequence, so a reader never caches a file that is about
//! to be replaced.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use dashmap::DashMap;
use serde_json::{Map, Value};

use crate::mapping::error::{MappingError, MappingResult};
use crate::mapping::schema::SchemaValidator;
use crate::observability::metrics;

type Slot = Arc<Mutex<Option<Arc<Value>>>>;

/// Exclusive access to one path's cache entry.
pub struct CacheSlot<'a> {
    entry: MutexGuard<'a, Option<Arc<Value>>>,
}

impl CacheSlot<'_> {
    /// Drop the cached document so the next read re-parses the file.
    pub fn evict(&mut self) {
        self.entry.take();
    }

    pub fn is_cached(&self) -> bool {
        self.entry.is_some()
    }
}

/// Cache of active mapping documents keyed by file path.
pub struct MappingStore {
    validator: Arc<SchemaValidator>,
    entries: DashMap<PathBuf, Slot>,
}

impl MappingStore {
    pub fn new(validator: SchemaValidator) -> Self {
        Self {
            validator: Arc::new(validator),
            entries: DashMap::new(),
        }
    }

    /// The immutable schema document.
    pub fn schema(&self) -> &Value {
        self.validator.schema()
    }

    pub fn validator(&self) -> &SchemaValidator {
        &self.validator
    }

    /// Return the active document for `path`, loading it on a cache miss.
    ///
    /// Never fails: a missing, unreadable, unparsable or schema-violating file
    /// is cached as an empty object and logged at debug level.
    pub fn read_active(&self, path: &Path) -> Arc<Value> {
        self.exclusive(path, |slot| {
            if let Some(document) = slot.entry.as_ref() {
                return document.clone();
            }

            let document = match self.load_active(path) {
                Ok(document) => {
                    tracing::debug!(path = %path.display(), "Mapping loaded");
                    metrics::record_cache_load("loaded");
                    document
                }
                Err(e) => {
                    tracing::debug!(
                        path = %path.display(),
                        code = e.code(),
                        error = %e,
                        "Mapping unusable, caching empty document"
                    );
                    metrics::record_cache_load(e.code());
                    Value::Object(Map::new())
                }
            };

            let document = Arc::new(document);
            *slot.entry = Some(document.clone());
            document
        })
    }

    /// Like [`read_active`](Self::read_active) but propagates load failures.
    /// Failed loads leave the cache untouched.
    pub fn try_read_active(&self, path: &Path) -> MappingResult<Arc<Value>> {
        self.exclusive(path, |slot| {
            if let Some(document) = slot.entry.as_ref() {
                return Ok(document.clone());
            }
            let document = Arc::new(self.load_active(path)?);
            metrics::record_cache_load("loaded");
            *slot.entry = Some(document.clone());
            Ok(document)
        })
    }

    /// Evict the cached entry for `path`. No-op when nothing is cached.
    pub fn invalidate(&self, path: &Path) {
        self.exclusive(path, |slot| slot.evict());
    }

    pub fn is_cached(&self, path: &Path) -> bool {
        self.exclusive(path, |slot| slot.is_cached())
    }

    /// Run `f` while holding the lock for `path`.
    pub fn exclusive<R>(&self, path: &Path, f: impl FnOnce(&mut CacheSlot<'_>) -> R) -> R {
        let slot = self.slot(path);
        let mut guard = CacheSlot {
            entry: slot.lock().unwrap_or_else(PoisonError::into_inner),
        };
        f(&mut guard)
    }

    fn slot(&self, path: &Path) -> Slot {
        self.entries
            .entry(path.to_path_buf())
            .or_default()
            .value()
            .clone()
    }

    fn load_active(&self, path: &Path) -> MappingResult<Value> {
        if path.as_os_str().is_empty() {
            return Err(MappingError::io(
                path,
                std::io::Error::new(std::io::ErrorKind::InvalidInput, "mapping path is empty"),
            ));
        }

        let content = std::fs::read_to_string(path).map_err(|e| MappingError::io(path, e))?;
        let mut document: Value = serde_json::from_str(&content)
            .map_err(|e| MappingError::parse(path.display().to_string(), e))?;

        let defaults = self.validator.validate(&document)?;
        if !defaults.is_empty() {
            tracing::debug!(
                path = %path.display(),
                operations = defaults.len(),
                "Applying schema defaults"
            );
            defaults.apply(&mut document)?;
        }
        Ok(document)
    }
}
