//! Draft promotion.
//!
//! Deploy runs as a fixed sequence of named steps under the path's cache
//! lock: inject metadata, back up the active file, prune history, promote the
//! draft, evict the cache. Only `promote` can fail the deploy; the other steps
//! are recorded in the report and logged.

use std::path::{Path, PathBuf};
use std::time::SystemTime;

use serde::Serialize;
use serde_json::{Map, Value};

use crate::mapping::clock::format_timestamp;
use crate::mapping::draft::{read_json, write_json, DraftManager};
use crate::mapping::error::{MappingError, MappingResult};
use crate::mapping::paths::MappingPaths;
use crate::observability::metrics;

/// Named deploy steps, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DeployStep {
    InjectMeta,
    Backup,
    Prune,
    Promote,
    Invalidate,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "detail", rename_all = "snake_case")]
pub enum StepStatus {
    Done,
    Skipped(String),
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StepRecord {
    pub step: DeployStep,
    #[serde(flatten)]
    pub status: StepStatus,
}

/// What a successful deploy did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeployReport {
    /// Epoch-seconds id written to `meta.version` of the promoted document.
    pub version: String,
    /// Id of the snapshot taken of the previous active document.
    pub backup: Option<String>,
    pub pruned: usize,
    pub steps: Vec<StepRecord>,
}

impl DeployReport {
    pub fn status(&self, step: DeployStep) -> Option<&StepStatus> {
        self.steps.iter().find(|r| r.step == step).map(|r| &r.status)
    }

    /// True when every best-effort step completed or was legitimately skipped.
    pub fn is_clean(&self) -> bool {
        !self
            .steps
            .iter()
            .any(|r| matches!(r.status, StepStatus::Failed(_)))
    }
}

#[derive(Default)]
struct StepLog {
    steps: Vec<StepRecord>,
}

impl StepLog {
    fn done(&mut self, step: DeployStep) {
        self.steps.push(StepRecord {
            step,
            status: StepStatus::Done,
        });
    }

    fn skipped(&mut self, step: DeployStep, reason: &str) {
        self.steps.push(StepRecord {
            step,
            status: StepStatus::Skipped(reason.to_string()),
        });
    }

    /// Record a step whose failure must not abort the deploy.
    fn best_effort<T>(&mut self, step: DeployStep, result: MappingResult<T>) -> Option<T> {
        match result {
            Ok(value) => {
                self.done(step);
                Some(value)
            }
            Err(e) => {
                tracing::warn!(step = ?step, code = e.code(), error = %e, "Deploy step failed, continuing");
                self.steps.push(StepRecord {
                    step,
                    status: StepStatus::Failed(e.to_string()),
                });
                None
            }
        }
    }
}

impl DraftManager {
    /// Promote `<path>.draft` to the active file.
    ///
    /// Fails with [`MappingError::NoDraft`] when there is nothing to promote;
    /// callers treat that as a benign no-op. Any other error means the rename
    /// failed and the previous active file is still in place.
    pub fn deploy_draft(&self, path: &Path) -> MappingResult<DeployReport> {
        let paths = MappingPaths::new(path);

        self.store.exclusive(path, |slot| {
            if !paths.draft().is_file() {
                return Err(MappingError::NoDraft(path.to_path_buf()));
            }

            let now = self.clock.now();
            let version = now.timestamp().to_string();
            let mut log = StepLog::default();

            log.best_effort(
                DeployStep::InjectMeta,
                inject_meta(paths.draft(), &format_timestamp(now), &version),
            );

            let backup = if paths.active().is_file() {
                log.best_effort(DeployStep::Backup, backup_active(&paths, &version))
                    .map(|_| version.clone())
            } else {
                log.skipped(DeployStep::Backup, "no active document");
                None
            };

            let pruned = if paths.versions_dir().is_dir() {
                log.best_effort(
                    DeployStep::Prune,
                    prune_versions(&paths, self.history_limit),
                )
                .unwrap_or(0)
            } else {
                log.skipped(DeployStep::Prune, "no history directory");
                0
            };

            if let Err(source) = std::fs::rename(paths.draft(), paths.active()) {
                metrics::record_deploy("failed");
                tracing::error!(
                    draft = %paths.draft().display(),
                    active = %paths.active().display(),
                    error = %source,
                    "Promoting draft failed"
                );
                return Err(MappingError::io(paths.active(), source));
            }
            log.done(DeployStep::Promote);

            slot.evict();
            log.done(DeployStep::Invalidate);

            metrics::record_deploy("promoted");
            tracing::info!(
                path = %path.display(),
                version = %version,
                backup = ?backup,
                pruned,
                "Draft deployed"
            );

            Ok(DeployReport {
                version,
                backup,
                pruned,
                steps: log.steps,
            })
        })
    }
}

/// Stamp `meta.created` and `meta.version` into the draft file.
fn inject_meta(draft: &Path, created: &str, version: &str) -> MappingResult<()> {
    let mut document = read_json(draft)?;
    let Value::Object(root) = &mut document else {
        return Err(MappingError::SchemaViolation {
            errors: vec!["draft root is not an object".to_string()],
        });
    };

    let meta = root
        .entry("meta")
        .or_insert_with(|| Value::Object(Map::new()));
    if !meta.is_object() {
        *meta = Value::Object(Map::new());
    }
    if let Value::Object(meta) = meta {
        meta.insert("created".to_string(), Value::String(created.to_string()));
        meta.insert("version".to_string(), Value::String(version.to_string()));
    }

    write_json(draft, &document)
}

/// Copy the active file to `versions/<name>.<version>`, overwriting a collision.
fn backup_active(paths: &MappingPaths, version: &str) -> MappingResult<PathBuf> {
    std::fs::create_dir_all(paths.versions_dir())
        .map_err(|e| MappingError::io(paths.versions_dir(), e))?;
    let target = paths.version_file(version);
    std::fs::copy(paths.active(), &target).map_err(|e| MappingError::io(&target, e))?;
    Ok(target)
}

/// Remove the oldest snapshots (by modification time) beyond `limit`.
pub(crate) fn prune_versions(paths: &MappingPaths, limit: usize) -> MappingResult<usize> {
    let dir = paths.versions_dir();
    let mut versions: Vec<(SystemTime, Option<i64>, PathBuf)> = Vec::new();

    for entry in std::fs::read_dir(dir).map_err(|e| MappingError::io(dir, e))? {
        let entry = entry.map_err(|e| MappingError::io(dir, e))?;
        let name = entry.file_name();
        let Some(id) = paths.version_id(&name.to_string_lossy()).map(str::to_owned) else {
            continue;
        };
        let modified = entry
            .metadata()
            .and_then(|m| m.modified())
            .map_err(|e| MappingError::io(entry.path(), e))?;
        versions.push((modified, id.parse().ok(), entry.path()));
    }

    metrics::record_versions_retained(versions.len().min(limit));
    if versions.len() <= limit {
        return Ok(0);
    }

    // Oldest first; equal mtimes fall back to the numeric id.
    versions.sort();
    let excess = versions.len() - limit;
    for (_, _, path) in versions.iter().take(excess) {
        std::fs::remove_file(path).map_err(|e| MappingError::io(path, e))?;
        tracing::debug!(snapshot = %path.display(), "Pruned history snapshot");
    }
    metrics::record_pruned(excess);
    Ok(excess)
}
