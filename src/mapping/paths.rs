//! On-disk layout of one mapping document.
//!
//! ```text
//! <dir>/<name>                  active document
//! <dir>/<name>.draft            staged edit
//! <dir>/versions/<name>.<id>    history snapshot, id = epoch seconds
//! ```

use std::path::{Path, PathBuf};

/// Directory holding history snapshots, beside the active file.
pub const VERSIONS_DIR: &str = "versions";

/// Suffix appended to the active path to form the draft path.
pub const DRAFT_SUFFIX: &str = ".draft";

/// Resolved file locations for a mapping path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MappingPaths {
    active: PathBuf,
    draft: PathBuf,
    versions_dir: PathBuf,
    base_name: String,
}

impl MappingPaths {
    pub fn new(active: &Path) -> Self {
        let mut draft = active.as_os_str().to_owned();
        draft.push(DRAFT_SUFFIX);

        let parent = active.parent().unwrap_or_else(|| Path::new(""));
        let base_name = active
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        Self {
            active: active.to_path_buf(),
            draft: PathBuf::from(draft),
            versions_dir: parent.join(VERSIONS_DIR),
            base_name,
        }
    }

    pub fn active(&self) -> &Path {
        &self.active
    }

    pub fn draft(&self) -> &Path {
        &self.draft
    }

    pub fn versions_dir(&self) -> &Path {
        &self.versions_dir
    }

    pub fn base_name(&self) -> &str {
        &self.base_name
    }

    /// Filename prefix shared by every snapshot of this document.
    pub fn version_prefix(&self) -> String {
        format!("{}.", self.base_name)
    }

    pub fn version_file(&self, id: &str) -> PathBuf {
        self.versions_dir.join(format!("{}{}", self.version_prefix(), id))
    }

    /// Extract the version id from a snapshot filename, if it belongs to this document.
    pub fn version_id<'a>(&self, file_name: &'a str) -> Option<&'a str> {
        file_name
            .strip_prefix(self.base_name.as_str())
            .and_then(|rest| rest.strip_prefix('.'))
            .filter(|id| !id.is_empty())
    }
}
