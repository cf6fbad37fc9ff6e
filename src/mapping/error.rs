//! Error taxonomy for the mapping store and its draft/version workflow.

use std::path::PathBuf;
use thiserror::Error;

/// Errors produced by the mapping store, the schema validator and the
/// draft/version manager.
#[derive(Debug, Error)]
pub enum MappingError {
    /// A document (active, draft, snapshot or request body) is not valid JSON.
    #[error("JSON parse error in {origin}: {source}")]
    Parse {
        origin: String,
        #[source]
        source: serde_json::Error,
    },

    /// The document does not conform to the mapping schema.
    #[error("Schema violation: {}", .errors.join("; "))]
    SchemaViolation { errors: Vec<String> },

    /// The mapping schema itself could not be compiled.
    #[error("Mapping schema is invalid: {0}")]
    SchemaCompile(String),

    /// A file could not be opened, read, written, copied or renamed.
    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A JSON Patch is malformed or references paths that do not exist.
    #[error("Patch application failed: {0}")]
    PatchApplication(String),

    /// The requested history snapshot does not exist.
    #[error("Version not found: {0}")]
    VersionNotFound(String),

    /// Deploy was requested but there is no draft to promote.
    #[error("No draft to deploy for {}", .0.display())]
    NoDraft(PathBuf),
}

impl MappingError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn parse(origin: impl Into<String>, source: serde_json::Error) -> Self {
        Self::Parse {
            origin: origin.into(),
            source,
        }
    }

    /// Stable machine-readable category used in API error bodies.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Parse { .. } => "parse_error",
            Self::SchemaViolation { .. } => "schema_violation",
            Self::SchemaCompile(_) => "schema_invalid",
            Self::Io { .. } => "io_error",
            Self::PatchApplication(_) => "patch_failed",
            Self::VersionNotFound(_) => "version_not_found",
            Self::NoDraft(_) => "no_draft",
        }
    }
}

/// Result type for mapping operations.
pub type MappingResult<T> = Result<T, MappingError>;
