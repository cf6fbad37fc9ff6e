//! Service configuration.
//!
//! # Data Flow
//! ```text
//! admin.toml
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → ServiceConfig (validated, immutable)
//!
//! Mapping file edited on disk:
//!     watcher.rs detects change
//!     → ReloadHub reloads if the validated document differs
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; changes require a restart
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;
pub mod watcher;

pub use loader::{check, load_config, read_config, ConfigError};
pub use schema::{AdminConfig, MappingConfig, ObservabilityConfig, ServiceConfig, WatcherConfig};
