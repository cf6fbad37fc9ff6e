//! Versioned, schema-gated mapping store.
//!
//! # Data Flow
//! ```text
//! mapping.json (active)
//!     → store.rs (parse → schema.rs validate + default patch → cache)
//!     → runtime consumers (read_active, never fails)
//!
//! Admin edits:
//!     PATCH → draft.rs (mapping.json.draft)
//!     deploy → deploy.rs (meta → backup → prune → rename → evict)
//!     history / rollback → history.rs (versions/mapping.json.<epoch>)
//! ```
//!
//! # Design Decisions
//! - Documents stay dynamic `serde_json::Value`s; the schema defines shape
//! - One mutex per path serializes cache fills with deploy and rollback
//! - Backup and prune are best-effort; only the promoting rename can fail a deploy

pub mod clock;
pub mod deploy;
pub mod draft;
pub mod error;
pub mod history;
pub mod paths;
pub mod schema;
pub mod store;

pub use clock::{Clock, SteppingClock, SystemClock};
pub use deploy::{DeployReport, DeployStep, StepRecord, StepStatus};
pub use draft::{DraftManager, DEFAULT_HISTORY_LIMIT};
pub use error::{MappingError, MappingResult};
pub use history::VersionEntry;
pub use paths::MappingPaths;
pub use schema::{DefaultPatch, SchemaReport, SchemaValidator};
pub use store::MappingStore;
