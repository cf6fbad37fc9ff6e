//! Versioned, schema-gated mapping configuration store.

pub mod admin;
pub mod config;
pub mod http;
pub mod lifecycle;
pub mod mapping;
pub mod observability;

pub use admin::{setup_admin_router, AdminState, ReloadCallback};
pub use config::schema::ServiceConfig;
pub use http::AdminServer;
pub use lifecycle::{ReloadHub, Shutdown};
pub use mapping::{DraftManager, MappingError, MappingStore, SchemaValidator};
