//! Startup orchestration.
//!
//! Subsystems are built in dependency order: schema, store, draft manager,
//! reload hub. Any failure here is fatal.

use std::sync::Arc;

use thiserror::Error;

use crate::config::schema::ServiceConfig;
use crate::mapping::{DraftManager, MappingError, MappingStore, SchemaValidator};
use crate::lifecycle::reload::ReloadHub;

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("Failed to load mapping schema: {0}")]
    Schema(#[source] MappingError),
}

/// Long-lived components shared by the admin API and mapping consumers.
pub struct Services {
    pub store: Arc<MappingStore>,
    pub drafts: Arc<DraftManager>,
    pub hub: Arc<ReloadHub>,
}

pub fn build_services(config: &ServiceConfig) -> Result<Services, StartupError> {
    let validator = match &config.mapping.schema_path {
        Some(path) => {
            tracing::info!(schema = %path.display(), "Using mapping schema override");
            SchemaValidator::from_file(path)
        }
        None => SchemaValidator::builtin(),
    }
    .map_err(StartupError::Schema)?;

    let store = Arc::new(MappingStore::new(validator));
    let drafts = Arc::new(
        DraftManager::new(store.clone()).with_history_limit(config.mapping.history_limit),
    );
    let hub = Arc::new(ReloadHub::new(store.clone(), &config.mapping.path));

    tracing::info!(
        mapping = %config.mapping.path.display(),
        history_limit = drafts.history_limit(),
        "Mapping services ready"
    );

    Ok(Services { store, drafts, hub })
}
