//! Service configuration schema.
//!
//! This is the admin service's own TOML configuration, not the mapping
//! document it manages. All types derive Serde traits and default every
//! field so minimal files work.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Root configuration for the mapping admin service.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ServiceConfig {
    /// Mapping document location and history policy.
    pub mapping: MappingConfig,

    /// Admin HTTP listener and credentials.
    pub admin: AdminConfig,

    /// Logging and metrics settings.
    pub observability: ObservabilityConfig,

    /// External-edit watcher for the mapping file.
    pub watcher: WatcherConfig,
}

/// Mapping document settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct MappingConfig {
    /// Path of the active mapping document.
    pub path: PathBuf,

    /// Optional JSON Schema file replacing the built-in mapping schema.
    pub schema_path: Option<PathBuf>,

    /// Number of history snapshots kept after each deploy.
    pub history_limit: usize,
}

impl Default for MappingConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::new(),
            schema_path: None,
            history_limit: 50,
        }
    }
}

/// Admin API configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AdminConfig {
    /// Admin API bind address.
    pub bind_address: String,

    /// HTTP Basic user name.
    pub user: String,

    /// HTTP Basic password.
    pub password: String,

    /// Realm announced in `WWW-Authenticate`.
    pub realm: String,

    /// Per-request timeout in seconds.
    pub request_timeout_secs: u64,

    /// Maximum accepted request body size in bytes.
    pub max_body_bytes: usize,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1:8085".to_string(),
            // WARNING: placeholder credentials, override them in production.
            user: "admin".to_string(),
            password: "admin".to_string(),
            realm: "mqttsuite-admin".to_string(),
            request_timeout_secs: 30,
            max_body_bytes: 1024 * 1024,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Emit JSON log lines instead of the pretty format.
    pub json_logs: bool,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json_logs: false,
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9095".to_string(),
        }
    }
}

/// Mapping file watcher configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct WatcherConfig {
    /// Reload when the active mapping file is edited outside the admin API.
    pub enabled: bool,

    /// Poll interval for backends that fall back to polling.
    pub poll_interval_secs: u64,
}

impl Default for WatcherConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            poll_interval_secs: 2,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ServiceConfig::default();
        assert_eq!(config.admin.bind_address, "127.0.0.1:8085");
        assert_eq!(config.admin.realm, "mqttsuite-admin");
        assert_eq!(config.mapping.history_limit, 50);
        assert!(!config.watcher.enabled);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config: ServiceConfig = toml::from_str(
            r#"
            [mapping]
            path = "/etc/mqttsuite/mapping.json"

            [admin]
            password = "s3cret"
            "#,
        )
        .unwrap();
        assert_eq!(config.mapping.path, PathBuf::from("/etc/mqttsuite/mapping.json"));
        assert_eq!(config.admin.password, "s3cret");
        assert_eq!(config.admin.user, "admin");
        assert_eq!(config.observability.log_level, "info");
    }
}
