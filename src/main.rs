//! Mapping admin service.
//!
//! # Architecture Overview
//!
//! ```text
//!   admin client ──▶ http server ──▶ admin router (Basic auth)
//!                                        │
//!                                        ▼
//!                   ┌─────────────── DraftManager ───────────────┐
//!                   │ draft file │ deploy │ history │ rollback   │
//!                   └────────────────────┬───────────────────────┘
//!                                        ▼
//!                       MappingStore (validated cache, schema)
//!                                        │
//!          deploy / rollback / SIGHUP / file edit
//!                                        ▼
//!                       ReloadHub ──▶ mapping consumers
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tokio::net::TcpListener;
use tokio::sync::broadcast::error::RecvError;

use mapping_admin::admin::AdminState;
use mapping_admin::config::{check, read_config, watcher::MappingWatcher, ServiceConfig};
use mapping_admin::http::AdminServer;
use mapping_admin::lifecycle::{build_services, signals::handle_signals, ReloadHub, Shutdown};
use mapping_admin::observability::{logging, metrics};

#[derive(Parser)]
#[command(name = "mapping-admin")]
#[command(about = "Versioned mapping configuration store with an admin API", long_about = None)]
struct Args {
    /// Service configuration file (TOML). Defaults apply when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the active mapping file path.
    #[arg(short, long)]
    mapping_file: Option<PathBuf>,

    /// Override the admin listen address.
    #[arg(short, long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => read_config(path)?,
        None => ServiceConfig::default(),
    };
    if let Some(path) = args.mapping_file {
        config.mapping.path = path;
    }
    if let Some(bind) = args.bind {
        config.admin.bind_address = bind;
    }
    // Without a config file the mapping path must come from --mapping-file.
    check(&config)?;

    logging::init_logging(&config.observability)?;

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        mapping = %config.mapping.path.display(),
        bind_address = %config.admin.bind_address,
        "mapping-admin starting"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse::<SocketAddr>() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(e) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                error = %e,
                "Failed to parse metrics address"
            ),
        }
    }

    let services = build_services(&config)?;
    let shutdown = Arc::new(Shutdown::new());

    // Dropping the watcher stops it, so it lives until main returns.
    let _watcher = if config.watcher.enabled {
        let watcher = MappingWatcher::new(
            &config.mapping.path,
            Duration::from_secs(config.watcher.poll_interval_secs),
            services.hub.clone(),
        );
        match watcher.run() {
            Ok(w) => Some(w),
            Err(e) => {
                tracing::error!(error = %e, "Failed to start mapping watcher");
                None
            }
        }
    } else {
        None
    };

    tokio::spawn(log_reloads(services.hub.clone(), shutdown.clone()));

    let signal_hub = services.hub.clone();
    let signal_shutdown = shutdown.clone();
    tokio::spawn(async move {
        if let Err(e) = handle_signals(signal_hub, signal_shutdown.clone()).await {
            tracing::error!(error = %e, "Signal handler failed");
            signal_shutdown.trigger();
        }
    });

    let state = AdminState::new(services.drafts.clone(), config.mapping.path.clone())
        .with_reload(services.hub.admin_callback());
    let server = AdminServer::new(&config.admin, state);

    let listener = TcpListener::bind(&config.admin.bind_address).await?;
    server.run(listener, shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}

/// Stand-in mapping consumer: reports each reload until shutdown.
async fn log_reloads(hub: Arc<ReloadHub>, shutdown: Arc<Shutdown>) {
    let mut events = hub.subscribe();
    loop {
        tokio::select! {
            event = events.recv() => match event {
                Ok(event) => tracing::info!(
                    reason = ?event.reason,
                    generation = event.generation,
                    "Mapping reloaded"
                ),
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "Reload consumer lagged");
                }
                Err(RecvError::Closed) => return,
            },
            _ = shutdown.wait() => return,
        }
    }
}
