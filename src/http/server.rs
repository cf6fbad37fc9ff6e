//! Admin HTTP server.
//!
//! # Responsibilities
//! - Wrap the admin router with tracing, timeout, body limit, request ID
//! - Bind to a listener
//! - Stop accepting on shutdown and drain in-flight requests

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use tokio::net::TcpListener;
use tower_http::{limit::RequestBodyLimitLayer, timeout::TimeoutLayer, trace::TraceLayer};

use crate::admin::auth::BasicAuth;
use crate::admin::{setup_admin_router, AdminState};
use crate::config::AdminConfig;
use crate::http::request::{make_span, propagate_request_id_layer, set_request_id_layer};
use crate::lifecycle::Shutdown;

pub struct AdminServer {
    router: Router,
}

impl AdminServer {
    pub fn new(config: &AdminConfig, state: AdminState) -> Self {
        let router = Self::build_router(config, state);
        Self { router }
    }

    /// Build the full middleware stack around the admin routes.
    #[allow(deprecated)]
    pub fn build_router(config: &AdminConfig, state: AdminState) -> Router {
        setup_admin_router(state, BasicAuth::from_config(config))
            .layer(RequestBodyLimitLayer::new(config.max_body_bytes))
            .layer(TimeoutLayer::new(Duration::from_secs(
                config.request_timeout_secs,
            )))
            .layer(propagate_request_id_layer())
            .layer(TraceLayer::new_for_http().make_span_with(make_span))
            .layer(set_request_id_layer())
    }

    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Serve until `shutdown` is triggered.
    pub async fn run(self, listener: TcpListener, shutdown: Arc<Shutdown>) -> std::io::Result<()> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "Admin API listening");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                shutdown.wait().await;
                tracing::info!("Admin API draining");
            })
            .await?;

        tracing::info!("Admin API stopped");
        Ok(())
    }
}
