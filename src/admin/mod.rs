//! Admin API for the mapping document.
//!
//! Every route sits behind HTTP Basic authentication. Deploy and rollback
//! invoke the reload callback before responding.

pub mod auth;
pub mod error;
pub mod handlers;

use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    extract::{MatchedPath, Request},
    middleware::{self, Next},
    response::Response,
    routing::{delete, get, post},
    Router,
};

use self::auth::{basic_auth_middleware, BasicAuth};
use self::handlers::*;
use crate::mapping::DraftManager;
use crate::observability::metrics;

/// Hook run after a successful deploy or rollback.
pub type ReloadCallback = Arc<dyn Fn() + Send + Sync>;

/// State shared by admin handlers.
#[derive(Clone)]
pub struct AdminState {
    pub drafts: Arc<DraftManager>,
    pub mapping_path: Arc<PathBuf>,
    pub on_reload: Option<ReloadCallback>,
}

impl AdminState {
    pub fn new(drafts: Arc<DraftManager>, mapping_path: impl Into<PathBuf>) -> Self {
        Self {
            drafts,
            mapping_path: Arc::new(mapping_path.into()),
            on_reload: None,
        }
    }

    pub fn with_reload(mut self, callback: ReloadCallback) -> Self {
        self.on_reload = Some(callback);
        self
    }

    pub(crate) fn notify_reload(&self) {
        if let Some(callback) = &self.on_reload {
            callback();
        }
    }
}

pub fn setup_admin_router(state: AdminState, auth: BasicAuth) -> Router {
    Router::new()
        .route("/schema", get(get_schema))
        .route("/config", get(get_config).patch(patch_config))
        .route("/config/active", get(get_active))
        .route("/config/draft", delete(discard_draft))
        .route("/config/deploy", post(deploy))
        .route("/config/validate", post(validate))
        .route("/config/rollback", post(rollback))
        .route("/config/history", get(get_history))
        .route("/config/history/{id}", get(get_history_entry))
        .route_layer(middleware::from_fn(record_request))
        .layer(middleware::from_fn_with_state(
            Arc::new(auth),
            basic_auth_middleware,
        ))
        .with_state(state)
}

async fn record_request(request: Request, next: Next) -> Response {
    let route = request
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_owned())
        .unwrap_or_default();
    let response = next.run(request).await;
    metrics::record_admin_request(route, response.status().as_u16());
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapping::{MappingStore, SchemaValidator};
    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tower::ServiceExt;

    fn router(dir: &std::path::Path, reloads: Arc<AtomicUsize>) -> Router {
        let store = Arc::new(MappingStore::new(SchemaValidator::builtin().unwrap()));
        let state = AdminState::new(Arc::new(DraftManager::new(store)), dir.join("mapping.json"))
            .with_reload(Arc::new(move || {
                reloads.fetch_add(1, Ordering::SeqCst);
            }));
        setup_admin_router(state, BasicAuth::new("ops", "secret", "test"))
    }

    fn authorized(method: &str, uri: &str, body: &str) -> Request<Body> {
        // "ops:secret"
        Request::builder()
            .method(method)
            .uri(uri)
            .header(header::AUTHORIZATION, "Basic b3BzOnNlY3JldA==")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_unauthenticated_request_is_challenged() {
        let dir = tempfile::tempdir().unwrap();
        let app = router(dir.path(), Arc::new(AtomicUsize::new(0)));

        let request = Request::builder().uri("/schema").body(Body::empty()).unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            response.headers()[header::WWW_AUTHENTICATE],
            "Basic realm=\"test\""
        );
    }

    #[tokio::test]
    async fn test_deploy_invokes_reload_once() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("mapping.json"), "{}").unwrap();
        let reloads = Arc::new(AtomicUsize::new(0));
        let app = router(dir.path(), reloads.clone());

        let patch = r#"[{"op":"add","path":"/mapping","value":{}}]"#;
        let response = app
            .clone()
            .oneshot(authorized("PATCH", "/config", patch))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(reloads.load(Ordering::SeqCst), 0);

        let response = app
            .clone()
            .oneshot(authorized("POST", "/config/deploy", ""))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(reloads.load(Ordering::SeqCst), 1);

        // Nothing left to deploy.
        let response = app
            .oneshot(authorized("POST", "/config/deploy", ""))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(reloads.load(Ordering::SeqCst), 1);
    }
}
