use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{header, HeaderValue, Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde_json::json;

use crate::config::AdminConfig;

/// HTTP Basic credentials guarding every admin route.
#[derive(Debug, Clone)]
pub struct BasicAuth {
    user: String,
    password: String,
    realm: String,
}

impl BasicAuth {
    pub fn new(user: impl Into<String>, password: impl Into<String>, realm: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            password: password.into(),
            realm: realm.into(),
        }
    }

    pub fn from_config(config: &AdminConfig) -> Self {
        Self::new(&config.user, &config.password, &config.realm)
    }

    /// Check an `Authorization` header value.
    pub fn accepts(&self, header_value: &str) -> bool {
        let Some((scheme, encoded)) = header_value.split_once(' ') else {
            return false;
        };
        if !scheme.eq_ignore_ascii_case("Basic") {
            return false;
        }
        let Ok(decoded) = STANDARD.decode(encoded.trim()) else {
            return false;
        };
        let Ok(credentials) = String::from_utf8(decoded) else {
            return false;
        };
        match credentials.split_once(':') {
            Some((user, password)) => user == self.user && password == self.password,
            None => false,
        }
    }

    fn challenge(&self) -> Response {
        let mut response = (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "error": "Unauthorized", "code": "unauthorized" })),
        )
            .into_response();
        let realm = self.realm.replace('"', "'");
        if let Ok(value) = HeaderValue::from_str(&format!("Basic realm=\"{realm}\"")) {
            response.headers_mut().insert(header::WWW_AUTHENTICATE, value);
        }
        response
    }
}

pub async fn basic_auth_middleware(
    State(auth): State<Arc<BasicAuth>>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let authorized = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .is_some_and(|value| auth.accepts(value));

    if authorized {
        return next.run(request).await;
    }

    tracing::warn!(path = %request.uri().path(), "Rejected unauthenticated admin request");
    auth.challenge()
}
