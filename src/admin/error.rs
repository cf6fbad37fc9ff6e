//! Admin API error responses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::mapping::MappingError;

/// An error reported to admin clients as `{error, code, details}`.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub error: &'static str,
    pub code: &'static str,
    pub details: Option<String>,
}

impl ApiError {
    pub fn new(status: StatusCode, error: &'static str, code: &'static str) -> Self {
        Self {
            status,
            error,
            code,
            details: None,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    /// A malformed request body.
    pub fn invalid_json(error: &'static str, source: &serde_json::Error) -> Self {
        Self::new(StatusCode::BAD_REQUEST, error, "invalid_json").with_details(source.to_string())
    }

    /// Map a store failure with the given status, keeping its category.
    pub fn mapping(status: StatusCode, error: &'static str, source: &MappingError) -> Self {
        Self::new(status, error, source.code()).with_details(source.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        tracing::debug!(status = %self.status, code = self.code, details = ?self.details, "{}", self.error);
        let body = match self.details {
            Some(details) => json!({ "error": self.error, "code": self.code, "details": details }),
            None => json!({ "error": self.error, "code": self.code }),
        };
        (self.status, Json(body)).into_response()
    }
}
