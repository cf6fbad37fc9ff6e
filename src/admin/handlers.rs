use axum::{
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};

use crate::admin::error::ApiError;
use crate::admin::AdminState;
use crate::mapping::{MappingError, VersionEntry};

pub async fn get_schema(State(state): State<AdminState>) -> Json<Value> {
    Json(state.drafts.store().schema().clone())
}

/// The draft if one is pending, otherwise the raw active document.
pub async fn get_config(State(state): State<AdminState>) -> Result<Json<Value>, ApiError> {
    state
        .drafts
        .read_draft_or_active(&state.mapping_path)
        .map(Json)
        .map_err(|e| {
            ApiError::mapping(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to load configuration",
                &e,
            )
        })
}

/// The validated, default-patched document runtime consumers see.
pub async fn get_active(State(state): State<AdminState>) -> Json<Value> {
    let document = state.drafts.store().read_active(&state.mapping_path);
    Json(document.as_ref().clone())
}

pub async fn patch_config(
    State(state): State<AdminState>,
    body: Bytes,
) -> Result<Json<Value>, ApiError> {
    let patch: Value =
        serde_json::from_slice(&body).map_err(|e| ApiError::invalid_json("Invalid JSON body", &e))?;

    match state.drafts.patch_draft(&state.mapping_path, patch) {
        Ok(_) => Ok(Json(json!({
            "status": "patched",
            "path": state.mapping_path.display().to_string(),
        }))),
        Err(e @ MappingError::Parse { .. }) => Err(ApiError::mapping(
            StatusCode::BAD_REQUEST,
            "Current configuration is not valid JSON",
            &e,
        )),
        Err(e) => Err(ApiError::mapping(
            StatusCode::UNPROCESSABLE_ENTITY,
            "Patch application failed",
            &e,
        )),
    }
}

pub async fn discard_draft(State(state): State<AdminState>) -> Result<Json<Value>, ApiError> {
    let existed = state
        .drafts
        .discard_draft(&state.mapping_path)
        .map_err(|e| ApiError::mapping(StatusCode::INTERNAL_SERVER_ERROR, "Discard failed", &e))?;
    Ok(Json(json!({ "status": "discarded", "existed": existed })))
}

pub async fn deploy(State(state): State<AdminState>) -> Result<Json<Value>, ApiError> {
    match state.drafts.deploy_draft(&state.mapping_path) {
        Ok(report) => {
            state.notify_reload();
            Ok(Json(json!({
                "status": "deploy-ack",
                "note": "hot-reload triggered",
                "version": report.version,
                "backup": report.backup,
                "steps": report.steps,
            })))
        }
        Err(MappingError::NoDraft(_)) => Ok(Json(json!({
            "status": "deploy-ack",
            "note": "no draft to deploy",
        }))),
        Err(e) => Err(ApiError::mapping(
            StatusCode::INTERNAL_SERVER_ERROR,
            "Deploy failed",
            &e,
        )),
    }
}

pub async fn validate(State(state): State<AdminState>, body: Bytes) -> Result<Response, ApiError> {
    let document: Value = serde_json::from_slice(&body)
        .map_err(|e| ApiError::invalid_json("Validation exception", &e))?;

    let report = state.drafts.store().validator().check(&document);
    if report.valid {
        Ok((StatusCode::OK, Json(json!({ "valid": true }))).into_response())
    } else {
        Ok((
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(json!({
                "valid": false,
                "error": "Validation failed",
                "errors": report.errors,
            })),
        )
            .into_response())
    }
}

pub async fn rollback(State(state): State<AdminState>, body: Bytes) -> Result<Json<Value>, ApiError> {
    let request: Value =
        serde_json::from_slice(&body).map_err(|e| ApiError::invalid_json("Invalid JSON body", &e))?;

    let version_id = match request.get("version_id") {
        None | Some(Value::Null) => {
            return Err(ApiError::new(
                StatusCode::BAD_REQUEST,
                "Missing version_id",
                "missing_version_id",
            ))
        }
        Some(Value::String(id)) => id.clone(),
        Some(_) => {
            return Err(ApiError::new(
                StatusCode::BAD_REQUEST,
                "version_id must be a string",
                "invalid_version_id",
            ))
        }
    };

    state
        .drafts
        .rollback_to(&state.mapping_path, &version_id)
        .map_err(|e| ApiError::mapping(StatusCode::INTERNAL_SERVER_ERROR, "Rollback failed", &e))?;

    state.notify_reload();
    Ok(Json(json!({ "status": "rolled_back", "version": version_id })))
}

pub async fn get_history(State(state): State<AdminState>) -> Result<Json<Vec<VersionEntry>>, ApiError> {
    state.drafts.history(&state.mapping_path).map(Json).map_err(|e| {
        ApiError::mapping(
            StatusCode::INTERNAL_SERVER_ERROR,
            "Failed to fetch history",
            &e,
        )
    })
}

pub async fn get_history_entry(
    State(state): State<AdminState>,
    Path(version_id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    match state.drafts.read_version(&state.mapping_path, &version_id) {
        Ok(document) => Ok(Json(document)),
        Err(e @ MappingError::VersionNotFound(_)) => Err(ApiError::mapping(
            StatusCode::NOT_FOUND,
            "Version not found",
            &e,
        )),
        Err(e) => Err(ApiError::mapping(
            StatusCode::INTERNAL_SERVER_ERROR,
            "Failed to read version",
            &e,
        )),
    }
}
