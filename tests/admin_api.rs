//! End-to-end tests for the admin API over HTTP.

use reqwest::StatusCode;
use serde_json::{json, Value};

mod common;

use common::{TestServer, Workspace, CLOCK_START};

async fn start_with(active: Value) -> TestServer {
    let workspace = Workspace::new();
    workspace.write_active(&active);
    TestServer::start(workspace).await
}

#[tokio::test]
async fn test_patch_deploy_and_history() {
    let server = start_with(json!({"connection": {"keep_alive": 60}, "mapping": {}})).await;

    let res = server
        .patch("/config")
        .json(&json!([{"op": "replace", "path": "/connection/keep_alive", "value": 30}]))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["status"], "patched");

    // The draft is visible before deploy; the active file is untouched.
    let draft: Value = server.get("/config").send().await.unwrap().json().await.unwrap();
    assert_eq!(draft["connection"]["keep_alive"], 30);
    assert_eq!(server.workspace.read_active()["connection"]["keep_alive"], 60);

    let res = server.post("/config/deploy").send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["status"], "deploy-ack");
    assert_eq!(body["note"], "hot-reload triggered");
    assert_eq!(body["version"], CLOCK_START.to_string());
    assert_eq!(server.reload_count(), 1);
    assert!(!server.workspace.draft_path().exists());

    let config: Value = server.get("/config").send().await.unwrap().json().await.unwrap();
    assert_eq!(config["connection"]["keep_alive"], 30);
    assert_eq!(config["meta"]["version"], CLOCK_START.to_string());
    assert_eq!(config["meta"]["created"], "2023-11-14T22:13:20Z");

    let history: Vec<Value> = server
        .get("/config/history")
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0]["id"], CLOCK_START.to_string());
    assert_eq!(history[0]["comment"], "");

    let id = history[0]["id"].as_str().unwrap();
    let snapshot: Value = server
        .get(&format!("/config/history/{id}"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(snapshot["connection"], json!({"keep_alive": 60}));
}

#[tokio::test]
async fn test_top_level_field_survives_deploy() {
    let server = start_with(json!({"keep_alive": 60})).await;

    server
        .patch("/config")
        .json(&json!([{"op": "replace", "path": "/keep_alive", "value": 30}]))
        .send()
        .await
        .unwrap();
    let draft = common::read_json(&server.workspace.draft_path());
    assert_eq!(draft, json!({"keep_alive": 30}));

    server.post("/config/deploy").send().await.unwrap();

    let config: Value = server.get("/config").send().await.unwrap().json().await.unwrap();
    assert_eq!(config["keep_alive"], 30);
    assert!(config["meta"].is_object());

    let snapshot: Value = server
        .get(&format!("/config/history/{CLOCK_START}"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(snapshot, json!({"keep_alive": 60}));
}

#[tokio::test]
async fn test_active_applies_schema_defaults() {
    let server = start_with(json!({"connection": {"client_id": "bridge"}})).await;

    let active: Value = server
        .get("/config/active")
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(active["connection"]["client_id"], "bridge");
    assert_eq!(active["connection"]["keep_alive"], 60);
    assert_eq!(active["connection"]["clean_session"], true);
}

#[tokio::test]
async fn test_requests_without_credentials_are_rejected() {
    let server = start_with(json!({})).await;

    let res = server.client.get(server.url("/config")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    let challenge = res.headers()["www-authenticate"].to_str().unwrap().to_string();
    assert!(challenge.starts_with("Basic realm="));

    let res = server
        .client
        .get(server.url("/config"))
        .basic_auth("admin", Some("wrong"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_responses_carry_request_id() {
    let server = start_with(json!({})).await;

    let res = server
        .get("/schema")
        .header("x-request-id", "trace-42")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.headers()["x-request-id"], "trace-42");

    let res = server.get("/schema").send().await.unwrap();
    assert!(res.headers().contains_key("x-request-id"));
}

#[tokio::test]
async fn test_schema_route_returns_schema() {
    let server = start_with(json!({})).await;

    let schema: Value = server.get("/schema").send().await.unwrap().json().await.unwrap();
    assert!(schema["properties"]["connection"].is_object());
    assert!(schema["definitions"]["topic_level"].is_object());
}

#[tokio::test]
async fn test_patch_rejects_bad_bodies() {
    let server = start_with(json!({"connection": {}})).await;

    let res = server
        .patch("/config")
        .header("content-type", "application/json")
        .body("{not json")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], "Invalid JSON body");
    assert_eq!(body["code"], "invalid_json");

    let res = server
        .patch("/config")
        .json(&json!([{"op": "remove", "path": "/does/not/exist"}]))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["code"], "patch_failed");
    assert!(!server.workspace.draft_path().exists());
}

#[tokio::test]
async fn test_patch_without_loadable_document() {
    let server = TestServer::start(Workspace::new()).await;
    let patch = json!([{"op": "add", "path": "/mapping", "value": {}}]);

    let res = server.patch("/config").json(&patch).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["code"], "io_error");

    std::fs::write(&server.workspace.mapping_path, "{ not json").unwrap();
    let res = server.patch("/config").json(&patch).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["code"], "parse_error");
    assert!(!server.workspace.draft_path().exists());
}

#[tokio::test]
async fn test_deploy_without_draft_is_acknowledged() {
    let server = start_with(json!({})).await;

    let res = server.post("/config/deploy").send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["status"], "deploy-ack");
    assert_eq!(body["note"], "no draft to deploy");
    assert_eq!(server.reload_count(), 0);
    assert!(!server.workspace.versions_dir().exists());
}

#[tokio::test]
async fn test_validate() {
    let server = start_with(json!({})).await;

    let res = server
        .post("/config/validate")
        .json(&json!({"connection": {"keep_alive": 10}}))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body, json!({"valid": true}));

    let res = server
        .post("/config/validate")
        .json(&json!({"connection": {"keep_alive": "often"}}))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["valid"], false);
    assert_eq!(body["error"], "Validation failed");
    assert!(!body["errors"].as_array().unwrap().is_empty());

    let res = server
        .post("/config/validate")
        .body("][")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], "Validation exception");
}

#[tokio::test]
async fn test_rollback_request_errors() {
    let server = start_with(json!({})).await;

    let res = server.post("/config/rollback").json(&json!({})).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], "Missing version_id");

    let res = server
        .post("/config/rollback")
        .json(&json!({"version_id": 17}))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let res = server
        .post("/config/rollback")
        .json(&json!({"version_id": "123"}))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], "Rollback failed");
    assert_eq!(body["code"], "version_not_found");

    let res = server
        .post("/config/rollback")
        .json(&json!({"version_id": "../mapping.json"}))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(server.reload_count(), 0);
}

#[tokio::test]
async fn test_rollback_restores_snapshot() {
    let server = start_with(json!({"connection": {"client_id": "first"}})).await;

    server
        .patch("/config")
        .json(&json!([{"op": "replace", "path": "/connection/client_id", "value": "second"}]))
        .send()
        .await
        .unwrap();
    server.post("/config/deploy").send().await.unwrap();
    assert_eq!(server.workspace.read_active()["connection"]["client_id"], "second");

    // A pending draft is thrown away by the rollback.
    server
        .patch("/config")
        .json(&json!([{"op": "add", "path": "/connection/username", "value": "u"}]))
        .send()
        .await
        .unwrap();
    assert!(server.workspace.draft_path().exists());

    let res = server
        .post("/config/rollback")
        .json(&json!({"version_id": CLOCK_START.to_string()}))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["status"], "rolled_back");
    assert_eq!(body["version"], CLOCK_START.to_string());

    assert_eq!(server.workspace.read_active()["connection"]["client_id"], "first");
    assert!(!server.workspace.draft_path().exists());
    assert_eq!(server.reload_count(), 2);

    let active: Value = server
        .get("/config/active")
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(active["connection"]["client_id"], "first");
}

#[tokio::test]
async fn test_discard_draft() {
    let server = start_with(json!({"connection": {}})).await;

    server
        .patch("/config")
        .json(&json!([{"op": "add", "path": "/connection/client_id", "value": "x"}]))
        .send()
        .await
        .unwrap();

    let res = server.delete("/config/draft").send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body, json!({"status": "discarded", "existed": true}));

    let body: Value = server
        .delete("/config/draft")
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["existed"], false);

    let config: Value = server.get("/config").send().await.unwrap().json().await.unwrap();
    assert_eq!(config, json!({"connection": {}}));
}

#[tokio::test]
async fn test_unknown_history_entry_is_not_found() {
    let server = start_with(json!({})).await;

    let res = server.get("/config/history/42").send().await.unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["code"], "version_not_found");

    let history: Vec<Value> = server
        .get("/config/history")
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(history.is_empty());
}

#[tokio::test]
async fn test_get_config_without_active_file_fails() {
    let server = TestServer::start(Workspace::new()).await;

    let res = server.get("/config").send().await.unwrap();
    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], "Failed to load configuration");
    assert_eq!(body["code"], "io_error");
}

#[tokio::test]
async fn test_sdk_client_round_trip() {
    let server = start_with(json!({"connection": {"keep_alive": 60}})).await;
    let client = mapping_admin_client::AdminClient::new(
        &server.url(""),
        common::USER,
        common::PASSWORD,
    );

    let reply = client
        .patch(&json!([{"op": "replace", "path": "/connection/keep_alive", "value": 5}]))
        .await
        .unwrap();
    assert_eq!(reply.status, "patched");

    let reply = client.deploy().await.unwrap();
    assert_eq!(reply.version.as_deref(), Some(CLOCK_START.to_string().as_str()));

    let history = client.history().await.unwrap();
    assert_eq!(history.len(), 1);

    let invalid = client
        .validate(&json!({"connection": {"keep_alive": -1}}))
        .await
        .unwrap();
    assert!(!invalid.valid);

    let err = client.version("missing").await.unwrap_err();
    assert_eq!(err.status(), Some(StatusCode::NOT_FOUND));
}
