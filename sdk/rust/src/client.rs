use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("admin API returned {status}: {body}")]
    Api { status: StatusCode, body: String },

    #[error("unexpected response body: {0}")]
    Decode(#[from] serde_json::Error),
}

impl ClientError {
    /// The HTTP status for API errors.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ClientError::Api { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// One snapshot in `GET /config/history`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub id: String,
    pub comment: String,
    pub date: String,
}

/// Acknowledgement returned by mutating routes.
///
/// Fields a route doesn't send are left empty.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StatusReply {
    pub status: String,
    #[serde(default)]
    pub note: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub backup: Option<String>,
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default)]
    pub existed: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationReply {
    pub valid: bool,
    #[serde(default)]
    pub errors: Vec<String>,
}

pub struct AdminClient {
    client: Client,
    base_url: String,
    user: String,
    password: String,
}

impl AdminClient {
    pub fn new(base_url: &str, user: &str, password: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            user: user.to_string(),
            password: password.to_string(),
        }
    }

    pub async fn schema(&self) -> Result<Value, ClientError> {
        self.send(self.client.get(self.url("/schema"))).await
    }

    /// The draft if one is pending, otherwise the active document.
    pub async fn config(&self) -> Result<Value, ClientError> {
        self.send(self.client.get(self.url("/config"))).await
    }

    pub async fn active(&self) -> Result<Value, ClientError> {
        self.send(self.client.get(self.url("/config/active"))).await
    }

    /// Apply an RFC 6902 patch to the draft.
    pub async fn patch(&self, patch: &Value) -> Result<StatusReply, ClientError> {
        self.send(self.client.patch(self.url("/config")).json(patch))
            .await
    }

    pub async fn deploy(&self) -> Result<StatusReply, ClientError> {
        self.send(self.client.post(self.url("/config/deploy"))).await
    }

    pub async fn discard(&self) -> Result<StatusReply, ClientError> {
        self.send(self.client.delete(self.url("/config/draft"))).await
    }

    /// Check a document against the schema. A failed check is a normal
    /// reply, not an error.
    pub async fn validate(&self, document: &Value) -> Result<ValidationReply, ClientError> {
        let response = self
            .authorized(self.client.post(self.url("/config/validate")).json(document))
            .send()
            .await?;
        let status = response.status();
        if status.is_success() || status == StatusCode::UNPROCESSABLE_ENTITY {
            let text = response.text().await?;
            return Ok(serde_json::from_str(&text)?);
        }
        Err(api_error(response).await)
    }

    pub async fn history(&self) -> Result<Vec<HistoryEntry>, ClientError> {
        self.send(self.client.get(self.url("/config/history"))).await
    }

    pub async fn version(&self, id: &str) -> Result<Value, ClientError> {
        let path = format!("/config/history/{id}");
        self.send(self.client.get(self.url(&path))).await
    }

    pub async fn rollback(&self, version_id: &str) -> Result<StatusReply, ClientError> {
        let body = json!({ "version_id": version_id });
        self.send(self.client.post(self.url("/config/rollback")).json(&body))
            .await
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request.basic_auth(&self.user, Some(&self.password))
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ClientError> {
        let response = self.authorized(request).send().await?;
        if !response.status().is_success() {
            return Err(api_error(response).await);
        }
        let text = response.text().await?;
        Ok(serde_json::from_str(&text)?)
    }
}

async fn api_error(response: Response) -> ClientError {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    ClientError::Api { status, body }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_trailing_slash() {
        let client = AdminClient::new("http://localhost:8085/", "admin", "admin");
        assert_eq!(client.url("/config"), "http://localhost:8085/config");
    }

    #[test]
    fn test_status_reply_tolerates_missing_fields() {
        let reply: StatusReply =
            serde_json::from_str(r#"{"status":"deploy-ack","note":"no draft to deploy"}"#).unwrap();
        assert_eq!(reply.status, "deploy-ack");
        assert_eq!(reply.note.as_deref(), Some("no draft to deploy"));
        assert!(reply.version.is_none());
    }

    #[test]
    fn test_validation_reply_defaults_errors() {
        let reply: ValidationReply = serde_json::from_str(r#"{"valid":true}"#).unwrap();
        assert!(reply.valid);
        assert!(reply.errors.is_empty());
    }
}
