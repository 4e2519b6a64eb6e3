use crate::domain::model::{BlobRef, CreateRecordRequest, CreatedRecord, PostRecord, Session};
use crate::domain::ports::{BlobStore, RecordStore};
use crate::utils::error::{ApiCall, BotError, Result, TransportError};
use async_trait::async_trait;
use reqwest::{Client, Response};
use std::time::Duration;

pub const DEFAULT_XRPC_BASE_URL: &str = "https://bsky.social/xrpc";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

/// Minimal XRPC client for the three PDS calls the bot makes.
#[derive(Debug, Clone)]
pub struct XrpcClient {
    base_url: String,
    client: Client,
}

/// Shared HTTP client; `timeout` bounds every call made through it.
pub fn http_client(timeout: Duration) -> Result<Client> {
    Client::builder()
        .timeout(timeout)
        .build()
        .map_err(client_build_error)
}

// No call has been made yet, so this is a setup problem, not a transport one.
fn client_build_error(e: reqwest::Error) -> BotError {
    BotError::ConfigError {
        message: format!("failed to build HTTP client: {}", e),
    }
}

impl XrpcClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        Ok(Self::with_client(base_url, http_client(timeout)?))
    }

    pub fn with_client(base_url: impl Into<String>, client: Client) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
        }
    }

    fn endpoint(&self, call: ApiCall) -> String {
        format!("{}/{}", self.base_url, call)
    }

    /// Log in with a handle (or email) and an app password.
    pub async fn create_session(&self, identifier: &str, password: &str) -> Result<Session> {
        let call = ApiCall::Login;
        tracing::debug!("Creating session for {}", identifier);
        let response = self
            .client
            .post(self.endpoint(call))
            .json(&serde_json::json!({
                "identifier": identifier,
                "password": password,
            }))
            .send()
            .await
            .map_err(|e| TransportError::network(call, e))?;

        let body = read_success_json(call, response).await?;
        let access_jwt = string_field(call, &body, "accessJwt")?;
        let did = string_field(call, &body, "did")?;
        tracing::info!("Logged in as {}", did);
        Ok(Session::new(access_jwt, did))
    }
}

#[async_trait]
impl BlobStore for XrpcClient {
    async fn upload_blob(&self, bytes: Vec<u8>, content_type: &str, session: &Session) -> Result<BlobRef> {
        let call = ApiCall::UploadBlob;
        let response = self
            .client
            .post(self.endpoint(call))
            .bearer_auth(&session.access_jwt)
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .body(bytes)
            .send()
            .await
            .map_err(|e| TransportError::network(call, e))?;

        let mut body = read_success_json(call, response).await?;
        let blob = body
            .get_mut("blob")
            .map(serde_json::Value::take)
            .and_then(BlobRef::from_value)
            .ok_or_else(|| TransportError::malformed(call, "blob"))?;
        Ok(blob)
    }
}

#[async_trait]
impl RecordStore for XrpcClient {
    async fn create_record(&self, collection: &str, record: &PostRecord, session: &Session) -> Result<CreatedRecord> {
        let call = ApiCall::CreateRecord;
        let request = CreateRecordRequest {
            repo: &session.did,
            collection,
            record,
        };
        let response = self
            .client
            .post(self.endpoint(call))
            .bearer_auth(&session.access_jwt)
            .json(&request)
            .send()
            .await
            .map_err(|e| TransportError::network(call, e))?;

        let body = read_success_json(call, response).await?;
        let uri = string_field(call, &body, "uri")?;
        let cid = body.get("cid").and_then(|v| v.as_str()).map(str::to_string);
        Ok(CreatedRecord { uri, cid })
    }
}

async fn read_success_json(call: ApiCall, response: Response) -> Result<serde_json::Value> {
    let status = response.status();
    tracing::debug!("{} response status: {}", call, status);

    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(TransportError::status(call, status.as_u16(), body).into());
    }

    let text = response
        .text()
        .await
        .map_err(|e| TransportError::network(call, e))?;
    serde_json::from_str(&text).map_err(|_| TransportError::malformed(call, "body").into())
}

fn string_field(call: ApiCall, body: &serde_json::Value, field: &str) -> Result<String> {
    body.get(field)
        .and_then(|v| v.as_str())
        .map(str::to_string)
        .ok_or_else(|| TransportError::malformed(call, field).into())
}
