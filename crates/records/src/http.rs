//! HTTP-backed record store.

use crate::client::{EmployeeRecord, RecordStore};
use async_trait::async_trait;
use copilot_common::{CopilotError, Result};
use reqwest::StatusCode;
use std::time::Duration;
use tracing::debug;

/// Fetches records with `GET {endpoint}/records/{id}`.
pub struct HttpRecordStore {
    endpoint: String,
    api_key: Option<String>,
    http_client: reqwest::Client,
}

impl HttpRecordStore {
    pub fn new(endpoint: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            api_key,
            http_client: reqwest::Client::new(),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Result<Self> {
        self.http_client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| CopilotError::Config(format!("Failed to build HTTP client: {e}")))?;
        Ok(self)
    }
}

fn classify_status(status: StatusCode, body: &str) -> CopilotError {
    if status.is_server_error()
        || status == StatusCode::TOO_MANY_REQUESTS
        || status == StatusCode::REQUEST_TIMEOUT
    {
        CopilotError::Transient(format!("Record store error {status}: {body}"))
    } else {
        CopilotError::Lookup(format!("Record store error {status}: {body}"))
    }
}

#[async_trait]
impl RecordStore for HttpRecordStore {
    async fn lookup(&self, id: &str) -> Result<Option<EmployeeRecord>> {
        let mut url = reqwest::Url::parse(&self.endpoint)
            .map_err(|e| CopilotError::Config(format!("Invalid record store endpoint: {e}")))?;
        url.path_segments_mut()
            .map_err(|_| CopilotError::Config("Record store endpoint cannot be a base".into()))?
            .pop_if_empty()
            .extend(["records", id]);

        let mut http_req = self.http_client.get(url);
        if let Some(ref key) = self.api_key {
            http_req = http_req.bearer_auth(key);
        }

        let response = http_req
            .send()
            .await
            .map_err(|e| CopilotError::Transient(format!("Record store request failed: {e}")))?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            debug!(record_id = %id, "Record not found");
            return Ok(None);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(classify_status(status, &body));
        }

        let mut record: EmployeeRecord = response.json().await.map_err(|e| {
            CopilotError::Lookup(format!("Failed to parse record store response: {e}"))
        })?;
        if record.id.is_empty() {
            record.id = id.to_string();
        }

        Ok(Some(record))
    }
}
