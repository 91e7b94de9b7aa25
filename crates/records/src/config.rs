//! Record store configuration.

use crate::client::{EmployeeRecord, RecordStore};
use crate::http::HttpRecordStore;
use crate::stub::StaticRecordStore;
use copilot_common::Result;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordsConfig {
    /// CRM endpoint. Without one, lookups are served from `static_records`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,

    /// Falls back to CRM_API_KEY
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Records for the static store. Empty means the development samples.
    #[serde(default)]
    pub static_records: Vec<EmployeeRecord>,
}

fn default_timeout_ms() -> u64 {
    5_000
}

impl Default for RecordsConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            api_key: None,
            timeout_ms: default_timeout_ms(),
            static_records: Vec::new(),
        }
    }
}

impl RecordsConfig {
    pub fn resolve_api_key(&self) -> Option<String> {
        self.api_key
            .clone()
            .filter(|k| !k.is_empty())
            .or_else(|| std::env::var("CRM_API_KEY").ok())
    }
}

pub fn build_record_store(config: &RecordsConfig) -> Result<Arc<dyn RecordStore>> {
    if let Some(ref endpoint) = config.endpoint {
        info!(endpoint = %endpoint, "Using HTTP record store");
        let store = HttpRecordStore::new(endpoint.clone(), config.resolve_api_key())
            .with_timeout(Duration::from_millis(config.timeout_ms))?;
        return Ok(Arc::new(store));
    }

    let store = if config.static_records.is_empty() {
        StaticRecordStore::with_sample_records()
    } else {
        StaticRecordStore::new(config.static_records.clone())
    };
    info!(records = store.len(), "Using static record store");
    Ok(Arc::new(store))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn defaults_to_sample_records() {
        let config: RecordsConfig = toml::from_str("").unwrap();
        let store = build_record_store(&config).unwrap();
        assert!(store.lookup("12345").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn configured_static_records_replace_samples() {
        let config: RecordsConfig = toml::from_str(
            r#"
[[static_records]]
id = "42"
name = "Ada Lovelace"
email = "ada@example.com"
"#,
        )
        .unwrap();

        let store = build_record_store(&config).unwrap();
        let ada = store.lookup("42").await.unwrap().unwrap();
        assert_eq!(ada.email.as_deref(), Some("ada@example.com"));
        assert!(store.lookup("12345").await.unwrap().is_none());
    }
}
