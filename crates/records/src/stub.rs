//! Fixed in-memory record store.

use crate::client::{EmployeeRecord, RecordStore};
use async_trait::async_trait;
use copilot_common::{CopilotError, Result};
use std::collections::HashMap;
use tracing::debug;

/// Record store backed by a fixed set of records. Ids must be numeric.
#[derive(Debug, Clone, Default)]
pub struct StaticRecordStore {
    records: HashMap<String, EmployeeRecord>,
}

impl StaticRecordStore {
    pub fn new(records: impl IntoIterator<Item = EmployeeRecord>) -> Self {
        Self {
            records: records.into_iter().map(|r| (r.id.clone(), r)).collect(),
        }
    }

    /// The two records used for local development.
    pub fn with_sample_records() -> Self {
        Self::new([
            EmployeeRecord::new("12345")
                .with_name("John Doe")
                .with_title("Senior Software Engineer")
                .with_department("Azure Cloud Services")
                .with_tenure("5 years")
                .with_public_info("Published articles on cloud security."),
            EmployeeRecord::new("67890")
                .with_name("Jane Smith")
                .with_title("Product Manager")
                .with_department("Microsoft 365")
                .with_tenure("3 years")
                .with_public_info("Presented at several industry conferences on SaaS solutions."),
        ])
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }
}

#[async_trait]
impl RecordStore for StaticRecordStore {
    async fn lookup(&self, id: &str) -> Result<Option<EmployeeRecord>> {
        if id.is_empty() || !id.chars().all(|c| c.is_ascii_digit()) {
            return Err(CopilotError::Lookup(
                "Invalid record ID format - must be numeric".into(),
            ));
        }

        let record = self.records.get(id).cloned();
        debug!(record_id = %id, found = record.is_some(), "Static record lookup");
        Ok(record)
    }
}
