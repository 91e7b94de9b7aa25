//! CRM info agent: resolves the record id into a normalized profile.

use crate::parse::clean_list;
use crate::traits::Agent;
use async_trait::async_trait;
use copilot_common::{AgentRole, AnalysisInput, CopilotError, CrmInfo, Result, or_unknown};
use copilot_records::{EmployeeRecord, RecordStore};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::debug;

pub struct CrmInfoAgent {
    store: Arc<dyn RecordStore>,
}

impl CrmInfoAgent {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }
}

/// Keywords in public profile text and the expertise they indicate.
const EXPERTISE_KEYWORDS: &[(&str, &str)] = &[
    ("cloud", "cloud"),
    ("security", "security"),
    ("saas", "SaaS solutions"),
    ("api", "API development"),
    ("data", "data platforms"),
    ("ai", "AI"),
];

/// Normalize a record, replacing absent or blank fields with the sentinel.
///
/// Expertise the CRM lists explicitly wins; otherwise it is inferred from
/// the public profile text, which also becomes the summary.
pub fn normalize(record: &EmployeeRecord) -> CrmInfo {
    let mut expertise = clean_list(record.expertise.clone());
    if expertise.is_empty() {
        expertise = infer_expertise(record.public_info.as_deref().unwrap_or_default());
    }

    CrmInfo {
        name: or_unknown(record.name.as_deref()),
        title: or_unknown(record.title.as_deref()),
        department: or_unknown(record.department.as_deref()),
        email: or_unknown(record.email.as_deref()),
        tenure: or_unknown(record.tenure.as_deref()),
        expertise,
        summary: or_unknown(record.public_info.as_deref()),
    }
}

fn infer_expertise(public_info: &str) -> Vec<String> {
    let words: HashSet<String> = public_info
        .split(|c: char| !c.is_alphanumeric())
        .map(str::to_lowercase)
        .collect();

    EXPERTISE_KEYWORDS
        .iter()
        .filter(|(keyword, _)| words.contains(*keyword))
        .map(|(_, topic)| topic.to_string())
        .collect()
}

#[async_trait]
impl Agent for CrmInfoAgent {
    type Output = CrmInfo;

    fn role(&self) -> AgentRole {
        AgentRole::CrmInfo
    }

    async fn execute(&self, input: &AnalysisInput) -> Result<CrmInfo> {
        if input.record_id.is_empty() {
            debug!(agent = %self.role(), "No record id, using defaults");
            return Ok(CrmInfo::default());
        }

        let record = self.store.lookup(&input.record_id).await.map_err(|e| match e {
            CopilotError::Lookup(_) => e,
            other => CopilotError::Lookup(other.to_string()),
        })?;

        match record {
            Some(record) => Ok(normalize(&record)),
            None => {
                debug!(agent = %self.role(), record_id = %input.record_id, "Record not found");
                Ok(CrmInfo::default())
            }
        }
    }
}
