//! Record store contract.

use async_trait::async_trait;
use copilot_common::Result;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Employee/account record as held by the CRM.
///
/// Every field except `id` may be missing upstream; normalization to the
/// `"unknown"` sentinel happens in the CRM info agent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmployeeRecord {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub department: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub tenure: Option<String>,
    /// Publicly available profile text (articles, talks, publications)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public_info: Option<String>,
    /// Areas of expertise when the CRM tracks them directly
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub expertise: Vec<String>,
}

impl EmployeeRecord {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Default::default()
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_department(mut self, department: impl Into<String>) -> Self {
        self.department = Some(department.into());
        self
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    pub fn with_tenure(mut self, tenure: impl Into<String>) -> Self {
        self.tenure = Some(tenure.into());
        self
    }

    pub fn with_public_info(mut self, info: impl Into<String>) -> Self {
        self.public_info = Some(info.into());
        self
    }

    pub fn with_expertise(mut self, expertise: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.expertise = expertise.into_iter().map(Into::into).collect();
        self
    }
}

/// Lookup of employee records by identifier.
///
/// `Ok(None)` means the store answered and has no such record. Failures are
/// `Transient` (store unreachable) or `Lookup` (store refused the request).
#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn lookup(&self, id: &str) -> Result<Option<EmployeeRecord>>;
}

#[async_trait]
impl<T: RecordStore + ?Sized> RecordStore for Arc<T> {
    async fn lookup(&self, id: &str) -> Result<Option<EmployeeRecord>> {
        (**self).lookup(id).await
    }
}
