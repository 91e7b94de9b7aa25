//! Employee record lookup for the CRM info agent.
//!
//! [`HttpRecordStore`] talks to a CRM service; [`StaticRecordStore`] serves a
//! fixed set of records for local runs and tests.

pub mod client;
pub mod config;
pub mod http;
pub mod stub;

pub use client::{EmployeeRecord, RecordStore};
pub use config::{RecordsConfig, build_record_store};
pub use http::HttpRecordStore;
pub use stub::StaticRecordStore;
