//! Remote client boundary consumed by the engine.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// A raw remote record: remote field name -> loosely typed value.
pub type Record = serde_json::Map<String, serde_json::Value>;

/// One page of a query result.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryPage {
    #[serde(default)]
    pub total_size: u64,
    pub done: bool,
    #[serde(default)]
    pub records: Vec<Record>,
    /// Opaque continuation handle, present only while `done` is false.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_records_url: Option<String>,
}

impl QueryPage {
    /// A final page carrying `records`.
    pub fn last(records: Vec<Record>) -> Self {
        Self {
            total_size: records.len() as u64,
            done: true,
            records,
            next_records_url: None,
        }
    }

    /// A non-final page pointing at `next`.
    pub fn more(records: Vec<Record>, next: impl Into<String>) -> Self {
        Self {
            total_size: records.len() as u64,
            done: false,
            records,
            next_records_url: Some(next.into()),
        }
    }
}

/// A field reported by remote metadata introspection.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DescribedField {
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: String,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub filterable: bool,
    #[serde(default)]
    pub sortable: bool,
}

/// Interface to the remote object API.
///
/// Implementations must be shareable across concurrent requests; every call
/// is independent and carries no per-request cursor state.
#[async_trait]
pub trait RemoteClient: Send + Sync {
    /// Run a query string, or fetch the page behind a continuation handle.
    async fn query(&self, query: &str) -> Result<QueryPage>;

    /// Fetch a single record by identifier. `Ok(None)` when it does not exist.
    async fn get(&self, object_type: &str, id: &str) -> Result<Option<Record>>;

    /// Introspect the fields of an object type.
    async fn describe(&self, object_type: &str) -> Result<Vec<DescribedField>>;
}
