//! In-memory remote client for integration tests.

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use async_trait::async_trait;
use forcelink_core::{DescribedField, ForceError, QueryPage, Record, RemoteClient, Result};
use serde_json::json;

/// Scripted client: returns queued pages in order and records every call.
#[derive(Default)]
pub struct MockClient {
    pages: Mutex<VecDeque<Result<QueryPage>>>,
    records: HashMap<(String, String), Record>,
    fields: HashMap<String, Vec<DescribedField>>,
    pub queries: Mutex<Vec<String>>,
    pub gets: Mutex<Vec<(String, String)>>,
}

impl MockClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_pages(pages: Vec<QueryPage>) -> Self {
        Self {
            pages: Mutex::new(pages.into_iter().map(Ok).collect()),
            ..Default::default()
        }
    }

    pub fn push_error(&self, message: &str) {
        self.pages
            .lock()
            .unwrap()
            .push_back(Err(ForceError::RemoteQuery(message.to_string())));
    }

    pub fn with_record(mut self, object_type: &str, id: &str, record: Record) -> Self {
        self.records
            .insert((object_type.to_string(), id.to_string()), record);
        self
    }

    pub fn with_fields(mut self, object_type: &str, fields: Vec<DescribedField>) -> Self {
        self.fields.insert(object_type.to_string(), fields);
        self
    }

    pub fn query_count(&self) -> usize {
        self.queries.lock().unwrap().len()
    }

    pub fn get_count(&self) -> usize {
        self.gets.lock().unwrap().len()
    }
}

#[async_trait]
impl RemoteClient for MockClient {
    async fn query(&self, query: &str) -> Result<QueryPage> {
        self.queries.lock().unwrap().push(query.to_string());
        self.pages
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(ForceError::RemoteQuery("no more scripted pages".to_string())))
    }

    async fn get(&self, object_type: &str, id: &str) -> Result<Option<Record>> {
        self.gets
            .lock()
            .unwrap()
            .push((object_type.to_string(), id.to_string()));
        Ok(self
            .records
            .get(&(object_type.to_string(), id.to_string()))
            .cloned())
    }

    async fn describe(&self, object_type: &str) -> Result<Vec<DescribedField>> {
        self.fields
            .get(object_type)
            .cloned()
            .ok_or_else(|| ForceError::RemoteQuery(format!("sObject type '{}' is not supported", object_type)))
    }
}

/// An Account record with the given id and name.
pub fn account(id: &str, name: &str) -> Record {
    json!({
        "attributes": {"type": "Account", "url": format!("/services/data/v58.0/sobjects/Account/{}", id)},
        "Id": id,
        "Name": name,
    })
    .as_object()
    .cloned()
    .unwrap()
}

/// `count` Account records numbered from `start`.
pub fn accounts(start: usize, count: usize) -> Vec<Record> {
    (start..start + count)
        .map(|i| account(&format!("001{:05}", i), &format!("Account {}", i)))
        .collect()
}

pub fn field(name: &str, field_type: &str) -> DescribedField {
    DescribedField {
        name: name.to_string(),
        field_type: field_type.to_string(),
        label: String::new(),
        filterable: true,
        sortable: true,
    }
}
