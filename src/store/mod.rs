// src/store/mod.rs
//! Document store boundary.
//!
//! The pipeline only needs four operations on a key-document store; anything
//! offering them (an in-memory map, a directory of JSON files, a hosted
//! document database) can sit behind [`DocumentStore`].

pub mod file;
pub mod memory;
pub mod repo;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::StoreError;

pub use file::JsonFileStore;
pub use memory::MemoryStore;
pub use repo::Repository;

pub type Document = Map<String, Value>;

#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn get_by_id(&self, collection: &str, id: &str) -> Result<Option<Document>, StoreError>;

    /// Create or replace the whole document.
    async fn upsert(&self, collection: &str, id: &str, fields: Document) -> Result<(), StoreError>;

    /// Equality match on a top-level field. Returns `(id, document)` pairs.
    async fn query_by_field(
        &self,
        collection: &str,
        field: &str,
        value: &Value,
    ) -> Result<Vec<(String, Document)>, StoreError>;

    /// Merge `fields` into an existing document. Missing document is an error.
    async fn update_fields(
        &self,
        collection: &str,
        id: &str,
        fields: Document,
    ) -> Result<(), StoreError>;
}

pub fn to_document<T: Serialize>(value: &T) -> Result<Document, StoreError> {
    match serde_json::to_value(value)? {
        Value::Object(map) => Ok(map),
        other => Err(StoreError::Backend(format!(
            "expected an object document, got {other}"
        ))),
    }
}

pub fn from_document<T: DeserializeOwned>(doc: Document) -> Result<T, StoreError> {
    Ok(serde_json::from_value(Value::Object(doc))?)
}

/// Shared by both bundled stores.
pub(crate) fn merge_fields(target: &mut Document, fields: Document) {
    for (k, v) in fields {
        target.insert(k, v);
    }
}

pub(crate) fn matches_field(doc: &Document, field: &str, value: &Value) -> bool {
    doc.get(field) == Some(value)
}
