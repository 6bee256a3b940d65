//! Document store port.
//!
//! The managed database is a collection-scoped document store: every record
//! has a string key and a schemaless field map. [`DocumentStore`] is the raw
//! port; [`Records`] layers typed records over it so that field maps are
//! decoded and validated at this boundary and nowhere else.
//!
//! Queries are plain collection listings. Filtering and sorting happen on the
//! client, matching how the site has always read its data.

pub mod memory;
mod record;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

pub use memory::InMemoryStore;
pub use record::{Record, Records, Stored};

/// A document's field map.
pub type Fields = serde_json::Map<String, Value>;

/// A raw stored document.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    /// Document key, unique within its collection.
    pub id: String,
    /// Top-level fields.
    pub fields: Fields,
}

/// How [`DocumentStore::set`] treats an existing document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetMode {
    /// Replace the whole document.
    Overwrite,
    /// Replace only the given top-level fields, creating the document if needed.
    Merge,
}

/// Errors surfaced by document store adapters.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The document does not exist.
    #[error("{collection}/{id} not found")]
    NotFound { collection: String, id: String },

    /// A stored document could not be decoded into its record type,
    /// or a record could not be encoded into a field map.
    #[error("invalid record {collection}/{id}: {reason}")]
    InvalidRecord {
        collection: String,
        id: String,
        reason: String,
    },

    /// The backend refused the request (permissions, quota, bad request).
    #[error("store rejected request: {0}")]
    Rejected(String),

    /// The backend could not be reached.
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

impl StoreError {
    /// Helper for missing documents.
    pub fn not_found(collection: &str, id: &str) -> Self {
        Self::NotFound {
            collection: collection.to_owned(),
            id: id.to_owned(),
        }
    }
}

/// Collection-scoped create/read/update/delete/list operations.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Add a document under a generated key and return the key.
    async fn create(&self, collection: &str, fields: Fields) -> Result<String, StoreError>;

    /// Fetch a document, `None` if absent.
    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, StoreError>;

    /// Write a document under a known key.
    async fn set(
        &self,
        collection: &str,
        id: &str,
        fields: Fields,
        mode: SetMode,
    ) -> Result<(), StoreError>;

    /// Replace the given top-level fields of an existing document.
    ///
    /// Fails with [`StoreError::NotFound`] when the document is absent.
    async fn update(&self, collection: &str, id: &str, fields: Fields) -> Result<(), StoreError>;

    /// Delete a document. Deleting an absent document is not an error.
    async fn delete(&self, collection: &str, id: &str) -> Result<(), StoreError>;

    /// Every document in a collection, in no particular order.
    async fn list(&self, collection: &str) -> Result<Vec<Document>, StoreError>;
}
