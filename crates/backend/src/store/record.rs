//! Typed records over the raw document store.

use std::marker::PhantomData;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use super::{Document, DocumentStore, Fields, SetMode, StoreError};

/// A record type stored in one collection.
pub trait Record: Serialize + DeserializeOwned + Send + Sync {
    /// Collection name in the document store.
    const COLLECTION: &'static str;

    /// Typed document key.
    type Id: From<String> + AsRef<str> + Clone + Ord + Send + Sync;
}

/// A decoded record together with its key.
#[derive(Debug, Clone, PartialEq)]
pub struct Stored<R: Record> {
    pub id: R::Id,
    pub record: R,
}

/// Typed access to one collection.
pub struct Records<'a, R> {
    store: &'a dyn DocumentStore,
    _record: PhantomData<fn() -> R>,
}

impl<'a, R: Record> Records<'a, R> {
    /// Create a typed view over a store.
    #[must_use]
    pub fn new(store: &'a dyn DocumentStore) -> Self {
        Self {
            store,
            _record: PhantomData,
        }
    }

    /// Fetch a record, `None` if absent.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::InvalidRecord` if the stored fields don't decode.
    pub async fn get(&self, id: &R::Id) -> Result<Option<Stored<R>>, StoreError> {
        self.store
            .get(R::COLLECTION, id.as_ref())
            .await?
            .map(decode)
            .transpose()
    }

    /// Fetch a record that must exist.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` if the record is absent.
    pub async fn require(&self, id: &R::Id) -> Result<Stored<R>, StoreError> {
        self.get(id)
            .await?
            .ok_or_else(|| StoreError::not_found(R::COLLECTION, id.as_ref()))
    }

    /// Every record in the collection, ordered by key.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::InvalidRecord` if any stored document doesn't decode.
    pub async fn list(&self) -> Result<Vec<Stored<R>>, StoreError> {
        let mut records: Vec<Stored<R>> = self
            .store
            .list(R::COLLECTION)
            .await?
            .into_iter()
            .map(decode::<R>)
            .collect::<Result<_, _>>()?;
        records.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(records)
    }

    /// Add a record under a generated key.
    ///
    /// # Errors
    ///
    /// Returns a `StoreError` if encoding or the write fails.
    pub async fn create(&self, record: &R) -> Result<R::Id, StoreError> {
        let fields = encode(R::COLLECTION, "<new>", record)?;
        let id = self.store.create(R::COLLECTION, fields).await?;
        Ok(R::Id::from(id))
    }

    /// Write a whole record under a known key.
    ///
    /// # Errors
    ///
    /// Returns a `StoreError` if encoding or the write fails.
    pub async fn put(&self, id: &R::Id, record: &R) -> Result<(), StoreError> {
        let fields = encode(R::COLLECTION, id.as_ref(), record)?;
        self.store
            .set(R::COLLECTION, id.as_ref(), fields, SetMode::Overwrite)
            .await
    }

    /// Merge a partial record, creating the document if needed.
    ///
    /// # Errors
    ///
    /// Returns a `StoreError` if encoding or the write fails.
    pub async fn merge<P: Serialize + Sync>(&self, id: &R::Id, patch: &P) -> Result<(), StoreError> {
        let fields = encode(R::COLLECTION, id.as_ref(), patch)?;
        self.store
            .set(R::COLLECTION, id.as_ref(), fields, SetMode::Merge)
            .await
    }

    /// Apply a partial record to an existing document.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` if the document is absent.
    pub async fn update<P: Serialize + Sync>(
        &self,
        id: &R::Id,
        patch: &P,
    ) -> Result<(), StoreError> {
        let fields = encode(R::COLLECTION, id.as_ref(), patch)?;
        self.store.update(R::COLLECTION, id.as_ref(), fields).await
    }

    /// Delete a record.
    ///
    /// # Errors
    ///
    /// Returns a `StoreError` if the delete fails.
    pub async fn delete(&self, id: &R::Id) -> Result<(), StoreError> {
        self.store.delete(R::COLLECTION, id.as_ref()).await
    }
}

fn decode<R: Record>(doc: Document) -> Result<Stored<R>, StoreError> {
    let record = serde_json::from_value(Value::Object(doc.fields)).map_err(|e| {
        StoreError::InvalidRecord {
            collection: R::COLLECTION.to_owned(),
            id: doc.id.clone(),
            reason: e.to_string(),
        }
    })?;

    Ok(Stored {
        id: R::Id::from(doc.id),
        record,
    })
}

fn encode<T: Serialize + ?Sized>(collection: &str, id: &str, value: &T) -> Result<Fields, StoreError> {
    let invalid = |reason: String| StoreError::InvalidRecord {
        collection: collection.to_owned(),
        id: id.to_owned(),
        reason,
    };

    match serde_json::to_value(value).map_err(|e| invalid(e.to_string()))? {
        Value::Object(fields) => Ok(fields),
        other => Err(invalid(format!("expected an object, got {other}"))),
    }
}
