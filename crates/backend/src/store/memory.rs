//! In-process document store.
//!
//! Backs the test suites and local experiments. Collections can be switched
//! into a failing state to exercise external-service error paths.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use uuid::Uuid;

use super::{Document, DocumentStore, Fields, SetMode, StoreError};

#[derive(Default)]
struct Inner {
    collections: HashMap<String, BTreeMap<String, Fields>>,
    failing: HashSet<String>,
}

/// Document store held entirely in memory.
#[derive(Default)]
pub struct InMemoryStore {
    inner: Mutex<Inner>,
}

impl InMemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every operation on `collection` fail with `StoreError::Unavailable`.
    pub fn fail_collection(&self, collection: &str) {
        self.lock().failing.insert(collection.to_owned());
    }

    /// Undo [`fail_collection`](Self::fail_collection).
    pub fn restore_collection(&self, collection: &str) {
        self.lock().failing.remove(collection);
    }

    /// Number of documents currently in `collection`.
    #[must_use]
    pub fn count(&self, collection: &str) -> usize {
        self.lock().collections.get(collection).map_or(0, BTreeMap::len)
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn checked(&self, collection: &str) -> Result<MutexGuard<'_, Inner>, StoreError> {
        let inner = self.lock();
        if inner.failing.contains(collection) {
            return Err(StoreError::Unavailable(format!(
                "collection {collection} is offline"
            )));
        }
        Ok(inner)
    }
}

#[async_trait]
impl DocumentStore for InMemoryStore {
    async fn create(&self, collection: &str, fields: Fields) -> Result<String, StoreError> {
        let mut inner = self.checked(collection)?;
        let id = Uuid::new_v4().simple().to_string();
        inner
            .collections
            .entry(collection.to_owned())
            .or_default()
            .insert(id.clone(), fields);
        Ok(id)
    }

    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, StoreError> {
        let inner = self.checked(collection)?;
        Ok(inner
            .collections
            .get(collection)
            .and_then(|docs| docs.get(id))
            .map(|fields| Document {
                id: id.to_owned(),
                fields: fields.clone(),
            }))
    }

    async fn set(
        &self,
        collection: &str,
        id: &str,
        fields: Fields,
        mode: SetMode,
    ) -> Result<(), StoreError> {
        let mut inner = self.checked(collection)?;
        let docs = inner.collections.entry(collection.to_owned()).or_default();
        match mode {
            SetMode::Overwrite => {
                docs.insert(id.to_owned(), fields);
            }
            SetMode::Merge => {
                docs.entry(id.to_owned()).or_default().extend(fields);
            }
        }
        Ok(())
    }

    async fn update(&self, collection: &str, id: &str, fields: Fields) -> Result<(), StoreError> {
        let mut inner = self.checked(collection)?;
        let existing = inner
            .collections
            .get_mut(collection)
            .and_then(|docs| docs.get_mut(id))
            .ok_or_else(|| StoreError::not_found(collection, id))?;
        existing.extend(fields);
        Ok(())
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<(), StoreError> {
        let mut inner = self.checked(collection)?;
        if let Some(docs) = inner.collections.get_mut(collection) {
            docs.remove(id);
        }
        Ok(())
    }

    async fn list(&self, collection: &str) -> Result<Vec<Document>, StoreError> {
        let inner = self.checked(collection)?;
        Ok(inner
            .collections
            .get(collection)
            .map(|docs| {
                docs.iter()
                    .map(|(id, fields)| Document {
                        id: id.clone(),
                        fields: fields.clone(),
                    })
                    .collect()
            })
            .unwrap_or_default())
    }
}
