//! Binary blob store port.
//!
//! Uploads never go through blob storage (images are stored inline as data
//! URLs), so the only operation needed is delete-by-reference for objects
//! that were placed there by older versions of the site.

use std::collections::HashSet;
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use thiserror::Error;

/// Errors surfaced by blob store adapters.
#[derive(Debug, Error)]
pub enum BlobError {
    /// No object exists at the reference.
    #[error("blob not found: {0}")]
    NotFound(String),

    /// The backend failed or could not be reached.
    #[error("blob store error: {0}")]
    Backend(String),
}

/// Delete-only access to stored objects.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Delete the object at `reference` (a bucket-relative path).
    async fn delete(&self, reference: &str) -> Result<(), BlobError>;
}

/// Blob store held in memory.
#[derive(Debug, Default)]
pub struct InMemoryBlobStore {
    objects: Mutex<HashSet<String>>,
}

impl InMemoryBlobStore {
    /// Create an empty blob store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Place an object at `reference`.
    pub fn insert(&self, reference: &str) {
        self.objects
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(reference.to_owned());
    }

    /// Whether an object exists at `reference`.
    #[must_use]
    pub fn contains(&self, reference: &str) -> bool {
        self.objects
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(reference)
    }
}

#[async_trait]
impl BlobStore for InMemoryBlobStore {
    async fn delete(&self, reference: &str) -> Result<(), BlobError> {
        let removed = self
            .objects
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(reference);
        if removed {
            Ok(())
        } else {
            Err(BlobError::NotFound(reference.to_owned()))
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_delete_existing_then_missing() {
        let blobs = InMemoryBlobStore::new();
        blobs.insert("profile_images/u1/me.jpg");

        blobs.delete("profile_images/u1/me.jpg").await.unwrap();
        assert!(!blobs.contains("profile_images/u1/me.jpg"));
        assert!(matches!(
            blobs.delete("profile_images/u1/me.jpg").await,
            Err(BlobError::NotFound(_))
        ));
    }
}
