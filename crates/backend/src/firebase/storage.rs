//! Cloud Storage object deletes.

use async_trait::async_trait;
use tracing::{info, instrument};

use super::{FirebaseClient, FirebaseError, check_status};
use crate::blob::{BlobError, BlobStore};

/// Storage REST base.
const STORAGE_ENDPOINT: &str = "https://firebasestorage.googleapis.com/v0/b";

/// [`BlobStore`] backed by Firebase Storage.
#[derive(Clone)]
pub struct FirebaseBlobStore {
    client: FirebaseClient,
}

impl FirebaseBlobStore {
    #[must_use]
    pub const fn new(client: FirebaseClient) -> Self {
        Self { client }
    }

    fn object_url(&self, path: &str) -> String {
        format!(
            "{STORAGE_ENDPOINT}/{}/o/{}",
            self.client.config().storage_bucket,
            urlencoding::encode(path)
        )
    }
}

/// Bucket-relative path of a reference.
///
/// Accepts a plain path or a download URL
/// (`https://firebasestorage.googleapis.com/v0/b/<bucket>/o/<encoded>?alt=media&token=...`).
fn object_path(reference: &str) -> Result<String, BlobError> {
    if !reference.starts_with("https://") {
        return Ok(reference.trim_start_matches('/').to_owned());
    }

    let encoded = reference
        .split_once("/o/")
        .map(|(_, rest)| rest.split(['?', '#']).next().unwrap_or(rest))
        .filter(|p| !p.is_empty())
        .ok_or_else(|| BlobError::Backend(format!("not a storage URL: {reference}")))?;
    urlencoding::decode(encoded)
        .map(std::borrow::Cow::into_owned)
        .map_err(|e| BlobError::Backend(format!("bad object path: {e}")))
}

#[async_trait]
impl BlobStore for FirebaseBlobStore {
    #[instrument(skip(self))]
    async fn delete(&self, reference: &str) -> Result<(), BlobError> {
        let path = object_path(reference)?;
        let request = self
            .client
            .authorize(self.client.http().delete(self.object_url(&path)))
            .await?;
        let response = request.send().await.map_err(FirebaseError::from)?;

        match check_status(response).await {
            Ok(_) => {
                info!(%path, "Storage object deleted");
                Ok(())
            }
            Err(e) if e.is_not_found() => Err(BlobError::NotFound(path)),
            Err(e) => Err(e.into()),
        }
    }
}
