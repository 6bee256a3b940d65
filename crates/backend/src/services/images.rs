//! Image uploads.
//!
//! Images are stored inline in the document store as base64 data URLs, so a
//! whole encoded image has to fit in one document. Blob storage only holds
//! profile photos uploaded by earlier versions of the site.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use chrono::Utc;
use serde::Serialize;
use skydeck_core::{ImageId, Uid};
use tracing::{debug, info, instrument};

use crate::blob::BlobStore;
use crate::error::{Result, ServiceError};
use crate::models::{CustomerProfile, CustomerProfilePatch, Touched, UploadedImage};
use crate::store::{DocumentStore, Records};

/// Largest accepted decoded size of an encoded image, in bytes.
pub const MAX_INLINE_IMAGE_BYTES: usize = 900_000;

/// Folder for profile photos.
const PROFILE_FOLDER: &str = "profile_images";

/// An image file as received from the caller.
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub bytes: Vec<u8>,
    pub file_name: String,
    /// MIME type, must be `image/*`.
    pub content_type: String,
}

/// A stored image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoredImage {
    pub id: ImageId,
    /// Data URL, usable directly as an `src`.
    pub url: String,
}

/// Image storage and profile photos.
pub struct ImageService<'a> {
    images: Records<'a, UploadedImage>,
    customers: Records<'a, CustomerProfile>,
    blobs: &'a dyn BlobStore,
}

impl<'a> ImageService<'a> {
    #[must_use]
    pub fn new(store: &'a dyn DocumentStore, blobs: &'a dyn BlobStore) -> Self {
        Self {
            images: Records::new(store),
            customers: Records::new(store),
            blobs,
        }
    }

    /// Store an image as a data URL.
    ///
    /// # Errors
    ///
    /// Returns `Validation` for a non-image type, an empty file, or an image
    /// that is too large once encoded.
    #[instrument(
        skip(self, upload),
        fields(file_name = %upload.file_name, size = upload.bytes.len())
    )]
    pub async fn upload_image(&self, upload: &ImageUpload, folder: &str) -> Result<StoredImage> {
        let url = encode_data_url(upload)?;

        let id = self
            .images
            .create(&UploadedImage {
                file_name: upload.file_name.clone(),
                file_size: u64::try_from(upload.bytes.len()).unwrap_or(u64::MAX),
                file_type: upload.content_type.clone(),
                base64_data: url.clone(),
                folder: folder.to_owned(),
                uploaded_at: Utc::now(),
                compressed: false,
                compression_level: 0,
            })
            .await?;

        info!(image_id = %id, "Image stored");
        Ok(StoredImage { id, url })
    }

    /// Delete a previously returned image URL.
    ///
    /// Data URLs live inside the record that references them and need no
    /// deletion. Anything else is a blob store reference.
    ///
    /// # Errors
    ///
    /// Returns a blob store error if the delete fails.
    pub async fn delete_file(&self, url: &str) -> Result<()> {
        if url.starts_with("data:") {
            debug!("Inline image, nothing to delete");
            return Ok(());
        }
        self.blobs.delete(url).await?;
        Ok(())
    }

    /// Update a customer's profile fields and, optionally, their photo.
    ///
    /// Returns the new photo URL when an image was given.
    ///
    /// # Errors
    ///
    /// Returns `Validation` for a bad image, `NotFound` without a profile.
    #[instrument(skip(self, patch, image), fields(uid = %uid))]
    pub async fn update_profile_photo(
        &self,
        uid: &Uid,
        patch: CustomerProfilePatch,
        image: Option<&ImageUpload>,
    ) -> Result<Option<String>> {
        let mut patch = patch;
        let mut photo_url = None;
        if let Some(image) = image {
            let folder = format!("{PROFILE_FOLDER}/{uid}");
            let stored = self.upload_image(image, &folder).await?;
            patch.photo_url = Some(Some(stored.url.clone()));
            photo_url = Some(stored.url);
        }

        self.customers.update(uid, &Touched::now(&patch)).await?;
        Ok(photo_url)
    }

    /// Delete a profile photo from blob storage and clear it on the profile.
    ///
    /// # Errors
    ///
    /// Returns `Validation` for a bad file name, or the blob/store error.
    #[instrument(skip(self), fields(uid = %uid))]
    pub async fn delete_profile_image(&self, uid: &Uid, file_name: &str) -> Result<()> {
        if file_name.is_empty() || file_name.contains('/') {
            return Err(ServiceError::validation("invalid file name"));
        }

        self.blobs
            .delete(&format!("{PROFILE_FOLDER}/{uid}/{file_name}"))
            .await?;

        let patch = CustomerProfilePatch {
            photo_url: Some(None),
            ..CustomerProfilePatch::default()
        };
        self.customers.update(uid, &Touched::now(&patch)).await?;
        info!("Profile image deleted");
        Ok(())
    }
}

/// Encode an upload as `data:<type>;base64,<payload>`.
fn encode_data_url(upload: &ImageUpload) -> Result<String> {
    if !upload.content_type.starts_with("image/") {
        return Err(ServiceError::validation("only image files can be uploaded"));
    }
    if upload.bytes.is_empty() {
        return Err(ServiceError::validation("image file is empty"));
    }

    let url = format!(
        "data:{};base64,{}",
        upload.content_type,
        STANDARD.encode(&upload.bytes)
    );
    let approx_bytes = url.len() * 3 / 4;
    if approx_bytes >= MAX_INLINE_IMAGE_BYTES {
        return Err(ServiceError::validation(format!(
            "Image too large ({} KB). Please use a smaller image.",
            approx_bytes / 1024
        )));
    }
    Ok(url)
}
