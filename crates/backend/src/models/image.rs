//! Inline image uploads.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use skydeck_core::ImageId;

use crate::store::Record;

/// An image stored inline as a data URL (`uploaded_images`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadedImage {
    pub file_name: String,
    pub file_size: u64,
    pub file_type: String,
    /// `data:<type>;base64,<payload>`
    pub base64_data: String,
    pub folder: String,
    pub uploaded_at: DateTime<Utc>,
    #[serde(default)]
    pub compressed: bool,
    #[serde(default)]
    pub compression_level: u8,
}

impl Record for UploadedImage {
    const COLLECTION: &'static str = "uploaded_images";
    type Id = ImageId;
}
