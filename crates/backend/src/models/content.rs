//! Editable site copy and the shop's contact details.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use skydeck_core::{ContactInfoId, ContentId};

use crate::store::{Fields, Record};

/// A block of editable copy (`site_content`), keyed by `section`.
///
/// The body is free-form; each page section decides its own fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SiteContent {
    pub section: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(flatten)]
    pub body: Fields,
}

impl Record for SiteContent {
    const COLLECTION: &'static str = "site_content";
    type Id = ContentId;
}

/// Social links shown in the footer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SocialMedia {
    pub facebook: String,
    pub instagram: String,
    pub twitter: String,
}

/// The shop's contact details (`contact_info`, a single document).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ContactInfo {
    pub business_name: String,
    pub phone: String,
    pub email: String,
    pub website: String,
    pub address: String,
    pub opening_time: String,
    pub closing_time: String,
    pub description: String,
    pub social_media: SocialMedia,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Record for ContactInfo {
    const COLLECTION: &'static str = "contact_info";
    type Id = ContactInfoId;
}
