//! News update records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use skydeck_core::{NewsId, NewsStatus};

use crate::store::Record;

/// A news post in the `news_updates` collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewsUpdate {
    pub title: String,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video_url: Option<String>,
    pub category: String,
    #[serde(default)]
    pub featured: bool,
    #[serde(default)]
    pub status: NewsStatus,
    #[serde(default)]
    pub views: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Creation time under the key older site pages sort by.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
}

impl Record for NewsUpdate {
    const COLLECTION: &'static str = "news_updates";
    type Id = NewsId;
}

/// Partial update of a news post. Absent fields are left alone.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewsPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub featured: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<NewsStatus>,
}

impl NewsPatch {
    /// A patch that only changes the status.
    #[must_use]
    pub fn status(status: NewsStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }
}
