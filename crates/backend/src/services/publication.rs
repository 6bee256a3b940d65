//! Cap on concurrently published news updates.
//!
//! The count and the write that follows are two separate store calls, so the
//! cap holds for serialized callers only.

use serde::Serialize;
use skydeck_core::{NewsId, NewsStatus};
use tracing::{info, instrument};

use crate::error::{Result, ServiceError};
use crate::models::{NewsPatch, NewsUpdate, Touched};
use crate::store::{DocumentStore, Records};

/// Maximum number of news updates with status `published`.
pub const MAX_PUBLISHED_NEWS: usize = 7;

/// Answer to a publish request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PublishDecision {
    Allow,
    /// The cap is reached; carries a message for the editor.
    Deny(String),
}

impl PublishDecision {
    #[must_use]
    pub const fn is_allowed(&self) -> bool {
        matches!(self, Self::Allow)
    }
}

/// The news update that [`PublicationGate::archive_oldest`] archived.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ArchivedNews {
    pub archived_id: NewsId,
    pub archived_title: String,
}

/// Enforces [`MAX_PUBLISHED_NEWS`].
pub struct PublicationGate<'a> {
    news: Records<'a, NewsUpdate>,
}

impl<'a> PublicationGate<'a> {
    #[must_use]
    pub fn new(store: &'a dyn DocumentStore) -> Self {
        Self {
            news: Records::new(store),
        }
    }

    /// Number of news updates currently published.
    ///
    /// # Errors
    ///
    /// Returns a store error if the collection can't be read.
    pub async fn published_count(&self) -> Result<usize> {
        Ok(self
            .news
            .list()
            .await?
            .iter()
            .filter(|n| n.record.status == NewsStatus::Published)
            .count())
    }

    /// Decide whether `item` (or a new item, when `None`) may move to `target`.
    ///
    /// Only transitions into `published` are counted. An item that is already
    /// published stays allowed without counting.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for an unknown `item`, or a store error.
    #[instrument(skip(self))]
    pub async fn request_publish(
        &self,
        item: Option<&NewsId>,
        target: NewsStatus,
    ) -> Result<PublishDecision> {
        if target != NewsStatus::Published {
            return Ok(PublishDecision::Allow);
        }

        if let Some(id) = item {
            let current = self.news.require(id).await?;
            if current.record.status == NewsStatus::Published {
                return Ok(PublishDecision::Allow);
            }
        }

        let published = self.published_count().await?;
        if published >= MAX_PUBLISHED_NEWS {
            return Ok(PublishDecision::Deny(format!(
                "Maximum of {MAX_PUBLISHED_NEWS} published news posts allowed. \
                 Please archive some posts first or save as draft."
            )));
        }
        Ok(PublishDecision::Allow)
    }

    /// Like [`request_publish`](Self::request_publish), but a denial is a
    /// `Capacity` error.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Capacity` when the cap is reached.
    pub async fn ensure_publishable(
        &self,
        item: Option<&NewsId>,
        target: NewsStatus,
    ) -> Result<()> {
        match self.request_publish(item, target).await? {
            PublishDecision::Allow => Ok(()),
            PublishDecision::Deny(reason) => Err(ServiceError::Capacity(reason)),
        }
    }

    /// Archive the published item with the oldest `createdAt` (ties by id).
    ///
    /// Only the status and `updatedAt` of that item change.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` when nothing is published.
    #[instrument(skip(self))]
    pub async fn archive_oldest(&self) -> Result<ArchivedNews> {
        let oldest = self
            .news
            .list()
            .await?
            .into_iter()
            .filter(|n| n.record.status == NewsStatus::Published)
            .min_by(|a, b| {
                a.record
                    .created_at
                    .cmp(&b.record.created_at)
                    .then_with(|| a.id.cmp(&b.id))
            })
            .ok_or_else(|| ServiceError::not_found("No published news found to archive"))?;

        let patch = NewsPatch::status(NewsStatus::Archived);
        self.news.update(&oldest.id, &Touched::now(&patch)).await?;

        info!(
            news_id = %oldest.id,
            title = %oldest.record.title,
            "Archived oldest published news"
        );
        Ok(ArchivedNews {
            archived_id: oldest.id,
            archived_title: oldest.record.title,
        })
    }
}
