//! News updates shown on the home page.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use skydeck_core::{NewsId, NewsStatus};
use tracing::{info, instrument};

use super::publication::{ArchivedNews, PublicationGate};
use crate::error::{Result, ServiceError};
use crate::models::{NewsPatch, NewsUpdate, Touched};
use crate::store::{DocumentStore, Records, Stored};

/// Input for [`NewsService::add_news`].
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewsDraft {
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub video_url: Option<String>,
    pub category: String,
    #[serde(default)]
    pub featured: bool,
    /// Defaults to `draft`.
    #[serde(default)]
    pub status: Option<NewsStatus>,
}

#[derive(Serialize)]
struct ViewCount {
    views: u64,
}

/// News update management.
pub struct NewsService<'a> {
    news: Records<'a, NewsUpdate>,
    gate: PublicationGate<'a>,
}

impl<'a> NewsService<'a> {
    #[must_use]
    pub fn new(store: &'a dyn DocumentStore) -> Self {
        Self {
            news: Records::new(store),
            gate: PublicationGate::new(store),
        }
    }

    /// Create a news update.
    ///
    /// # Errors
    ///
    /// Returns `Validation` for blank fields and `Capacity` when publishing
    /// past the cap.
    #[instrument(skip(self, draft), fields(title = %draft.title))]
    pub async fn add_news(&self, draft: NewsDraft) -> Result<NewsId> {
        require_text("title", &draft.title)?;
        require_text("content", &draft.content)?;
        require_text("category", &draft.category)?;

        let status = draft.status.unwrap_or_default();
        self.gate.ensure_publishable(None, status).await?;

        let now = Utc::now();
        let id = self
            .news
            .create(&NewsUpdate {
                title: draft.title.trim().to_owned(),
                content: draft.content,
                image_url: draft.image_url.filter(|u| !u.is_empty()),
                video_url: draft.video_url.filter(|u| !u.is_empty()),
                category: draft.category,
                featured: draft.featured,
                status,
                views: 0,
                created_at: now,
                updated_at: now,
                timestamp: Some(now),
            })
            .await?;

        info!(news_id = %id, %status, "News update added");
        Ok(id)
    }

    /// News updates, newest first, optionally only those with `status`.
    ///
    /// # Errors
    ///
    /// Returns a store error if the collection can't be read.
    pub async fn list_news(
        &self,
        status: Option<NewsStatus>,
    ) -> Result<Vec<Stored<NewsUpdate>>> {
        let mut news: Vec<_> = self
            .news
            .list()
            .await?
            .into_iter()
            .filter(|n| status.is_none_or(|s| n.record.status == s))
            .collect();
        news.sort_by(|a, b| b.record.created_at.cmp(&a.record.created_at));
        Ok(news)
    }

    /// # Errors
    ///
    /// Returns a store error if the collection can't be read.
    pub async fn published_count(&self) -> Result<usize> {
        self.gate.published_count().await
    }

    /// Apply a partial update.
    ///
    /// Only a patch that moves the item into `published` is checked against
    /// the cap.
    ///
    /// # Errors
    ///
    /// Returns `NotFound`, `Capacity`, or a store error.
    #[instrument(skip(self, patch), fields(news_id = %id))]
    pub async fn update_news(&self, id: &NewsId, patch: &NewsPatch) -> Result<()> {
        if let Some(title) = &patch.title {
            require_text("title", title)?;
        }
        if let Some(status) = patch.status {
            self.gate.ensure_publishable(Some(id), status).await?;
        }
        self.news.update(id, &Touched::now(patch)).await?;
        Ok(())
    }

    /// # Errors
    ///
    /// Same as [`update_news`](Self::update_news).
    pub async fn update_news_status(&self, id: &NewsId, status: NewsStatus) -> Result<()> {
        self.update_news(id, &NewsPatch::status(status)).await
    }

    /// # Errors
    ///
    /// Returns `NotFound` when nothing is published.
    pub async fn archive_oldest_published(&self) -> Result<ArchivedNews> {
        self.gate.archive_oldest().await
    }

    /// # Errors
    ///
    /// Returns a store error if the delete fails.
    #[instrument(skip(self), fields(news_id = %id))]
    pub async fn delete_news(&self, id: &NewsId) -> Result<()> {
        self.news.delete(id).await?;
        info!("News update deleted");
        Ok(())
    }

    /// Bump the view counter and return the new count.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for an unknown id.
    pub async fn record_view(&self, id: &NewsId) -> Result<u64> {
        let current = self.news.require(id).await?;
        let views = current.record.views.saturating_add(1);
        self.news.update(id, &ViewCount { views }).await?;
        Ok(views)
    }
}

fn require_text(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(ServiceError::validation(format!("{field} is required")));
    }
    Ok(())
}
