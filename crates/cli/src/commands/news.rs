//! News housekeeping commands.
//!
//! # Usage
//!
//! ```bash
//! skydeck news list --status published
//! skydeck news archive-oldest
//! ```

use skydeck_backend::AppState;
use skydeck_backend::services::MAX_PUBLISHED_NEWS;
use skydeck_core::NewsStatus;
use tracing::info;

use super::CommandError;

/// Print news updates, newest first.
///
/// # Errors
///
/// Returns an error if the news collection can't be read.
pub async fn list(state: &AppState, status: Option<NewsStatus>) -> Result<(), CommandError> {
    let news = state.news().list_news(status).await?;

    for item in &news {
        info!(
            "{} [{}] {} ({} views, {})",
            item.id,
            item.record.status,
            item.record.title,
            item.record.views,
            item.record.created_at.format("%Y-%m-%d")
        );
    }

    let published = news
        .iter()
        .filter(|n| n.record.status == NewsStatus::Published)
        .count();
    info!(
        "{} updates listed, {published}/{MAX_PUBLISHED_NEWS} published",
        news.len()
    );
    Ok(())
}

/// Archive the oldest published news update.
///
/// # Errors
///
/// Returns `NotFound` when nothing is published.
pub async fn archive_oldest(state: &AppState) -> Result<(), CommandError> {
    let archived = state.publication_gate().archive_oldest().await?;
    info!(
        "Archived \"{}\" ({})",
        archived.archived_title, archived.archived_id
    );
    Ok(())
}
