//! Integration tests for the published-news cap.
//!
//! Run with: cargo test -p skydeck-integration-tests

#![allow(clippy::unwrap_used)]

use std::time::Duration;

use skydeck_backend::ServiceError;
use skydeck_backend::services::news::NewsDraft;
use skydeck_backend::services::{MAX_PUBLISHED_NEWS, PublishDecision};
use skydeck_core::{NewsId, NewsStatus};
use skydeck_integration_tests::TestContext;

fn draft(title: &str, status: NewsStatus) -> NewsDraft {
    NewsDraft {
        title: title.to_owned(),
        content: "Fresh from the deck".to_owned(),
        category: "announcement".to_owned(),
        status: Some(status),
        ..NewsDraft::default()
    }
}

/// Publish `count` items, oldest first.
async fn publish_many(ctx: &TestContext, count: usize) -> Vec<NewsId> {
    let mut ids = Vec::with_capacity(count);
    for n in 0..count {
        let id = ctx
            .state
            .news()
            .add_news(draft(&format!("Post {n}"), NewsStatus::Published))
            .await
            .expect("publish within cap");
        ids.push(id);
        // Keep createdAt strictly increasing.
        tokio::time::sleep(Duration::from_millis(2)).await;
    }
    ids
}

// ============================================================================
// Cap
// ============================================================================

#[tokio::test]
async fn test_eighth_publish_is_refused() {
    let ctx = TestContext::new();
    publish_many(&ctx, MAX_PUBLISHED_NEWS).await;

    let err = ctx
        .state
        .news()
        .add_news(draft("One too many", NewsStatus::Published))
        .await
        .expect_err("cap reached");
    assert!(matches!(err, ServiceError::Capacity(_)));

    // Drafts are never counted.
    ctx.state
        .news()
        .add_news(draft("Saved for later", NewsStatus::Draft))
        .await
        .expect("drafts are unlimited");

    assert_eq!(
        ctx.state.publication_gate().published_count().await.unwrap(),
        MAX_PUBLISHED_NEWS
    );
}

#[tokio::test]
async fn test_already_published_item_stays_allowed_at_cap() {
    let ctx = TestContext::new();
    let ids = publish_many(&ctx, MAX_PUBLISHED_NEWS).await;
    let gate = ctx.state.publication_gate();

    let decision = gate
        .request_publish(Some(&ids[3]), NewsStatus::Published)
        .await
        .unwrap();
    assert_eq!(decision, PublishDecision::Allow);

    let decision = gate.request_publish(None, NewsStatus::Published).await.unwrap();
    assert!(!decision.is_allowed());

    // Moving away from published is always allowed.
    ctx.state
        .news()
        .update_news_status(&ids[0], NewsStatus::Archived)
        .await
        .unwrap();
}

#[tokio::test]
async fn test_draft_save_of_new_item_allowed_at_cap() {
    let ctx = TestContext::new();
    publish_many(&ctx, MAX_PUBLISHED_NEWS).await;
    let eighth = ctx
        .state
        .news()
        .add_news(draft("Holiday menu", NewsStatus::Draft))
        .await
        .unwrap();
    let gate = ctx.state.publication_gate();

    let decision = gate
        .request_publish(Some(&eighth), NewsStatus::Draft)
        .await
        .unwrap();
    assert_eq!(decision, PublishDecision::Allow);

    let decision = gate
        .request_publish(Some(&eighth), NewsStatus::Published)
        .await
        .unwrap();
    assert!(!decision.is_allowed());
}

#[tokio::test]
async fn test_mixed_operations_never_exceed_cap() {
    let ctx = TestContext::new();
    let news = ctx.state.news();
    let gate = ctx.state.publication_gate();

    let mut ids = publish_many(&ctx, MAX_PUBLISHED_NEWS - 1).await;
    for n in 0..3 {
        ids.push(
            news.add_news(draft(&format!("Draft {n}"), NewsStatus::Draft))
                .await
                .unwrap(),
        );
    }

    for step in 0..24 {
        let id = ids[(step * 5) % ids.len()].clone();
        // Refusals at the cap are expected; only the count matters here.
        let _ = match step % 4 {
            0 => news.update_news_status(&id, NewsStatus::Published).await,
            1 => news
                .add_news(draft(&format!("Step {step}"), NewsStatus::Published))
                .await
                .map(|new_id| ids.push(new_id)),
            2 => gate.archive_oldest().await.map(|_| ()),
            _ => news.update_news_status(&id, NewsStatus::Draft).await,
        };
        assert!(gate.published_count().await.unwrap() <= MAX_PUBLISHED_NEWS);
    }
}

// ============================================================================
// Archiving
// ============================================================================

#[tokio::test]
async fn test_archive_oldest_frees_a_slot() {
    let ctx = TestContext::new();
    let ids = publish_many(&ctx, MAX_PUBLISHED_NEWS).await;

    let archived = ctx.state.publication_gate().archive_oldest().await.unwrap();
    assert_eq!(archived.archived_id, ids[0]);
    assert_eq!(archived.archived_title, "Post 0");

    let archived_list = ctx
        .state
        .news()
        .list_news(Some(NewsStatus::Archived))
        .await
        .unwrap();
    assert_eq!(archived_list.len(), 1);
    assert_eq!(archived_list[0].record.title, "Post 0");
    assert!(archived_list[0].record.updated_at > archived_list[0].record.created_at);

    ctx.state
        .news()
        .add_news(draft("Weekend hours", NewsStatus::Published))
        .await
        .expect("slot freed by archiving");
}

#[tokio::test]
async fn test_archive_oldest_with_nothing_published() {
    let ctx = TestContext::new();
    ctx.state
        .news()
        .add_news(draft("Draft only", NewsStatus::Draft))
        .await
        .unwrap();

    let err = ctx
        .state
        .publication_gate()
        .archive_oldest()
        .await
        .expect_err("nothing to archive");
    assert_eq!(err.kind(), skydeck_core::ErrorKind::NotFound);
}

#[tokio::test]
async fn test_unknown_item_publish_is_not_found() {
    let ctx = TestContext::new();
    let err = ctx
        .state
        .publication_gate()
        .request_publish(Some(&NewsId::new("missing")), NewsStatus::Published)
        .await
        .expect_err("unknown id");
    assert_eq!(err.kind(), skydeck_core::ErrorKind::NotFound);
}

#[tokio::test]
async fn test_repeated_archive_drains_published() {
    let ctx = TestContext::new();
    let ids = publish_many(&ctx, MAX_PUBLISHED_NEWS).await;
    let gate = ctx.state.publication_gate();

    for (n, id) in ids.iter().enumerate() {
        let archived = gate.archive_oldest().await.unwrap();
        assert_eq!(&archived.archived_id, id);
        assert_eq!(
            gate.published_count().await.unwrap(),
            MAX_PUBLISHED_NEWS - n - 1
        );
    }

    let err = gate.archive_oldest().await.expect_err("all archived");
    assert_eq!(err.kind(), skydeck_core::ErrorKind::NotFound);
}
