//! Test fixtures for creating test data.
//!
//! These fixtures use the model methods directly to create test data.

#![allow(dead_code)]

use anyhow::Result;
use chrono::{Duration, Utc};
use content_feed::{ContentItem, ContentType};
use server_core::domains::content::{ContentItemRow, NewContentItem};
use sqlx::PgPool;

/// Create one item with an explicit age in minutes (0 = newest).
pub async fn create_item(
    pool: &PgPool,
    content_type: ContentType,
    slug: &str,
    title: &str,
    category: Option<&str>,
    minutes_old: i64,
) -> Result<ContentItem> {
    let input = NewContentItem {
        slug: slug.to_string(),
        title: title.to_string(),
        category: category.map(str::to_string),
        published_at: Some(Utc::now() - Duration::minutes(minutes_old)),
    };
    let row = ContentItemRow::create(content_type, &input, pool).await?;
    Ok(row.into())
}

/// Seed `count` items of one type, slugs `{type}-{i}` with index 0 newest.
pub async fn seed_items(
    pool: &PgPool,
    content_type: ContentType,
    count: usize,
) -> Result<Vec<ContentItem>> {
    let mut created = Vec::with_capacity(count);
    for i in 0..count {
        let slug = format!("{}-{}", content_type, i);
        let title = format!("{} number {}", content_type, i);
        created.push(create_item(pool, content_type, &slug, &title, None, i as i64).await?);
    }
    Ok(created)
}

/// Set a counter directly, bypassing the increment path.
pub async fn set_view_count(pool: &PgPool, item: &ContentItem, count: i64) -> Result<()> {
    sqlx::query("UPDATE view_counters SET count = $2 WHERE owner_id = $1")
        .bind(item.id)
        .bind(count)
        .execute(pool)
        .await?;
    Ok(())
}
