use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use content_feed::{ContentId, ContentItem, ContentType, SearchRequest};
use sqlx::PgPool;

use crate::common::ValidatedPageArgs;
use crate::domains::content::data::NewContentItem;

/// Upper bound on search results.
pub const SEARCH_LIMIT: i64 = 50;

/// Content item joined with its view counter.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ContentItemRow {
    pub id: ContentId,
    pub content_type: ContentType,
    pub slug: String,
    pub title: String,
    pub category: Option<String>,
    pub published_at: DateTime<Utc>,
    pub view_count: i64,
}

impl From<ContentItemRow> for ContentItem {
    fn from(row: ContentItemRow) -> Self {
        ContentItem {
            id: row.id,
            slug: row.slug,
            title: row.title,
            content_type: row.content_type,
            category: row.category,
            published_at: row.published_at,
            view_count: row.view_count.max(0) as u64,
        }
    }
}

// =============================================================================
// SQL Queries - ALL queries must be in models/
// =============================================================================

impl ContentItemRow {
    /// One page of a content type, newest first.
    ///
    /// `id` breaks ties between equal timestamps so pages never overlap.
    pub async fn find_page(
        content_type: ContentType,
        args: &ValidatedPageArgs,
        pool: &PgPool,
    ) -> Result<Vec<Self>> {
        let rows = sqlx::query_as::<_, Self>(
            r#"
            SELECT ci.id, ci.content_type, ci.slug, ci.title, ci.category, ci.published_at,
                   COALESCE(vc.count, 0) AS view_count
            FROM content_items ci
            LEFT JOIN view_counters vc ON vc.owner_id = ci.id
            WHERE ci.content_type = $1
            ORDER BY ci.published_at DESC, ci.id DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(content_type)
        .bind(args.limit())
        .bind(args.offset())
        .fetch_all(pool)
        .await?;
        Ok(rows)
    }

    pub async fn find_by_slug(
        content_type: ContentType,
        slug: &str,
        pool: &PgPool,
    ) -> Result<Option<Self>> {
        let row = sqlx::query_as::<_, Self>(
            r#"
            SELECT ci.id, ci.content_type, ci.slug, ci.title, ci.category, ci.published_at,
                   COALESCE(vc.count, 0) AS view_count
            FROM content_items ci
            LEFT JOIN view_counters vc ON vc.owner_id = ci.id
            WHERE ci.content_type = $1 AND ci.slug = $2
            "#,
        )
        .bind(content_type)
        .bind(slug)
        .fetch_optional(pool)
        .await?;
        Ok(row)
    }

    /// Title search with optional type and category constraints.
    ///
    /// Empty lists leave that dimension unconstrained.
    pub async fn search(request: &SearchRequest, pool: &PgPool) -> Result<Vec<Self>> {
        let content_types: Vec<String> = request
            .content_types
            .iter()
            .map(|content_type| content_type.as_str().to_string())
            .collect();
        let categories: Vec<String> = request.categories.iter().cloned().collect();

        let rows = sqlx::query_as::<_, Self>(
            r#"
            SELECT ci.id, ci.content_type, ci.slug, ci.title, ci.category, ci.published_at,
                   COALESCE(vc.count, 0) AS view_count
            FROM content_items ci
            LEFT JOIN view_counters vc ON vc.owner_id = ci.id
            WHERE ci.title ILIKE $1 ESCAPE '\'
              AND (cardinality($2::text[]) = 0 OR ci.content_type::text = ANY($2))
              AND (cardinality($3::text[]) = 0 OR ci.category = ANY($3))
            ORDER BY ci.published_at DESC, ci.id DESC
            LIMIT $4
            "#,
        )
        .bind(like_pattern(&request.query))
        .bind(&content_types)
        .bind(&categories)
        .bind(SEARCH_LIMIT)
        .fetch_all(pool)
        .await?;
        Ok(rows)
    }

    /// Insert an item together with its zeroed view counter.
    pub async fn create(
        content_type: ContentType,
        input: &NewContentItem,
        pool: &PgPool,
    ) -> Result<Self> {
        let mut tx = pool
            .begin()
            .await
            .context("Failed to start content transaction")?;

        let row = sqlx::query_as::<_, Self>(
            r#"
            INSERT INTO content_items (id, content_type, slug, title, category, published_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, content_type, slug, title, category, published_at, 0::bigint AS view_count
            "#,
        )
        .bind(ContentId::new())
        .bind(content_type)
        .bind(input.slug.trim())
        .bind(input.title.trim())
        .bind(&input.category)
        .bind(input.published_at.unwrap_or_else(Utc::now))
        .fetch_one(&mut *tx)
        .await
        .context("Failed to insert content item")?;

        sqlx::query("INSERT INTO view_counters (owner_id) VALUES ($1)")
            .bind(row.id)
            .execute(&mut *tx)
            .await
            .context("Failed to create view counter")?;

        tx.commit()
            .await
            .context("Failed to commit content item")?;
        Ok(row)
    }

    /// Delete an item; its counter goes with it.
    pub async fn delete(id: ContentId, pool: &PgPool) -> Result<bool> {
        let result = sqlx::query("DELETE FROM content_items WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

/// Case-insensitive substring pattern with LIKE wildcards escaped.
fn like_pattern(query: &str) -> String {
    let mut pattern = String::with_capacity(query.len() + 2);
    pattern.push('%');
    for ch in query.trim().chars() {
        if matches!(ch, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(ch);
    }
    pattern.push('%');
    pattern
}
