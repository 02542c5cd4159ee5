//! Content types shared by the loader, the aggregators and the server.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::error::FeedError;

// =============================================================================
// Content type
// =============================================================================

/// Kind of content the site publishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "content_type", rename_all = "lowercase")
)]
pub enum ContentType {
    Article,
    Book,
    Blog,
    Video,
    Playlist,
    Responsa,
    Term,
}

impl ContentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentType::Article => "article",
            ContentType::Book => "book",
            ContentType::Blog => "blog",
            ContentType::Video => "video",
            ContentType::Playlist => "playlist",
            ContentType::Responsa => "responsa",
            ContentType::Term => "term",
        }
    }

    pub fn variants() -> &'static [ContentType] {
        &[
            ContentType::Article,
            ContentType::Book,
            ContentType::Blog,
            ContentType::Video,
            ContentType::Playlist,
            ContentType::Responsa,
            ContentType::Term,
        ]
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ContentType {
    type Err = FeedError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "article" => Ok(ContentType::Article),
            "book" => Ok(ContentType::Book),
            "blog" => Ok(ContentType::Blog),
            "video" => Ok(ContentType::Video),
            "playlist" => Ok(ContentType::Playlist),
            "responsa" => Ok(ContentType::Responsa),
            "term" => Ok(ContentType::Term),
            _ => Err(FeedError::InvalidInput {
                reason: format!("unknown content type: {}", s),
            }),
        }
    }
}

// =============================================================================
// Content id
// =============================================================================

/// Opaque content item identifier (time-ordered UUID).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(feature = "postgres", sqlx(transparent))]
pub struct ContentId(Uuid);

impl ContentId {
    /// Creates a new V7 id.
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    pub fn parse(s: &str) -> Result<Self, uuid::Error> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

impl Default for ContentId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ContentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl From<Uuid> for ContentId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

// =============================================================================
// Content item
// =============================================================================

/// A published piece of content as the feed sees it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentItem {
    pub id: ContentId,
    pub slug: String,
    pub title: String,
    pub content_type: ContentType,
    #[serde(default)]
    pub category: Option<String>,
    pub published_at: DateTime<Utc>,
    #[serde(default)]
    pub view_count: u64,
}

impl ContentItem {
    /// Build an item published now with no views.
    pub fn new(content_type: ContentType, slug: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: ContentId::new(),
            slug: slug.into(),
            title: title.into(),
            content_type,
            category: None,
            published_at: Utc::now(),
            view_count: 0,
        }
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn with_published_at(mut self, published_at: DateTime<Utc>) -> Self {
        self.published_at = published_at;
        self
    }
}

/// One batch of a paginated collection.
///
/// `has_more_hint` is optimistic: a full batch claims more may exist even
/// when the collection ended exactly on the boundary. The next fetch then
/// comes back empty and the loader settles into `Exhausted`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page {
    pub items: Vec<ContentItem>,
    pub page_number: u32,
    pub page_size: u32,
    pub has_more_hint: bool,
}

impl Page {
    /// Wrap a fetched batch, deriving the hint from its length.
    pub fn from_batch(items: Vec<ContentItem>, page_number: u32, page_size: u32) -> Self {
        let has_more_hint = items.len() >= page_size as usize;
        Self {
            items,
            page_number,
            page_size,
            has_more_hint,
        }
    }

    pub fn empty(page_number: u32, page_size: u32) -> Self {
        Self {
            items: Vec::new(),
            page_number,
            page_size,
            has_more_hint: false,
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_type_parses_its_own_display() {
        for content_type in ContentType::variants() {
            let parsed: ContentType = content_type.to_string().parse().unwrap();
            assert_eq!(parsed, *content_type);
        }
    }

    #[test]
    fn unknown_content_type_is_rejected() {
        let err = "podcast".parse::<ContentType>().unwrap_err();
        assert!(matches!(err, FeedError::InvalidInput { .. }));
    }

    #[test]
    fn content_type_serializes_lowercase() {
        let json = serde_json::to_string(&ContentType::Responsa).unwrap();
        assert_eq!(json, "\"responsa\"");
    }

    #[test]
    fn full_batch_hints_more() {
        let items = (0..10)
            .map(|i| ContentItem::new(ContentType::Article, format!("a-{i}"), "t"))
            .collect();
        assert!(Page::from_batch(items, 1, 10).has_more_hint);
    }

    #[test]
    fn short_batch_hints_end() {
        let items = (0..7)
            .map(|i| ContentItem::new(ContentType::Article, format!("a-{i}"), "t"))
            .collect();
        let page = Page::from_batch(items, 3, 10);
        assert!(!page.has_more_hint);
        assert_eq!(page.len(), 7);
    }
}
