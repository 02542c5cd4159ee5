// Trait definitions for the collaborators the feed core talks to.
//
// These are INFRASTRUCTURE traits only - fetching, searching, counting.
// Loading policy, debouncing and retry budgets live in the components that
// hold an `Arc<dyn Base*>`.
//
// Naming convention: Base* for trait names (e.g., BaseContentSource)

use async_trait::async_trait;
use std::collections::BTreeSet;

use crate::error::Result;
use crate::types::{ContentId, ContentItem, ContentType, Page};

// =============================================================================
// Content Source Trait
// =============================================================================

#[async_trait]
pub trait BaseContentSource: Send + Sync {
    /// Fetch one page of a content type, newest first.
    ///
    /// Returns up to `page_size` items; fewer (including none) means the
    /// collection is exhausted.
    async fn fetch_page(&self, content_type: ContentType, page: u32, page_size: u32)
        -> Result<Page>;

    /// Resolve a single item by slug. `FeedError::NotFound` when absent.
    async fn fetch_by_slug(&self, content_type: ContentType, slug: &str) -> Result<ContentItem>;
}

// =============================================================================
// Search Source Trait
// =============================================================================

/// A fully merged search request.
///
/// Empty sets mean "no constraint on that dimension". Constraints on
/// different dimensions are combined with AND.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchRequest {
    pub query: String,
    pub content_types: BTreeSet<ContentType>,
    pub categories: BTreeSet<String>,
}

impl SearchRequest {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            ..Default::default()
        }
    }

    pub fn with_content_type(mut self, content_type: ContentType) -> Self {
        self.content_types.insert(content_type);
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.categories.insert(category.into());
        self
    }

    /// Whether an item satisfies the structured part of the request.
    pub fn matches_filters(&self, item: &ContentItem) -> bool {
        let type_ok =
            self.content_types.is_empty() || self.content_types.contains(&item.content_type);
        let category_ok = self.categories.is_empty()
            || item
                .category
                .as_ref()
                .is_some_and(|category| self.categories.contains(category));
        type_ok && category_ok
    }
}

#[async_trait]
pub trait BaseSearchSource: Send + Sync {
    /// Run a search, returning matches ordered by the backend's relevance.
    async fn search(&self, request: &SearchRequest) -> Result<Vec<ContentItem>>;
}

// =============================================================================
// View Tracking Traits
// =============================================================================

/// Consumer-facing "this item was viewed" call.
#[async_trait]
pub trait BaseViewTracker: Send + Sync {
    /// Record one view, returning the post-increment count.
    async fn increment_view(&self, content_type: ContentType, id: ContentId) -> Result<u64>;
}

/// Outcome of a single atomic increment attempt at the storage layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IncrementAttempt {
    /// The add committed; carries the new count.
    Applied(u64),
    /// Lost a race with a concurrent writer; nothing was written.
    Conflict,
    /// No counter exists for this owner.
    Missing,
}

/// Storage that owns the atomicity of the counter add.
///
/// Implementations must never split the add into a read and a later
/// write: either one conditional update statement or one compare-and-swap.
#[async_trait]
pub trait BaseViewStore: Send + Sync {
    /// One atomic add on the counter of `(content_type, owner_id)`.
    async fn try_increment(
        &self,
        content_type: ContentType,
        owner_id: ContentId,
    ) -> Result<IncrementAttempt>;

    /// Current committed count, `None` when the owner has no counter.
    async fn current(&self, content_type: ContentType, owner_id: ContentId) -> Result<Option<u64>>;
}
