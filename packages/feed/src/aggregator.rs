//! First-page loading and the featured/remainder split.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::error::{FeedError, Result};
use crate::loader::BasePageFetcher;
use crate::traits::BaseContentSource;
use crate::types::{ContentId, ContentItem, ContentType, Page};

/// First page of a list surface, split for presentation.
///
/// The featured item is the newest one and is rendered large; the
/// remainder goes into the grid that the loader later extends.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FirstPage {
    pub featured: Option<ContentItem>,
    pub remainder: Vec<ContentItem>,
    pub has_more_hint: bool,
    pub page_size: u32,
}

impl FirstPage {
    /// Split a page-1 batch into featured + remainder.
    pub fn split(page: Page) -> Self {
        let Page {
            items,
            page_size,
            has_more_hint,
            ..
        } = page;
        let mut items = items.into_iter();
        let featured = items.next();
        Self {
            featured,
            remainder: items.collect(),
            has_more_hint,
            page_size,
        }
    }

    pub fn featured_id(&self) -> Option<ContentId> {
        self.featured.as_ref().map(|item| item.id)
    }

    /// Page view of the remainder, as the loader's initial page.
    pub fn remainder_page(&self) -> Page {
        Page {
            items: self.remainder.clone(),
            page_number: 1,
            page_size: self.page_size,
            has_more_hint: self.has_more_hint,
        }
    }
}

/// Produces pages of one content type from the content source.
#[derive(Clone)]
pub struct ContentAggregator {
    source: Arc<dyn BaseContentSource>,
}

impl ContentAggregator {
    pub fn new(source: Arc<dyn BaseContentSource>) -> Self {
        Self { source }
    }

    /// Fetch page 1 and apply the featured split.
    ///
    /// Source errors are returned unchanged; the caller owns retry policy.
    pub async fn first_page(&self, content_type: ContentType, page_size: u32) -> Result<FirstPage> {
        let page = self.page(content_type, 1, page_size).await?;
        tracing::debug!(
            content_type = %content_type,
            count = page.len(),
            has_more = page.has_more_hint,
            "Loaded first page"
        );
        Ok(FirstPage::split(page))
    }

    /// Fetch a later page. No featured split is applied here.
    pub async fn page(&self, content_type: ContentType, page: u32, page_size: u32) -> Result<Page> {
        if page == 0 || page_size == 0 {
            return Err(FeedError::InvalidInput {
                reason: format!("page {} / page_size {} must be >= 1", page, page_size),
            });
        }
        let fetched = self.source.fetch_page(content_type, page, page_size).await?;
        // Re-derive the hint so every source gets the same policy. A source
        // that served smaller pages than asked is judged by its own size.
        let served_size = match fetched.page_size {
            0 => page_size,
            served => served.min(page_size),
        };
        Ok(Page::from_batch(fetched.items, page, served_size))
    }

    pub async fn by_slug(&self, content_type: ContentType, slug: &str) -> Result<ContentItem> {
        self.source.fetch_by_slug(content_type, slug).await
    }

    /// Page fetcher for an infinite-scroll surface of this content type.
    pub fn feed(&self, content_type: ContentType, page_size: u32) -> ContentTypeFeed {
        ContentTypeFeed {
            aggregator: self.clone(),
            content_type,
            page_size,
        }
    }
}

/// Loader-facing fetcher bound to one content type and page size.
#[derive(Clone)]
pub struct ContentTypeFeed {
    aggregator: ContentAggregator,
    content_type: ContentType,
    page_size: u32,
}

#[async_trait]
impl BasePageFetcher for ContentTypeFeed {
    async fn fetch(&self, page: u32) -> Result<Page> {
        self.aggregator
            .page(self.content_type, page, self.page_size)
            .await
    }
}
