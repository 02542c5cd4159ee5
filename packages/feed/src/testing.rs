//! Testing utilities including mock collaborators.
//!
//! These let applications exercise loaders and aggregators without a
//! running content backend.

use async_trait::async_trait;
use chrono::{Duration as ChronoDuration, Utc};
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, RwLock};
use std::time::Duration;

use crate::error::{FeedError, Result};
use crate::loader::BasePageFetcher;
use crate::traits::{BaseContentSource, BaseSearchSource, SearchRequest};
use crate::types::{ContentItem, ContentType, Page};

/// Build `count` items of one type, newest first, slugged `{type}-{i}`.
pub fn items(content_type: ContentType, count: usize) -> Vec<ContentItem> {
    let now = Utc::now();
    (0..count)
        .map(|i| {
            ContentItem::new(content_type, format!("{}-{}", content_type, i), format!("{} #{}", content_type, i))
                .with_published_at(now - ChronoDuration::minutes(i as i64))
        })
        .collect()
}

/// Tracks concurrent calls and remembers the highest concurrency seen.
#[derive(Default)]
struct InFlight {
    current: AtomicUsize,
    max: AtomicUsize,
}

impl InFlight {
    fn enter(&self) -> InFlightGuard<'_> {
        let now = self.current.fetch_add(1, Ordering::SeqCst) + 1;
        self.max.fetch_max(now, Ordering::SeqCst);
        InFlightGuard(self)
    }
}

struct InFlightGuard<'a>(&'a InFlight);

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.current.fetch_sub(1, Ordering::SeqCst);
    }
}

// =============================================================================
// MockContentSource
// =============================================================================

#[derive(Default)]
struct ContentSourceInner {
    items: RwLock<HashMap<ContentType, Vec<ContentItem>>>,
    failing_pages: Mutex<HashSet<u32>>,
    calls: Mutex<Vec<u32>>,
    in_flight: InFlight,
}

/// In-memory content source slicing fixed collections into pages.
///
/// Cloning shares the underlying state so tests can keep a handle for
/// assertions after handing the source to an aggregator.
#[derive(Clone, Default)]
pub struct MockContentSource {
    inner: Arc<ContentSourceInner>,
    delay: Option<Duration>,
}

impl MockContentSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the collection for a content type (must already be newest first).
    pub fn with_items(self, content_type: ContentType, items: Vec<ContentItem>) -> Self {
        self.inner.items.write().unwrap().insert(content_type, items);
        self
    }

    /// Delay every fetch by `delay`.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Fail the next request for `page` with a transient error.
    pub fn failing_on_page(self, page: u32) -> Self {
        self.inner.failing_pages.lock().unwrap().insert(page);
        self
    }

    /// Pages requested so far, in request order.
    pub fn calls(&self) -> Vec<u32> {
        self.inner.calls.lock().unwrap().clone()
    }

    /// Highest number of concurrent `fetch_page` calls observed.
    pub fn max_in_flight(&self) -> usize {
        self.inner.in_flight.max.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl BaseContentSource for MockContentSource {
    async fn fetch_page(&self, content_type: ContentType, page: u32, page_size: u32) -> Result<Page> {
        let _guard = self.inner.in_flight.enter();
        self.inner.calls.lock().unwrap().push(page);

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        if self.inner.failing_pages.lock().unwrap().remove(&page) {
            return Err(FeedError::transient(format!("mock failure on page {}", page)));
        }

        let items = self.inner.items.read().unwrap();
        let collection = items.get(&content_type).map(Vec::as_slice).unwrap_or_default();
        let start = ((page.max(1) - 1) * page_size) as usize;
        let batch = collection
            .iter()
            .skip(start)
            .take(page_size as usize)
            .cloned()
            .collect();

        Ok(Page::from_batch(batch, page, page_size))
    }

    async fn fetch_by_slug(&self, content_type: ContentType, slug: &str) -> Result<ContentItem> {
        self.inner
            .items
            .read()
            .unwrap()
            .get(&content_type)
            .and_then(|items| items.iter().find(|item| item.slug == slug).cloned())
            .ok_or_else(|| FeedError::not_found(content_type, slug))
    }
}

// =============================================================================
// ScriptedFetcher
// =============================================================================

/// Page fetcher returning a fixed script of pages in order.
///
/// Once the script runs out every further fetch returns an empty page.
#[derive(Default)]
pub struct ScriptedFetcher {
    pages: Mutex<VecDeque<Page>>,
    calls: Mutex<Vec<u32>>,
}

impl ScriptedFetcher {
    pub fn new(pages: Vec<Page>) -> Self {
        Self {
            pages: Mutex::new(pages.into()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<u32> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl BasePageFetcher for ScriptedFetcher {
    async fn fetch(&self, page: u32) -> Result<Page> {
        self.calls.lock().unwrap().push(page);
        let next = self.pages.lock().unwrap().pop_front();
        Ok(next.unwrap_or_else(|| Page::empty(page, 1)))
    }
}

// =============================================================================
// MockSearchSource
// =============================================================================

#[derive(Default)]
struct SearchSourceInner {
    corpus: RwLock<Vec<ContentItem>>,
    latency: RwLock<Vec<(String, Duration)>>,
    failures: Mutex<usize>,
    requests: Mutex<Vec<SearchRequest>>,
}

/// Search source matching titles case-insensitively over a fixed corpus.
#[derive(Clone, Default)]
pub struct MockSearchSource {
    inner: Arc<SearchSourceInner>,
}

impl MockSearchSource {
    pub fn new(corpus: Vec<ContentItem>) -> Self {
        let source = Self::default();
        *source.inner.corpus.write().unwrap() = corpus;
        source
    }

    /// Delay requests whose query or categories mention `key`.
    pub fn with_latency(self, key: impl Into<String>, delay: Duration) -> Self {
        self.inner.latency.write().unwrap().push((key.into(), delay));
        self
    }

    /// Fail the next `count` searches.
    pub fn failing_next(self, count: usize) -> Self {
        *self.inner.failures.lock().unwrap() = count;
        self
    }

    /// Requests received so far, in arrival order.
    pub fn requests(&self) -> Vec<SearchRequest> {
        self.inner.requests.lock().unwrap().clone()
    }

    fn latency_for(&self, request: &SearchRequest) -> Option<Duration> {
        self.inner
            .latency
            .read()
            .unwrap()
            .iter()
            .find(|(key, _)| request.query == *key || request.categories.contains(key))
            .map(|(_, delay)| *delay)
    }
}

#[async_trait]
impl BaseSearchSource for MockSearchSource {
    async fn search(&self, request: &SearchRequest) -> Result<Vec<ContentItem>> {
        self.inner.requests.lock().unwrap().push(request.clone());

        if let Some(delay) = self.latency_for(request) {
            tokio::time::sleep(delay).await;
        }

        {
            let mut failures = self.inner.failures.lock().unwrap();
            if *failures > 0 {
                *failures -= 1;
                return Err(FeedError::transient("mock search failure"));
            }
        }

        let needle = request.query.trim().to_lowercase();
        Ok(self
            .inner
            .corpus
            .read()
            .unwrap()
            .iter()
            .filter(|item| needle.is_empty() || item.title.to_lowercase().contains(&needle))
            .filter(|item| request.matches_filters(item))
            .cloned()
            .collect())
    }
}
