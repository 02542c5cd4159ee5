//! Search box + filter bar aggregation.
//!
//! Free-text edits are debounced; filter changes commit at once using the
//! last debounced text. Every commit gets a sequence number and only the
//! newest one may publish results, so a slow response for an old query can
//! never overwrite a newer one.

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::error::{FeedError, Result};
use crate::traits::{BaseSearchSource, SearchRequest};
use crate::types::{ContentItem, ContentType};

/// Quiet period before a text edit turns into a query.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(300);

#[derive(Debug, Clone)]
pub struct SearchConfig {
    pub debounce: Duration,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            debounce: DEFAULT_DEBOUNCE,
        }
    }
}

/// Structured filter dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FilterKey {
    Category,
    ContentType,
}

impl fmt::Display for FilterKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilterKey::Category => write!(f, "category"),
            FilterKey::ContentType => write!(f, "content_type"),
        }
    }
}

impl std::str::FromStr for FilterKey {
    type Err = FeedError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "category" => Ok(FilterKey::Category),
            "content_type" | "type" => Ok(FilterKey::ContentType),
            _ => Err(FeedError::InvalidInput {
                reason: format!("unknown filter: {}", s),
            }),
        }
    }
}

/// Text, filters and last committed results of one search surface.
#[derive(Debug, Clone, Default)]
pub struct SearchState {
    pub raw_query: String,
    pub debounced_query: String,
    pub filters: HashMap<FilterKey, String>,
    pub results: Vec<ContentItem>,
    /// Sequence number of the query `results` came from (0 = none yet).
    pub committed_seq: u64,
}

impl SearchState {
    /// Merge text and filters into one request. Absent keys add no constraint.
    fn request(&self) -> Result<SearchRequest> {
        let mut request = SearchRequest::new(self.debounced_query.trim());
        for (key, value) in &self.filters {
            match key {
                FilterKey::Category => {
                    request.categories.insert(value.clone());
                }
                FilterKey::ContentType => {
                    request.content_types.insert(value.parse::<ContentType>()?);
                }
            }
        }
        Ok(request)
    }
}

/// What listeners see after each committed query.
#[derive(Debug, Clone, PartialEq)]
pub enum SearchOutcome {
    Idle,
    Results { seq: u64, items: Vec<ContentItem> },
    /// Search failed; the surface should offer a retry control.
    Failed { seq: u64, error: String },
}

struct SearchInner {
    source: Arc<dyn BaseSearchSource>,
    config: SearchConfig,
    state: Mutex<SearchState>,
    issued: AtomicU64,
    pending: std::sync::Mutex<Option<JoinHandle<()>>>,
    outcome: watch::Sender<SearchOutcome>,
    cancel: CancellationToken,
}

/// Debounced search aggregator. Cheap to clone; clones share state.
#[derive(Clone)]
pub struct SearchAggregator {
    inner: Arc<SearchInner>,
}

impl SearchAggregator {
    pub fn new(source: Arc<dyn BaseSearchSource>, config: SearchConfig) -> Self {
        let (outcome, _) = watch::channel(SearchOutcome::Idle);
        Self {
            inner: Arc::new(SearchInner {
                source,
                config,
                state: Mutex::new(SearchState::default()),
                issued: AtomicU64::new(0),
                pending: std::sync::Mutex::new(None),
                outcome,
                cancel: CancellationToken::new(),
            }),
        }
    }

    /// Listen for committed results.
    pub fn subscribe(&self) -> watch::Receiver<SearchOutcome> {
        self.inner.outcome.subscribe()
    }

    pub async fn state(&self) -> SearchState {
        self.inner.state.lock().await.clone()
    }

    /// Text edit: reschedule the debounced commit.
    pub async fn on_query_change(&self, text: impl Into<String>) {
        if self.is_disposed() {
            return;
        }
        let text = text.into();
        self.inner.state.lock().await.raw_query = text;

        let debounce = self.inner.config.debounce;
        let this = self.clone();
        let timer = tokio::spawn(async move {
            tokio::time::sleep(debounce).await;
            this.commit_text().await;
        });

        let mut pending = self.lock_pending();
        if let Some(previous) = pending.replace(timer) {
            previous.abort();
        }
    }

    /// Filter change: commit immediately with the current debounced text.
    ///
    /// An empty value removes the filter. A `ContentType` value must name a
    /// known content type; invalid values leave the filters untouched.
    pub async fn on_filter_change(&self, key: FilterKey, value: impl Into<String>) -> Result<()> {
        if self.is_disposed() {
            return Ok(());
        }
        let value = value.into().trim().to_string();
        if key == FilterKey::ContentType && !value.is_empty() {
            value.parse::<ContentType>()?;
        }
        {
            let mut state = self.inner.state.lock().await;
            if value.is_empty() {
                state.filters.remove(&key);
            } else {
                state.filters.insert(key, value);
            }
        }
        self.commit().await
    }

    /// Drop one filter dimension and commit.
    pub async fn remove_filter(&self, key: FilterKey) -> Result<()> {
        if self.is_disposed() {
            return Ok(());
        }
        self.inner.state.lock().await.filters.remove(&key);
        self.commit().await
    }

    /// Reset all filters and commit with only the text query.
    pub async fn clear_filters(&self) -> Result<()> {
        if self.is_disposed() {
            return Ok(());
        }
        self.inner.state.lock().await.filters.clear();
        self.commit().await
    }

    /// Re-issue the current query, e.g. from a retry control.
    pub async fn retry(&self) -> Result<()> {
        self.commit().await
    }

    /// Tear the surface down. Scheduled commits are cancelled, in-flight
    /// results are dropped on arrival and later calls do nothing.
    pub fn dispose(&self) {
        self.inner.cancel.cancel();
        if let Some(timer) = self.lock_pending().take() {
            timer.abort();
        }
        // Invalidate whatever is still in flight.
        self.inner.issued.fetch_add(1, Ordering::SeqCst);
    }

    pub fn is_disposed(&self) -> bool {
        self.inner.cancel.is_cancelled()
    }

    fn lock_pending(&self) -> std::sync::MutexGuard<'_, Option<JoinHandle<()>>> {
        self.inner
            .pending
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    async fn commit_text(&self) {
        {
            let mut state = self.inner.state.lock().await;
            state.debounced_query = state.raw_query.clone();
        }
        if let Err(e) = self.commit().await {
            tracing::warn!(error = %e, "Debounced search could not be issued");
        }
    }

    /// Issue the merged query and publish the outcome unless superseded.
    async fn commit(&self) -> Result<()> {
        let (seq, request) = {
            let state = self.inner.state.lock().await;
            if self.is_disposed() {
                return Ok(());
            }
            let request = state.request()?;
            let seq = self.inner.issued.fetch_add(1, Ordering::SeqCst) + 1;
            (seq, request)
        };

        tracing::debug!(seq, query = %request.query, "Issuing search");
        let result = self.inner.source.search(&request).await;

        let mut state = self.inner.state.lock().await;
        if self.is_disposed() {
            tracing::debug!(seq, "Search surface disposed, dropping response");
            return Ok(());
        }
        let latest = self.inner.issued.load(Ordering::SeqCst);
        if seq != latest {
            let stale = FeedError::StaleResult { seq, latest };
            tracing::debug!(reason = %stale, "Dropping superseded search response");
            return Ok(());
        }

        let outcome = match result {
            Ok(items) => {
                tracing::debug!(seq, count = items.len(), "Search committed");
                state.results = items.clone();
                state.committed_seq = seq;
                SearchOutcome::Results { seq, items }
            }
            Err(e) => {
                tracing::warn!(seq, error = %e, "Search failed");
                SearchOutcome::Failed {
                    seq,
                    error: e.to_string(),
                }
            }
        };
        self.inner.outcome.send_replace(outcome);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockSearchSource;

    fn corpus() -> Vec<ContentItem> {
        vec![
            ContentItem::new(ContentType::Article, "shabbat-candles", "Shabbat candles")
                .with_category("halacha"),
            ContentItem::new(ContentType::Video, "shabbat-songs", "Shabbat songs")
                .with_category("music"),
            ContentItem::new(ContentType::Responsa, "torah-study", "Torah study at night")
                .with_category("halacha"),
            ContentItem::new(ContentType::Term, "torah", "Torah").with_category("glossary"),
        ]
    }

    fn slugs(items: &[ContentItem]) -> Vec<&str> {
        items.iter().map(|item| item.slug.as_str()).collect()
    }

    #[tokio::test(start_paused = true)]
    async fn rapid_edits_commit_once_with_last_text() {
        let source = MockSearchSource::new(corpus());
        let search = SearchAggregator::new(Arc::new(source.clone()), SearchConfig::default());
        let mut rx = search.subscribe();

        for text in ["t", "to", "tor", "torah"] {
            search.on_query_change(text).await;
            tokio::time::advance(Duration::from_millis(100)).await;
        }
        assert!(source.requests().is_empty());

        rx.changed().await.unwrap();
        tokio::time::sleep(Duration::from_secs(2)).await;

        let requests = source.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].query, "torah");

        let state = search.state().await;
        assert_eq!(state.debounced_query, "torah");
        assert_eq!(slugs(&state.results), vec!["torah-study", "torah"]);
    }

    #[tokio::test(start_paused = true)]
    async fn separate_quiet_windows_commit_separately() {
        let source = MockSearchSource::new(corpus());
        let search = SearchAggregator::new(Arc::new(source.clone()), SearchConfig::default());

        search.on_query_change("shabbat").await;
        tokio::time::sleep(Duration::from_millis(350)).await;
        search.on_query_change("torah").await;
        tokio::time::sleep(Duration::from_millis(350)).await;

        let queries: Vec<_> = source.requests().into_iter().map(|r| r.query).collect();
        assert_eq!(queries, vec!["shabbat", "torah"]);
    }

    #[tokio::test(start_paused = true)]
    async fn filter_change_commits_immediately() {
        let source = MockSearchSource::new(corpus());
        let search = SearchAggregator::new(Arc::new(source.clone()), SearchConfig::default());

        search.on_query_change("shabbat").await;
        // Filter lands before the text settles: uses the previous (empty) text.
        search
            .on_filter_change(FilterKey::Category, "halacha")
            .await
            .unwrap();

        let requests = source.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].query, "");
        assert!(requests[0].categories.contains("halacha"));
        assert_eq!(
            slugs(&search.state().await.results),
            vec!["shabbat-candles", "torah-study"]
        );

        tokio::time::sleep(Duration::from_millis(400)).await;
        let state = search.state().await;
        assert_eq!(source.requests().len(), 2);
        assert_eq!(slugs(&state.results), vec!["shabbat-candles"]);
    }

    #[tokio::test]
    async fn filters_combine_and_clear() {
        let source = MockSearchSource::new(corpus());
        let search = SearchAggregator::new(Arc::new(source.clone()), SearchConfig::default());

        search
            .on_filter_change(FilterKey::Category, "halacha")
            .await
            .unwrap();
        search
            .on_filter_change(FilterKey::ContentType, "responsa")
            .await
            .unwrap();
        assert_eq!(slugs(&search.state().await.results), vec!["torah-study"]);

        search.clear_filters().await.unwrap();
        let state = search.state().await;
        assert!(state.filters.is_empty());
        assert_eq!(state.results.len(), 4);
        assert_eq!(source.requests().len(), 3);
    }

    #[tokio::test]
    async fn invalid_content_type_filter_is_rejected() {
        let source = MockSearchSource::new(corpus());
        let search = SearchAggregator::new(Arc::new(source.clone()), SearchConfig::default());

        let err = search
            .on_filter_change(FilterKey::ContentType, "podcast")
            .await
            .unwrap_err();

        assert!(matches!(err, FeedError::InvalidInput { .. }));
        assert!(search.state().await.filters.is_empty());
        assert!(source.requests().is_empty());
    }

    #[tokio::test]
    async fn empty_filter_value_removes_the_constraint() {
        let source = MockSearchSource::new(corpus());
        let search = SearchAggregator::new(Arc::new(source.clone()), SearchConfig::default());

        search.on_filter_change(FilterKey::Category, "music").await.unwrap();
        search.on_filter_change(FilterKey::Category, "").await.unwrap();

        let requests = source.requests();
        assert!(requests[1].categories.is_empty());
        assert_eq!(search.state().await.results.len(), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn stale_response_never_overwrites_newer_one() {
        let source = MockSearchSource::new(corpus())
            .with_latency("halacha", Duration::from_millis(500))
            .with_latency("music", Duration::from_millis(10));
        let search = SearchAggregator::new(Arc::new(source.clone()), SearchConfig::default());

        let first = tokio::spawn({
            let search = search.clone();
            async move { search.on_filter_change(FilterKey::Category, "halacha").await }
        });
        while source.requests().is_empty() {
            tokio::task::yield_now().await;
        }

        search
            .on_filter_change(FilterKey::Category, "music")
            .await
            .unwrap();
        first.await.unwrap().unwrap();

        let state = search.state().await;
        assert_eq!(state.committed_seq, 2);
        assert_eq!(slugs(&state.results), vec!["shabbat-songs"]);
        assert_eq!(
            *search.subscribe().borrow(),
            SearchOutcome::Results {
                seq: 2,
                items: state.results.clone()
            }
        );
    }

    #[tokio::test]
    async fn failure_is_published_and_retry_recovers() {
        let source = MockSearchSource::new(corpus()).failing_next(1);
        let search = SearchAggregator::new(Arc::new(source.clone()), SearchConfig::default());
        let rx = search.subscribe();

        search.on_filter_change(FilterKey::Category, "music").await.unwrap();
        assert!(matches!(*rx.borrow(), SearchOutcome::Failed { seq: 1, .. }));

        search.retry().await.unwrap();
        assert!(matches!(*rx.borrow(), SearchOutcome::Results { seq: 2, .. }));
        assert_eq!(slugs(&search.state().await.results), vec!["shabbat-songs"]);
    }

    #[tokio::test(start_paused = true)]
    async fn dispose_cancels_pending_commit() {
        let source = MockSearchSource::new(corpus());
        let search = SearchAggregator::new(Arc::new(source.clone()), SearchConfig::default());

        search.on_query_change("torah").await;
        search.dispose();
        tokio::time::sleep(Duration::from_secs(1)).await;

        assert!(source.requests().is_empty());
    }

    #[tokio::test]
    async fn remove_filter_drops_one_dimension() {
        let source = MockSearchSource::new(corpus());
        let search = SearchAggregator::new(Arc::new(source.clone()), SearchConfig::default());

        search
            .on_filter_change(FilterKey::Category, "halacha")
            .await
            .unwrap();
        search
            .on_filter_change(FilterKey::ContentType, "article")
            .await
            .unwrap();
        assert_eq!(slugs(&search.state().await.results), vec!["shabbat-candles"]);

        search.remove_filter(FilterKey::ContentType).await.unwrap();

        let state = search.state().await;
        assert_eq!(state.filters.len(), 1);
        assert_eq!(state.filters.get(&FilterKey::Category).map(String::as_str), Some("halacha"));
        assert_eq!(slugs(&state.results), vec!["shabbat-candles", "torah-study"]);

        let last = source.requests().pop().unwrap();
        assert!(last.content_types.is_empty());
        assert!(last.categories.contains("halacha"));
    }

    #[tokio::test(start_paused = true)]
    async fn dispose_drops_in_flight_response() {
        let source = MockSearchSource::new(corpus())
            .with_latency("halacha", Duration::from_millis(500));
        let search = SearchAggregator::new(Arc::new(source.clone()), SearchConfig::default());
        let rx = search.subscribe();

        let pending = tokio::spawn({
            let search = search.clone();
            async move { search.on_filter_change(FilterKey::Category, "halacha").await }
        });
        while source.requests().is_empty() {
            tokio::task::yield_now().await;
        }

        search.dispose();
        pending.await.unwrap().unwrap();

        let state = search.state().await;
        assert!(state.results.is_empty());
        assert_eq!(state.committed_seq, 0);
        assert_eq!(*rx.borrow(), SearchOutcome::Idle);
    }

    #[tokio::test]
    async fn calls_after_dispose_do_nothing() {
        let source = MockSearchSource::new(corpus());
        let search = SearchAggregator::new(Arc::new(source.clone()), SearchConfig::default());
        let rx = search.subscribe();

        search.dispose();
        assert!(search.is_disposed());

        search
            .on_filter_change(FilterKey::Category, "music")
            .await
            .unwrap();
        search.remove_filter(FilterKey::Category).await.unwrap();
        search.clear_filters().await.unwrap();
        search.retry().await.unwrap();
        search.on_query_change("torah").await;

        let state = search.state().await;
        assert!(state.filters.is_empty());
        assert!(state.raw_query.is_empty());
        assert!(source.requests().is_empty());
        assert_eq!(*rx.borrow(), SearchOutcome::Idle);
    }

    #[test]
    fn filter_keys_parse() {
        assert_eq!("category".parse::<FilterKey>().unwrap(), FilterKey::Category);
        assert_eq!("type".parse::<FilterKey>().unwrap(), FilterKey::ContentType);
        assert!("author".parse::<FilterKey>().is_err());
    }
}
