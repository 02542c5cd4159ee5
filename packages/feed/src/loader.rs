//! Infinite-scroll list loader.
//!
//! One `ListLoader` backs one list surface. The surface calls
//! [`ListLoader::on_visible`] whenever its sentinel element scrolls into
//! view and [`ListLoader::dispose`] when it goes away. The loader appends
//! each fetched page at the tail of its item list, never has more than one
//! fetch in flight, and stops once the source runs dry.
//!
//! ```text
//! Idle ──visible──► Loading ──full page──► Idle
//!                      │
//!                      ├──short/empty page──► Exhausted (terminal)
//!                      │
//!                      └──fetch error──► Failed ──retry()──► Loading
//! ```
//!
//! The fetch runs in a task owned by the loader. A caller that stops
//! awaiting `on_visible` (a timeout, a dropped future) does not strand the
//! loader in `Loading`: the page still lands when the fetch completes.

use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

use crate::aggregator::FirstPage;
use crate::error::{FeedError, Result};
use crate::types::{ContentId, ContentItem, Page};

/// Fetches page `n` of whatever collection a loader is bound to.
#[async_trait]
pub trait BasePageFetcher: Send + Sync {
    async fn fetch(&self, page: u32) -> Result<Page>;
}

/// Load cycle state of a list surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadState {
    Idle,
    Loading,
    Exhausted,
    /// Last load-more failed; automatic loading stops until `retry()`.
    Failed,
}

/// What a call to `on_visible` / `retry` ended up doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// Nothing fetched; carries the state that blocked the load.
    Skipped(LoadState),
    /// Page applied, more may follow.
    Appended { page: u32, added: usize },
    /// Page applied and the collection is done.
    Exhausted { page: u32, added: usize },
    /// The surface was disposed while the fetch was in flight.
    Discarded,
}

/// Items and cursor of one list surface.
#[derive(Debug, Clone)]
pub struct ListState {
    pub items: Vec<ContentItem>,
    pub next_page: u32,
    pub load_state: LoadState,
    pub featured_id: Option<ContentId>,
    seen: HashSet<ContentId>,
}

impl ListState {
    fn new(first_page: Page, featured_id: Option<ContentId>) -> Self {
        let mut state = Self {
            items: Vec::with_capacity(first_page.items.len()),
            next_page: 2,
            load_state: if first_page.has_more_hint {
                LoadState::Idle
            } else {
                LoadState::Exhausted
            },
            featured_id,
            seen: featured_id.into_iter().collect(),
        };
        state.append(first_page.items);
        state
    }

    /// Append unseen items at the tail, returning how many were new.
    fn append(&mut self, items: Vec<ContentItem>) -> usize {
        let before = self.items.len();
        for item in items {
            if self.seen.insert(item.id) {
                self.items.push(item);
            }
        }
        self.items.len() - before
    }
}

struct LoaderInner {
    fetcher: Arc<dyn BasePageFetcher>,
    state: Mutex<ListState>,
    cancel: CancellationToken,
}

/// Append-only paged list driven by visibility events.
pub struct ListLoader {
    inner: Arc<LoaderInner>,
}

impl ListLoader {
    /// Start a surface from its first page.
    pub fn new(fetcher: Arc<dyn BasePageFetcher>, first_page: Page) -> Self {
        Self::from_state(fetcher, ListState::new(first_page, None))
    }

    /// Start a featured + grid surface. The featured item is shown apart
    /// and is never appended to the grid, even if a later page repeats it.
    pub fn with_featured(fetcher: Arc<dyn BasePageFetcher>, first_page: &FirstPage) -> Self {
        let state = ListState::new(first_page.remainder_page(), first_page.featured_id());
        Self::from_state(fetcher, state)
    }

    fn from_state(fetcher: Arc<dyn BasePageFetcher>, state: ListState) -> Self {
        Self {
            inner: Arc::new(LoaderInner {
                fetcher,
                state: Mutex::new(state),
                cancel: CancellationToken::new(),
            }),
        }
    }

    /// Sentinel became visible: load the next page if idle.
    pub async fn on_visible(&self) -> Result<LoadOutcome> {
        self.begin_load(LoadState::Idle).await
    }

    /// Manual retry after a failed load-more.
    pub async fn retry(&self) -> Result<LoadOutcome> {
        self.begin_load(LoadState::Failed).await
    }

    /// Tear the surface down. In-flight results are dropped on arrival.
    pub fn dispose(&self) {
        self.inner.cancel.cancel();
    }

    pub fn is_disposed(&self) -> bool {
        self.inner.cancel.is_cancelled()
    }

    pub async fn snapshot(&self) -> ListState {
        self.inner.state.lock().await.clone()
    }

    pub async fn load_state(&self) -> LoadState {
        self.inner.state.lock().await.load_state
    }

    async fn begin_load(&self, required: LoadState) -> Result<LoadOutcome> {
        let page = {
            let mut state = self.inner.state.lock().await;
            if self.inner.cancel.is_cancelled() {
                return Ok(LoadOutcome::Discarded);
            }
            if state.load_state != required {
                return Ok(LoadOutcome::Skipped(state.load_state));
            }
            state.load_state = LoadState::Loading;
            state.next_page
        };

        tracing::debug!(page, "Loading next page");

        let inner = self.inner.clone();
        let task = tokio::spawn(async move { inner.load(page).await });
        match task.await {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::error!(page, error = %e, "Load task died");
                let mut state = self.inner.state.lock().await;
                if state.load_state == LoadState::Loading {
                    state.load_state = LoadState::Failed;
                }
                Err(FeedError::transient(e))
            }
        }
    }
}

impl LoaderInner {
    /// Fetch `page` and apply it. Entered with the state already `Loading`.
    async fn load(&self, page: u32) -> Result<LoadOutcome> {
        let fetched = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => {
                tracing::debug!(page, "Surface disposed during load, dropping fetch");
                return Ok(LoadOutcome::Discarded);
            }
            fetched = self.fetcher.fetch(page) => fetched,
        };

        let mut state = self.state.lock().await;
        if self.cancel.is_cancelled() {
            return Ok(LoadOutcome::Discarded);
        }

        let batch = match fetched {
            Ok(batch) => batch,
            Err(e) => {
                tracing::warn!(page, error = %e, "Load more failed, waiting for retry");
                state.load_state = LoadState::Failed;
                return Err(e);
            }
        };

        let exhausted = batch.is_empty() || !batch.has_more_hint;
        let added = state.append(batch.items);
        state.next_page = page + 1;

        if exhausted {
            state.load_state = LoadState::Exhausted;
            tracing::debug!(page, added, "List exhausted");
            Ok(LoadOutcome::Exhausted { page, added })
        } else {
            state.load_state = LoadState::Idle;
            Ok(LoadOutcome::Appended { page, added })
        }
    }
}
