//! Per-item view counting.
//!
//! The store owns the atomicity of each add; [`ViewCounter`] only decides
//! how many lost races it is willing to retry. A counter is never written
//! with a value the caller computed from an earlier read.

use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::task::JoinHandle;

use crate::error::{FeedError, Result};
use crate::traits::{BaseViewStore, BaseViewTracker, IncrementAttempt};
use crate::types::{ContentId, ContentType};

/// Attempts per increment before giving up on a contended counter.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Increments view counters through an atomic store.
#[derive(Clone)]
pub struct ViewCounter {
    store: Arc<dyn BaseViewStore>,
    max_attempts: u32,
}

impl ViewCounter {
    pub fn new(store: Arc<dyn BaseViewStore>) -> Self {
        Self {
            store,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }

    /// Set the conflict retry budget (at least one attempt is always made).
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    /// Add one view and return the committed count.
    pub async fn increment(&self, content_type: ContentType, owner_id: ContentId) -> Result<u64> {
        for attempt in 1..=self.max_attempts {
            match self.store.try_increment(content_type, owner_id).await? {
                IncrementAttempt::Applied(count) => return Ok(count),
                IncrementAttempt::Missing => {
                    return Err(FeedError::not_found(content_type, owner_id.to_string()))
                }
                IncrementAttempt::Conflict => {
                    tracing::debug!(%owner_id, attempt, "View increment conflicted, retrying");
                }
            }
        }

        tracing::warn!(%owner_id, attempts = self.max_attempts, "View increment gave up");
        Err(FeedError::ConflictRetryExhausted {
            owner_id,
            attempts: self.max_attempts,
        })
    }

    pub async fn current(&self, content_type: ContentType, owner_id: ContentId) -> Result<u64> {
        self.store
            .current(content_type, owner_id)
            .await?
            .ok_or_else(|| FeedError::not_found(content_type, owner_id.to_string()))
    }
}

#[async_trait]
impl BaseViewTracker for ViewCounter {
    async fn increment_view(&self, content_type: ContentType, id: ContentId) -> Result<u64> {
        self.increment(content_type, id).await
    }
}

/// Best-effort view recording for the content-view path.
///
/// Failures are logged and swallowed: the page renders either way and no
/// retry is attempted.
pub async fn track_view(
    tracker: &dyn BaseViewTracker,
    content_type: ContentType,
    id: ContentId,
) -> Option<u64> {
    match tracker.increment_view(content_type, id).await {
        Ok(count) => {
            tracing::debug!(%content_type, %id, count, "View recorded");
            Some(count)
        }
        Err(e) if e.is_not_found() => {
            tracing::info!(%content_type, %id, "View for unknown item ignored");
            None
        }
        Err(e) => {
            tracing::warn!(%content_type, %id, error = %e, "View recording failed");
            None
        }
    }
}

/// Fire-and-forget variant of [`track_view`].
pub fn spawn_track_view(
    tracker: Arc<dyn BaseViewTracker>,
    content_type: ContentType,
    id: ContentId,
) -> JoinHandle<Option<u64>> {
    tokio::spawn(async move { track_view(tracker.as_ref(), content_type, id).await })
}

// =============================================================================
// In-memory store
// =============================================================================

/// Process-local counters doing one compare-and-swap per attempt.
///
/// A CAS that loses to a concurrent writer reports `Conflict` instead of
/// looping, leaving the retry policy to [`ViewCounter`].
#[derive(Clone, Default)]
pub struct InMemoryViewStore {
    counters: Arc<DashMap<(ContentType, ContentId), Arc<AtomicU64>>>,
}

impl InMemoryViewStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create the counter for a new item. Existing counters are kept.
    pub fn register(&self, content_type: ContentType, owner_id: ContentId, initial: u64) {
        self.counters
            .entry((content_type, owner_id))
            .or_insert_with(|| Arc::new(AtomicU64::new(initial)));
    }

    /// Drop the counter of a deleted item; later increments report `Missing`.
    pub fn remove(&self, content_type: ContentType, owner_id: ContentId) {
        self.counters.remove(&(content_type, owner_id));
    }

    fn counter(&self, content_type: ContentType, owner_id: ContentId) -> Option<Arc<AtomicU64>> {
        self.counters
            .get(&(content_type, owner_id))
            .map(|entry| Arc::clone(entry.value()))
    }
}

#[async_trait]
impl BaseViewStore for InMemoryViewStore {
    async fn try_increment(
        &self,
        content_type: ContentType,
        owner_id: ContentId,
    ) -> Result<IncrementAttempt> {
        let Some(counter) = self.counter(content_type, owner_id) else {
            return Ok(IncrementAttempt::Missing);
        };

        let current = counter.load(Ordering::Acquire);
        let next = current.checked_add(1).ok_or_else(|| FeedError::InvalidInput {
            reason: format!("view counter for {} overflowed", owner_id),
        })?;
        match counter.compare_exchange(current, next, Ordering::AcqRel, Ordering::Acquire) {
            Ok(_) => Ok(IncrementAttempt::Applied(next)),
            Err(_) => Ok(IncrementAttempt::Conflict),
        }
    }

    async fn current(&self, content_type: ContentType, owner_id: ContentId) -> Result<Option<u64>> {
        Ok(self
            .counter(content_type, owner_id)
            .map(|counter| counter.load(Ordering::Acquire)))
    }
}
