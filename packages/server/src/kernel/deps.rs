//! Server dependencies for request handlers (using traits for testability)
//!
//! Storage behind the view counter is a `BaseViewStore` trait object so tests
//! can swap Postgres for the in-memory store.

use content_feed::{BaseViewStore, ViewCounter};
use sqlx::PgPool;
use std::sync::Arc;

use crate::config::ServerSettings;
use crate::domains::content::PgViewStore;

// =============================================================================
// ServerDeps
// =============================================================================

/// Dependencies shared by every request handler.
#[derive(Clone)]
pub struct ServerDeps {
    pub db_pool: PgPool,
    pub view_counter: Arc<ViewCounter>,
    pub settings: ServerSettings,
}

impl ServerDeps {
    /// Production wiring: counters live in Postgres.
    pub fn new(db_pool: PgPool, settings: ServerSettings) -> Self {
        let store = Arc::new(PgViewStore::new(db_pool.clone()));
        Self::with_view_store(db_pool, store, settings)
    }

    pub fn with_view_store(
        db_pool: PgPool,
        store: Arc<dyn BaseViewStore>,
        settings: ServerSettings,
    ) -> Self {
        let view_counter = ViewCounter::new(store)
            .with_max_attempts(settings.view_increment_max_attempts);
        Self {
            db_pool,
            view_counter: Arc::new(view_counter),
            settings,
        }
    }
}
