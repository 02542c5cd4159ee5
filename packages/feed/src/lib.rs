//! Incremental Content Delivery Library
//!
//! The stateful core behind the site's list, search and item pages:
//! paged loading with infinite scroll, the featured + remainder split,
//! debounced search with immediate filters, and view counters that stay
//! exact under concurrent increments.
//!
//! # Usage
//!
//! ```rust,ignore
//! use content_feed::{ContentAggregator, ContentType, HttpContentClient, ListLoader};
//!
//! let client = Arc::new(HttpContentClient::new(config)?);
//! let aggregator = ContentAggregator::new(client.clone());
//!
//! // Mount a list surface
//! let first = aggregator.first_page(ContentType::Article, 12).await?;
//! let loader = ListLoader::with_featured(Arc::new(aggregator.feed(ContentType::Article, 12)), &first);
//!
//! // Sentinel scrolled into view
//! loader.on_visible().await?;
//!
//! // Surface unmounted
//! loader.dispose();
//! ```
//!
//! # Modules
//!
//! - [`traits`] - Collaborator abstractions (content, search, views)
//! - [`types`] - Content items and pages
//! - [`window`] - Page-number navigation
//! - [`aggregator`] - First page + featured split
//! - [`loader`] - Infinite-scroll list loader
//! - [`search`] - Debounced search aggregation
//! - [`counter`] - View counters
//! - [`client`] - HTTP collaborator implementation
//! - [`testing`] - Mock collaborators for tests

pub mod aggregator;
pub mod client;
pub mod counter;
pub mod error;
pub mod loader;
pub mod search;
pub mod testing;
pub mod traits;
pub mod types;
pub mod window;

// Re-export core types at crate root
pub use aggregator::{ContentAggregator, ContentTypeFeed, FirstPage};
pub use client::{ClientConfig, HttpContentClient, ViewCountResponse};
pub use counter::{spawn_track_view, track_view, InMemoryViewStore, ViewCounter};
pub use error::{FeedError, Result};
pub use loader::{BasePageFetcher, ListLoader, ListState, LoadOutcome, LoadState};
pub use search::{FilterKey, SearchAggregator, SearchConfig, SearchOutcome, SearchState};
pub use traits::{
    BaseContentSource, BaseSearchSource, BaseViewStore, BaseViewTracker, IncrementAttempt,
    SearchRequest,
};
pub use types::{ContentId, ContentItem, ContentType, Page};
pub use window::{PageSlot, MAX_PAGES_TO_SHOW};
