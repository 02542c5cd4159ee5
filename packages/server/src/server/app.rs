//! Application setup and server configuration.

use std::sync::Arc;

use axum::{
    extract::Extension,
    http::{header::CONTENT_TYPE, HeaderValue, Method},
    routing::{get, post},
    Router,
};
use sqlx::PgPool;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::ServerSettings;
use crate::kernel::ServerDeps;
use crate::server::routes::{
    by_slug_handler, create_content_handler, featured_handler, health_handler, list_page_handler,
    record_view_handler, search_handler,
};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub db_pool: PgPool,
    pub deps: Arc<ServerDeps>,
}

impl AppState {
    pub fn new(deps: ServerDeps) -> Self {
        Self {
            db_pool: deps.db_pool.clone(),
            deps: Arc::new(deps),
        }
    }
}

/// Build the Axum application router with Postgres-backed counters.
pub fn build_app(pool: PgPool, settings: ServerSettings) -> Router {
    build_app_with_deps(ServerDeps::new(pool, settings))
}

/// Build the router around pre-wired dependencies.
pub fn build_app_with_deps(deps: ServerDeps) -> Router {
    let cors = cors_layer(&deps.settings.allowed_origins);
    let state = AppState::new(deps);

    Router::new()
        .route("/health", get(health_handler))
        .route("/search", get(search_handler))
        .route(
            "/:content_type",
            get(list_page_handler).post(create_content_handler),
        )
        .route("/:content_type/featured", get(featured_handler))
        .route("/:content_type/by-slug/:slug", get(by_slug_handler))
        .route("/:content_type/:id/view", post(record_view_handler))
        .layer(Extension(state))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE]);

    if allowed_origins.is_empty() {
        return layer.allow_origin(Any);
    }

    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    layer.allow_origin(origins)
}
