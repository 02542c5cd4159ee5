// Content Delivery Server - API Core
//
// Serves paged content feeds, slug lookups, search and view counting over
// JSON. The stateful list/search logic lives in the `content-feed` crate;
// this crate owns storage (Postgres via sqlx) and the HTTP surface (axum).
//
// Each domain keeps its SQL in domains/*/models/.

pub mod common;
pub mod config;
pub mod domains;
pub mod kernel;
pub mod server;

pub use config::*;
