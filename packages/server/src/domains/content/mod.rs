//! Content domain: published items, their pages and their view counters.

pub mod data;
pub mod models;

pub use data::*;
pub use models::*;
