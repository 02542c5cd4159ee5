// Common types and utilities shared across the application

pub mod pagination;

pub use pagination::{PageArgs, ValidatedPageArgs, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};
