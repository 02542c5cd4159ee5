//! Kernel module - server infrastructure and dependencies.

pub mod deps;

pub use deps::ServerDeps;
