//! # Infrastructure Adapters
//!
//! Implementations of core traits backed by external services.

pub mod ghost_directory;

pub use ghost_directory::into_subscriber;
