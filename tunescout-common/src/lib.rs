//! # TuneScout Common Library
//!
//! Shared code for the TuneScout music engine crates:
//! - Configuration loading and root folder resolution
//! - Atomic file writes used by config and cache persistence
//! - Request pacing for external APIs
//! - Common error type

pub mod config;
pub mod error;
pub mod fs;
pub mod rate_limit;

pub use error::{Error, Result};
