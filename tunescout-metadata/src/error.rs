//! Error types for tunescout-metadata
//!
//! An unresolvable identifier is an ordinary `None` result, not an error.

use std::path::PathBuf;
use thiserror::Error;

/// Cache store errors
///
/// Cloneable so one persistence failure can be fanned out to every waiter
/// of a coalesced resolution.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CacheError {
    /// On-disk document exists but is not a valid cache document
    #[error("Cache document {} is corrupt: {reason}", .path.display())]
    CorruptCache { path: PathBuf, reason: String },

    /// On-disk document exists but could not be read
    #[error("Cache document {} is unreadable: {reason}", .path.display())]
    Unreadable { path: PathBuf, reason: String },

    /// Writing the on-disk document failed; the in-memory entry is kept
    #[error("Failed to persist cache document {}: {reason}", .path.display())]
    Persistence { path: PathBuf, reason: String },
}

/// Manager construction errors
#[derive(Debug, Error)]
pub enum MetadataError {
    /// Cache could not be loaded under the configured policy
    #[error("Cache error: {0}")]
    Cache(#[from] CacheError),
}

/// Result type for manager construction
pub type MetadataResult<T> = Result<T, MetadataError>;
