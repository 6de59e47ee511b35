//! External metadata source abstraction
//!
//! The resolver only needs one question answered: "what do you know about
//! this track id?". Transport, authentication and retries belong to the
//! implementation; the resolver sees a final `SourceOutcome`.

use crate::models::MetadataRecord;

/// Final answer from an external source, after its own retries
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceOutcome {
    /// Source returned a usable record
    Found(MetadataRecord),
    /// Source positively knows nothing about the track
    NotFound,
    /// Source could not be reached or kept failing; reason for logs
    Unreachable(String),
}

/// External metadata source
///
/// # Example
/// ```rust,ignore
/// use tunescout_metadata::services::{MetadataSource, SourceOutcome};
///
/// pub struct StaticSource;
///
/// #[async_trait::async_trait]
/// impl MetadataSource for StaticSource {
///     fn name(&self) -> &'static str { "static" }
///
///     async fn fetch(&self, track_id: &str) -> SourceOutcome {
///         SourceOutcome::NotFound
///     }
/// }
/// ```
#[async_trait::async_trait]
pub trait MetadataSource: Send + Sync {
    /// Source name for logging
    fn name(&self) -> &'static str;

    /// Look up one track identifier
    ///
    /// Never fails: transport problems are reported as `Unreachable` once
    /// the implementation's retry policy is exhausted.
    async fn fetch(&self, track_id: &str) -> SourceOutcome;
}

/// Source used when no external catalog is configured
///
/// Every lookup answers `NotFound` without I/O, leaving the fallback table
/// and cache as the only providers.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoExternalSource;

#[async_trait::async_trait]
impl MetadataSource for NoExternalSource {
    fn name(&self) -> &'static str {
        "none"
    }

    async fn fetch(&self, _track_id: &str) -> SourceOutcome {
        SourceOutcome::NotFound
    }
}
