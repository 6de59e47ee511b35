//! Outcome of one metadata resolution

use super::MetadataRecord;
use crate::error::CacheError;

/// Where a resolved record came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionOrigin {
    /// Already present in the cache store
    Cache,
    /// Curated fallback table
    Fallback,
    /// External metadata source
    External,
    /// No source knows the track
    NotFound,
}

/// Detailed result of resolving one track identifier
///
/// A persistence failure never hides a resolved record: `record` is filled
/// in and `persist_error` reports why the cache write did not reach disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub record: Option<MetadataRecord>,
    pub origin: ResolutionOrigin,
    pub persist_error: Option<CacheError>,
}

impl Resolution {
    pub fn resolved(record: MetadataRecord, origin: ResolutionOrigin) -> Self {
        Self {
            record: Some(record),
            origin,
            persist_error: None,
        }
    }

    pub fn not_found() -> Self {
        Self {
            record: None,
            origin: ResolutionOrigin::NotFound,
            persist_error: None,
        }
    }

    pub fn with_persist_error(mut self, error: Option<CacheError>) -> Self {
        self.persist_error = error;
        self
    }

    pub fn is_found(&self) -> bool {
        self.record.is_some()
    }

    pub fn into_record(self) -> Option<MetadataRecord> {
        self.record
    }
}
