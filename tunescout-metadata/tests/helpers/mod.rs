//! Test Helper Utilities
//!
//! Shared utilities for testing tunescout-metadata

#![allow(dead_code)]

pub mod mock_source;

pub use mock_source::MockSource;

use std::path::Path;
use std::sync::Arc;
use tunescout_metadata::services::MetadataSource;
use tunescout_metadata::{ManagerConfig, TrackMetadataManager};

/// Manager over `cache_path` with the built-in fallback table
pub fn create_test_manager(cache_path: &Path, source: Arc<dyn MetadataSource>) -> TrackMetadataManager {
    TrackMetadataManager::new(&ManagerConfig::new(cache_path), source)
        .expect("Failed to create test manager")
}

/// Parse the on-disk cache document as a JSON object
pub fn read_cache_document(cache_path: &Path) -> serde_json::Map<String, serde_json::Value> {
    let content = std::fs::read_to_string(cache_path).expect("Cache document missing");
    serde_json::from_str(&content).expect("Cache document is not a JSON object")
}
