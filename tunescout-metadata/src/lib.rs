//! tunescout-metadata library interface
//!
//! Resolves track identifiers to descriptive metadata through a durable
//! JSON cache, a curated fallback table and an optional external catalog.
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use tunescout_metadata::{ManagerConfig, TrackMetadataManager};
//! use tunescout_metadata::services::NoExternalSource;
//!
//! let config = ManagerConfig::new("/tmp/track_metadata_cache.json");
//! let manager = TrackMetadataManager::new(&config, Arc::new(NoExternalSource))?;
//! let record = manager.get_track_metadata("0VjIjW4GlUZAMYd2vXMi3b").await;
//! ```

pub mod config;
pub mod error;
pub mod manager;
pub mod models;
pub mod services;

pub use crate::config::ManagerConfig;
pub use crate::error::{CacheError, MetadataError, MetadataResult};
pub use crate::manager::TrackMetadataManager;
pub use crate::models::{MetadataRecord, Resolution, ResolutionOrigin};
