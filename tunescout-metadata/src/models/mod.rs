//! Data models for track metadata resolution

pub mod metadata_record;
pub mod resolution;

pub use metadata_record::{normalize_track_id, MetadataRecord};
pub use resolution::{Resolution, ResolutionOrigin};
