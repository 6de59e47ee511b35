//! Service modules backing the track metadata manager
//!
//! Leaves first: fallback table and cache store have no dependencies on
//! each other; the external sources sit behind `MetadataSource`.

pub mod cache_store;
pub mod fallback_table;
pub mod metadata_source;
pub mod spotify_client;

pub use cache_store::CacheStore;
pub use fallback_table::FallbackTable;
pub use metadata_source::{MetadataSource, NoExternalSource, SourceOutcome};
pub use spotify_client::{SpotifyClient, SpotifyClientConfig, SpotifyError, SpotifyTrack};
