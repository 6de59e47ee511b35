//! Track metadata manager
//!
//! Resolves a track identifier in this order:
//! 1. Cache store (no I/O beyond the initial load)
//! 2. Fallback table, written back to the cache
//! 3. External metadata source, normalized and written back to the cache
//!
//! Unknown tracks resolve to `None` and are not cached, so a later lookup
//! can still find a track the catalog publishes afterwards.
//!
//! # Coalescing
//!
//! A cache miss starts a resolution episode in its own tokio task. The
//! episode is registered in an in-flight table as a shared future; any
//! request for the same identifier arriving while it runs awaits that
//! future instead of starting another one. The episode writes the cache
//! before it leaves the in-flight table, so a later request sees either
//! the running episode or the cached entry, never neither.
//!
//! Callers only hold clones of the shared future. A caller that times out
//! or is cancelled drops its clone; the task keeps running for everyone
//! else and still completes its cache write.
//!
//! # Writes
//!
//! The mapping sits behind an `RwLock`, held only for lookups and the
//! in-memory insert. Disk flushes are serialized by a separate mutex that
//! covers insert, encode and write, so documents reach disk in insert
//! order and each one contains every earlier entry. Cache hits never wait
//! for a flush.

use crate::config::ManagerConfig;
use crate::error::{CacheError, MetadataResult};
use crate::models::{normalize_track_id, MetadataRecord, Resolution, ResolutionOrigin};
use crate::services::{CacheStore, FallbackTable, MetadataSource, SourceOutcome};
use futures::future::{BoxFuture, FutureExt, Shared};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, error, info, warn};

type SharedResolution = Shared<BoxFuture<'static, Resolution>>;

struct Inner {
    cache: RwLock<CacheStore>,
    /// Single writer: held across the mapping update and the disk flush
    flush_lock: Mutex<()>,
    cache_path: PathBuf,
    fallback: FallbackTable,
    source: Arc<dyn MetadataSource>,
    in_flight: Mutex<HashMap<String, SharedResolution>>,
}

/// Resolves track identifiers to metadata records
///
/// Cheap to clone; clones share the cache, fallback table, source and
/// in-flight table.
#[derive(Clone)]
pub struct TrackMetadataManager {
    inner: Arc<Inner>,
}

impl TrackMetadataManager {
    /// Load the cache under `config` and use the built-in fallback table
    pub fn new(config: &ManagerConfig, source: Arc<dyn MetadataSource>) -> MetadataResult<Self> {
        Self::with_fallback(config, FallbackTable::builtin(), source)
    }

    pub fn with_fallback(
        config: &ManagerConfig,
        fallback: FallbackTable,
        source: Arc<dyn MetadataSource>,
    ) -> MetadataResult<Self> {
        let cache = load_cache(config)?;
        Ok(Self::from_parts(cache, fallback, source))
    }

    /// Assemble from an already loaded cache store
    pub fn from_parts(
        cache: CacheStore,
        fallback: FallbackTable,
        source: Arc<dyn MetadataSource>,
    ) -> Self {
        let cache_path = cache.path().to_path_buf();

        Self {
            inner: Arc::new(Inner {
                cache: RwLock::new(cache),
                flush_lock: Mutex::new(()),
                cache_path,
                fallback,
                source,
                in_flight: Mutex::new(HashMap::new()),
            }),
        }
    }

    /// Metadata for `track_id`, or `None` when no source knows the track
    ///
    /// A failed cache write does not hide the record; use `resolve` to
    /// observe it.
    pub async fn get_track_metadata(&self, track_id: &str) -> Option<MetadataRecord> {
        self.resolve(track_id).await.into_record()
    }

    /// Resolve `track_id`, reporting the origin and any persistence failure
    pub async fn resolve(&self, track_id: &str) -> Resolution {
        let Some(track_id) = normalize_track_id(track_id) else {
            debug!("Ignoring blank track id");
            return Resolution::not_found();
        };

        if let Some(record) = self.inner.cache.read().await.get(track_id) {
            debug!(track_id = %track_id, "Cache hit");
            return Resolution::resolved(record, ResolutionOrigin::Cache);
        }

        let episode = self.join_or_start_episode(track_id).await;
        episode.await
    }

    /// Resolve several identifiers concurrently; results keep input order
    pub async fn get_many<S: AsRef<str>>(&self, track_ids: &[S]) -> Vec<(String, Option<MetadataRecord>)> {
        let lookups = track_ids.iter().map(|id| {
            let id = id.as_ref();
            async move { (id.to_string(), self.get_track_metadata(id).await) }
        });

        futures::future::join_all(lookups).await
    }

    /// All cached entries sorted by track identifier
    pub async fn cached_entries(&self) -> Vec<(String, MetadataRecord)> {
        self.inner.cache.read().await.snapshot()
    }

    pub async fn cache_len(&self) -> usize {
        self.inner.cache.read().await.len()
    }

    pub fn cache_path(&self) -> &Path {
        &self.inner.cache_path
    }

    pub fn fallback(&self) -> &FallbackTable {
        &self.inner.fallback
    }

    pub fn source_name(&self) -> &'static str {
        self.inner.source.name()
    }

    /// Number of resolution episodes currently running
    pub async fn in_flight_count(&self) -> usize {
        self.inner.in_flight.lock().await.len()
    }

    async fn join_or_start_episode(&self, track_id: &str) -> SharedResolution {
        let mut in_flight = self.inner.in_flight.lock().await;

        if let Some(existing) = in_flight.get(track_id) {
            debug!(track_id = %track_id, "Joining in-flight resolution");
            return existing.clone();
        }

        // The episode removes its own entry, which needs this lock, so it
        // cannot finish before the entry below is inserted
        let inner = Arc::clone(&self.inner);
        let episode_id = track_id.to_string();
        let handle = tokio::spawn(async move { inner.run_episode(episode_id).await });

        let cleanup = Arc::clone(&self.inner);
        let cleanup_id = track_id.to_string();
        let shared = async move {
            match handle.await {
                Ok(resolution) => resolution,
                Err(join_error) => {
                    error!(track_id = %cleanup_id, error = %join_error, "Resolution task failed");
                    cleanup.in_flight.lock().await.remove(&cleanup_id);
                    Resolution::not_found()
                }
            }
        }
        .boxed()
        .shared();

        in_flight.insert(track_id.to_string(), shared.clone());
        shared
    }
}

impl Inner {
    async fn run_episode(self: Arc<Self>, track_id: String) -> Resolution {
        let resolution = self.resolve_uncoalesced(&track_id).await;

        if let Some(e) = &resolution.persist_error {
            warn!(track_id = %track_id, error = %e, "Resolved track but cache write failed");
        }

        self.in_flight.lock().await.remove(&track_id);
        resolution
    }

    async fn resolve_uncoalesced(&self, track_id: &str) -> Resolution {
        // An episode that finished between the caller's cache check and
        // this one has already stored the record
        if let Some(record) = self.cache.read().await.get(track_id) {
            return Resolution::resolved(record, ResolutionOrigin::Cache);
        }

        if let Some(record) = self.fallback.lookup(track_id) {
            info!(track_id = %track_id, title = %record.title, "Resolved from fallback table");
            let persist_error = self.store(track_id, record.clone()).await;
            return Resolution::resolved(record, ResolutionOrigin::Fallback)
                .with_persist_error(persist_error);
        }

        match self.source.fetch(track_id).await {
            SourceOutcome::Found(record) => match record.normalized() {
                Some(record) => {
                    info!(
                        track_id = %track_id,
                        source = self.source.name(),
                        title = %record.title,
                        "Resolved from external source"
                    );
                    let persist_error = self.store(track_id, record.clone()).await;
                    Resolution::resolved(record, ResolutionOrigin::External)
                        .with_persist_error(persist_error)
                }
                None => {
                    warn!(
                        track_id = %track_id,
                        source = self.source.name(),
                        "External record has no usable title or artists"
                    );
                    Resolution::not_found()
                }
            },
            SourceOutcome::NotFound => {
                debug!(track_id = %track_id, source = self.source.name(), "Track not found");
                Resolution::not_found()
            }
            SourceOutcome::Unreachable(reason) => {
                warn!(
                    track_id = %track_id,
                    source = self.source.name(),
                    reason = %reason,
                    "External source unreachable, treating track as not found"
                );
                Resolution::not_found()
            }
        }
    }

    async fn store(&self, track_id: &str, record: MetadataRecord) -> Option<CacheError> {
        let _writer = self.flush_lock.lock().await;

        let document = {
            let mut cache = self.cache.write().await;
            cache.insert(track_id, record);
            cache.encode()
        };

        let result = match document {
            Ok(bytes) => CacheStore::write_document(self.cache_path.clone(), bytes).await,
            Err(e) => Err(e),
        };
        result.err()
    }
}

/// Load the cache document, applying the corrupt-document policy
fn load_cache(config: &ManagerConfig) -> Result<CacheStore, CacheError> {
    match CacheStore::load(&config.cache_path) {
        Ok(store) => Ok(store),
        Err(CacheError::CorruptCache { path, reason }) if config.reset_corrupt_cache => {
            warn!(path = %path.display(), reason = %reason, "Cache document is corrupt, starting empty");

            match CacheStore::quarantine_corrupt(&path) {
                Ok(moved) => warn!("Corrupt cache document kept at {}", moved.display()),
                Err(e) => warn!(
                    error = %e,
                    "Could not move corrupt cache document aside; it will be replaced on next write"
                ),
            }

            Ok(CacheStore::empty(path))
        }
        Err(e) => Err(e),
    }
}
