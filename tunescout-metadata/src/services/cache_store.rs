//! Durable track metadata cache
//!
//! One JSON object on disk, keyed by track identifier:
//!
//! ```json
//! {
//!   "0VjIjW4GlUZAMYd2vXMi3b": { "title": "Blinding Lights", "artists": ["The Weeknd"] }
//! }
//! ```
//!
//! The document is loaded once and rewritten in full after every `put`,
//! using temp file + rename so a crash never leaves a truncated document.
//! Keys are written sorted and pretty-printed so the file stays readable
//! and hand-editable between runs.

use crate::error::CacheError;
use crate::models::{normalize_track_id, MetadataRecord};
use std::collections::{BTreeMap, HashMap};
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Suffix given to a corrupt document moved out of the way
const CORRUPT_SUFFIX: &str = "corrupt";

/// In-memory cache mapping backed by a JSON document
#[derive(Debug)]
pub struct CacheStore {
    path: PathBuf,
    entries: HashMap<String, MetadataRecord>,
}

impl CacheStore {
    /// Empty store that will persist to `path` on first `put`
    pub fn empty(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            entries: HashMap::new(),
        }
    }

    /// Load the document at `path`
    ///
    /// A missing document yields an empty store. A document that is not a
    /// JSON object fails with `CorruptCache`. Individual entries that do not
    /// form a valid record are skipped with a warning.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self, CacheError> {
        let path = path.into();

        let content = match std::fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "No cache document yet, starting empty");
                return Ok(Self::empty(path));
            }
            Err(e) if e.kind() == io::ErrorKind::InvalidData => {
                return Err(CacheError::CorruptCache {
                    path,
                    reason: e.to_string(),
                });
            }
            Err(e) => {
                return Err(CacheError::Unreadable {
                    path,
                    reason: e.to_string(),
                });
            }
        };

        let document: BTreeMap<String, serde_json::Value> = serde_json::from_str(&content)
            .map_err(|e| CacheError::CorruptCache {
                path: path.clone(),
                reason: e.to_string(),
            })?;

        let mut entries = HashMap::with_capacity(document.len());
        for (raw_id, value) in document {
            let Some(track_id) = normalize_track_id(&raw_id) else {
                warn!("Skipping cache entry with a blank track id");
                continue;
            };

            let record = match serde_json::from_value::<MetadataRecord>(value) {
                Ok(record) if record.is_valid() => record,
                Ok(_) => {
                    warn!(track_id = %track_id, "Skipping cache entry without title or artists");
                    continue;
                }
                Err(e) => {
                    warn!(track_id = %track_id, error = %e, "Skipping malformed cache entry");
                    continue;
                }
            };

            if track_id == raw_id {
                entries.insert(raw_id, record);
            } else {
                // Lookups use the trimmed id; an exact key wins over a padded one
                warn!(key = ?raw_id, track_id = %track_id, "Trimming whitespace around cache key");
                entries.entry(track_id.to_string()).or_insert(record);
            }
        }

        info!(
            path = %path.display(),
            entries = entries.len(),
            "Loaded track metadata cache"
        );

        Ok(Self { path, entries })
    }

    /// Move a corrupt document to `<path>.corrupt`, returning the new location
    ///
    /// An earlier quarantined copy is overwritten.
    pub fn quarantine_corrupt(path: &Path) -> io::Result<PathBuf> {
        let mut name = path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".");
        name.push(CORRUPT_SUFFIX);
        let target = path.with_file_name(name);

        std::fs::rename(path, &target)?;
        Ok(target)
    }

    pub fn get(&self, track_id: &str) -> Option<MetadataRecord> {
        self.entries.get(track_id).cloned()
    }

    pub fn contains(&self, track_id: &str) -> bool {
        self.entries.contains_key(track_id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// All entries sorted by track identifier
    pub fn snapshot(&self) -> Vec<(String, MetadataRecord)> {
        let mut entries: Vec<(String, MetadataRecord)> = self
            .entries
            .iter()
            .map(|(id, record)| (id.clone(), record.clone()))
            .collect();
        entries.sort_by(|a, b| a.0.cmp(&b.0));
        entries
    }

    /// Insert or overwrite an entry without touching the disk
    pub fn insert(&mut self, track_id: &str, record: MetadataRecord) {
        self.entries.insert(track_id.to_string(), record);
    }

    /// Insert or overwrite an entry, then persist the whole mapping
    ///
    /// The in-memory entry is kept even when the flush fails; the failure
    /// is returned as `CacheError::Persistence`.
    pub async fn put(&mut self, track_id: &str, record: MetadataRecord) -> Result<(), CacheError> {
        self.insert(track_id, record);
        self.flush().await
    }

    /// Write the full mapping to disk atomically
    pub async fn flush(&self) -> Result<(), CacheError> {
        let bytes = self.encode()?;
        Self::write_document(self.path.clone(), bytes).await
    }

    /// Serialize the mapping as the on-disk document: sorted keys,
    /// pretty-printed, trailing newline
    pub fn encode(&self) -> Result<Vec<u8>, CacheError> {
        let sorted: BTreeMap<&str, &MetadataRecord> = self
            .entries
            .iter()
            .map(|(id, record)| (id.as_str(), record))
            .collect();

        let mut bytes = serde_json::to_vec_pretty(&sorted)
            .map_err(|e| persistence_error(&self.path, e.to_string()))?;
        bytes.push(b'\n');
        Ok(bytes)
    }

    /// Atomically replace the document at `path` with `bytes`
    ///
    /// Runs on the blocking pool; holds no borrow of the store, so callers
    /// can release their lock on the mapping before the disk write.
    pub async fn write_document(path: PathBuf, bytes: Vec<u8>) -> Result<(), CacheError> {
        let target = path.clone();
        let size = bytes.len();

        let write_result = tokio::task::spawn_blocking(move || {
            tunescout_common::fs::write_atomic(&target, &bytes)
        })
        .await;

        match write_result {
            Ok(Ok(())) => {
                debug!(path = %path.display(), bytes = size, "Cache flushed");
                Ok(())
            }
            Ok(Err(e)) => Err(persistence_error(&path, e.to_string())),
            Err(join_error) => Err(persistence_error(&path, join_error.to_string())),
        }
    }
}

fn persistence_error(path: &Path, reason: String) -> CacheError {
    CacheError::Persistence {
        path: path.to_path_buf(),
        reason,
    }
}
