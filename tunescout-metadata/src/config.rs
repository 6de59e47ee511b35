//! Configuration resolution for tunescout-metadata
//!
//! Builds the manager settings from the shared TOML config and the root
//! folder layout, and resolves the Spotify token with ENV → TOML priority.

use std::path::PathBuf;
use tracing::{info, warn};
use tunescout_common::config::{RootFolderInitializer, TomlConfig};

/// Environment variable carrying the Spotify bearer token
pub const SPOTIFY_TOKEN_ENV: &str = "TUNESCOUT_SPOTIFY_TOKEN";

/// Settings needed to construct a `TrackMetadataManager`
#[derive(Debug, Clone)]
pub struct ManagerConfig {
    /// Location of the JSON cache document
    pub cache_path: PathBuf,
    /// Quarantine a corrupt document and start empty instead of failing
    pub reset_corrupt_cache: bool,
}

impl ManagerConfig {
    pub fn new(cache_path: impl Into<PathBuf>) -> Self {
        Self {
            cache_path: cache_path.into(),
            reset_corrupt_cache: true,
        }
    }

    pub fn with_reset_corrupt_cache(mut self, reset: bool) -> Self {
        self.reset_corrupt_cache = reset;
        self
    }

    /// Derive from TOML settings; an explicit `cache_path` wins over the
    /// root folder default
    pub fn from_toml(toml_config: &TomlConfig, root: &RootFolderInitializer) -> Self {
        let cache_path = toml_config
            .metadata
            .cache_path
            .clone()
            .unwrap_or_else(|| root.cache_path());

        Self {
            cache_path,
            reset_corrupt_cache: toml_config.metadata.reset_corrupt_cache,
        }
    }
}

/// Resolve the Spotify token
///
/// **Priority:** ENV → TOML. `None` means the manager runs without an
/// external source.
pub fn resolve_spotify_token(toml_config: &TomlConfig) -> Option<String> {
    let env_token = std::env::var(SPOTIFY_TOKEN_ENV)
        .ok()
        .filter(|t| is_valid_token(t));
    let toml_token = toml_config
        .spotify_token
        .clone()
        .filter(|t| is_valid_token(t));

    if env_token.is_some() && toml_token.is_some() {
        warn!("Spotify token found in both environment and TOML. Using environment (highest priority).");
    }

    if let Some(token) = env_token {
        info!("Spotify token loaded from environment variable");
        return Some(token.trim().to_string());
    }

    if let Some(token) = toml_token {
        info!("Spotify token loaded from TOML config");
        return Some(token.trim().to_string());
    }

    None
}

/// Validate token (non-empty, non-whitespace)
pub fn is_valid_token(token: &str) -> bool {
    !token.trim().is_empty()
}
