//! Configuration loading and root folder resolution
//!
//! Root folder priority order:
//! 1. Command-line argument (highest priority)
//! 2. `TUNESCOUT_ROOT_FOLDER` environment variable
//! 3. `TUNESCOUT_ROOT` environment variable
//! 4. `root_folder` key of the module's TOML config file
//! 5. OS-dependent compiled default (fallback)
//!
//! A missing or unreadable TOML file is never fatal: resolution logs a
//! warning and falls through to the next tier.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Primary root folder environment variable
pub const ROOT_FOLDER_ENV: &str = "TUNESCOUT_ROOT_FOLDER";
/// Alternative root folder environment variable
pub const ROOT_ENV: &str = "TUNESCOUT_ROOT";

/// Name of the per-user config directory and default data folder
const APP_DIR_NAME: &str = "tunescout";
/// Subdirectory of the root folder holding persistent data
const DATA_DIR_NAME: &str = "data";
/// File name of the track metadata cache document
pub const CACHE_FILE_NAME: &str = "track_metadata_cache.json";

/// Built-in defaults used when nothing else is configured
#[derive(Debug, Clone)]
pub struct CompiledDefaults {
    pub root_folder: PathBuf,
    pub log_level: String,
    pub log_file: Option<PathBuf>,
    pub cache_file_name: String,
}

impl CompiledDefaults {
    pub fn for_current_platform() -> Self {
        Self {
            root_folder: default_root_folder(),
            log_level: "info".to_string(),
            log_file: None,
            cache_file_name: CACHE_FILE_NAME.to_string(),
        }
    }
}

/// OS-dependent default root folder
fn default_root_folder() -> PathBuf {
    // ~/.local/share/tunescout, ~/Library/Application Support/tunescout
    // or %LOCALAPPDATA%\tunescout
    dirs::data_local_dir()
        .map(|d| d.join(APP_DIR_NAME))
        .unwrap_or_else(|| PathBuf::from("./tunescout_data"))
}

/// Bootstrap configuration loaded from a module's TOML file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TomlConfig {
    /// Root folder for TuneScout data (optional)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub root_folder: Option<PathBuf>,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Track metadata manager settings
    #[serde(default)]
    pub metadata: MetadataSettings,

    /// Spotify Web API bearer token (optional)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spotify_token: Option<String>,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log file path (optional, logs to stderr if not specified)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: None,
        }
    }
}

/// Settings for the track metadata manager
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetadataSettings {
    /// Explicit cache document path; defaults to `<root>/data/track_metadata_cache.json`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache_path: Option<PathBuf>,

    /// Quarantine a corrupt cache document and start empty instead of failing
    #[serde(default = "default_true")]
    pub reset_corrupt_cache: bool,

    /// Base URL of the external catalog API
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    /// Per-request timeout for the external catalog
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Retries for transient external failures (429, 5xx, network)
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Minimum interval between external requests
    #[serde(default = "default_rate_limit_ms")]
    pub rate_limit_ms: u64,
}

impl Default for MetadataSettings {
    fn default() -> Self {
        Self {
            cache_path: None,
            reset_corrupt_cache: default_true(),
            api_base_url: default_api_base_url(),
            request_timeout_secs: default_request_timeout_secs(),
            max_retries: default_max_retries(),
            rate_limit_ms: default_rate_limit_ms(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_true() -> bool {
    true
}

fn default_api_base_url() -> String {
    "https://api.spotify.com/v1".to_string()
}

fn default_request_timeout_secs() -> u64 {
    10
}

fn default_max_retries() -> u32 {
    3
}

fn default_rate_limit_ms() -> u64 {
    100
}

/// Path of the per-user TOML config for `module_name`
///
/// `~/.config/tunescout/<module>.toml` on Linux, the platform config
/// directory elsewhere.
pub fn module_config_path(module_name: &str) -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join(APP_DIR_NAME).join(format!("{}.toml", module_name)))
}

/// Load a TOML config file
///
/// A missing file yields the defaults. A present but malformed file is an error.
pub fn load_toml_config(path: &Path) -> Result<TomlConfig> {
    if !path.exists() {
        debug!("Config file {} not found, using defaults", path.display());
        return Ok(TomlConfig::default());
    }

    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("Read TOML failed ({}): {}", path.display(), e)))?;

    toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Parse TOML failed ({}): {}", path.display(), e)))
}

/// Write a TOML config atomically (temp file + rename)
///
/// The file may hold an API token, so on Unix it is written with mode 0600.
pub fn write_toml_config(config: &TomlConfig, path: &Path) -> Result<()> {
    let content = toml::to_string_pretty(config)
        .map_err(|e| Error::Config(format!("Serialize TOML failed: {}", e)))?;

    crate::fs::write_atomic_private(path, content.as_bytes())?;
    Ok(())
}

/// Returns true when a TOML file is readable by group or others
#[cfg(unix)]
pub fn check_toml_permissions_loose(path: &Path) -> Result<bool> {
    use std::os::unix::fs::PermissionsExt;

    let mode = std::fs::metadata(path)?.permissions().mode();
    Ok(mode & 0o077 != 0)
}

/// Resolves the root folder following the priority order in the module docs
pub struct RootFolderResolver {
    module_name: String,
    cli_arg: Option<PathBuf>,
}

impl RootFolderResolver {
    pub fn new(module_name: &str) -> Self {
        Self {
            module_name: module_name.to_string(),
            cli_arg: None,
        }
    }

    /// Highest-priority override, usually from `--root-folder`
    pub fn with_cli_arg(mut self, cli_arg: Option<PathBuf>) -> Self {
        self.cli_arg = cli_arg;
        self
    }

    /// Path of this module's TOML config file
    pub fn config_file_path(&self) -> Option<PathBuf> {
        module_config_path(&self.module_name)
    }

    pub fn resolve(&self) -> PathBuf {
        if let Some(path) = &self.cli_arg {
            return path.clone();
        }

        for var in [ROOT_FOLDER_ENV, ROOT_ENV] {
            if let Ok(path) = std::env::var(var) {
                if !path.trim().is_empty() {
                    return PathBuf::from(path);
                }
            }
        }

        if let Some(config_path) = self.config_file_path() {
            match load_toml_config(&config_path) {
                Ok(TomlConfig {
                    root_folder: Some(root_folder),
                    ..
                }) => return root_folder,
                Ok(_) => {}
                Err(e) => warn!("Ignoring config file: {}", e),
            }
        }

        CompiledDefaults::for_current_platform().root_folder
    }
}

/// Creates the root folder layout and derives data file paths from it
pub struct RootFolderInitializer {
    root_folder: PathBuf,
}

impl RootFolderInitializer {
    pub fn new(root_folder: PathBuf) -> Self {
        Self { root_folder }
    }

    pub fn root_folder(&self) -> &Path {
        &self.root_folder
    }

    pub fn data_dir(&self) -> PathBuf {
        self.root_folder.join(DATA_DIR_NAME)
    }

    /// Default location of the track metadata cache document
    pub fn cache_path(&self) -> PathBuf {
        self.data_dir().join(CACHE_FILE_NAME)
    }

    pub fn cache_exists(&self) -> bool {
        self.cache_path().exists()
    }

    /// Create the root folder and its data directory (idempotent)
    pub fn ensure_directory_exists(&self) -> Result<()> {
        std::fs::create_dir_all(self.data_dir()).map_err(|e| {
            Error::Config(format!(
                "Failed to create root folder {}: {}",
                self.root_folder.display(),
                e
            ))
        })
    }
}
