//! Unit tests for TOML atomic write utilities
//!
//! Covers temp + rename writes, field preservation and 0600 permissions.

#[cfg(unix)]
use tunescout_common::config::check_toml_permissions_loose;
use std::path::PathBuf;
use tempfile::TempDir;
use tunescout_common::config::{write_toml_config, LoggingConfig, MetadataSettings, TomlConfig};
use tunescout_common::fs::temp_path_for;

fn sample_config() -> TomlConfig {
    TomlConfig {
        root_folder: Some(PathBuf::from("/music")),
        logging: LoggingConfig::default(),
        metadata: MetadataSettings::default(),
        spotify_token: Some("token123".to_string()),
    }
}

#[test]
fn test_atomic_write_leaves_no_temp_file() {
    let temp_dir = TempDir::new().unwrap();
    let target = temp_dir.path().join("test.toml");

    write_toml_config(&sample_config(), &target).unwrap();

    assert!(target.exists());
    assert!(!temp_path_for(&target).exists());
}

#[test]
fn test_atomic_write_renames_to_target() {
    let temp_dir = TempDir::new().unwrap();
    let target = temp_dir.path().join("test.toml");

    write_toml_config(&sample_config(), &target).unwrap();

    let content = std::fs::read_to_string(&target).unwrap();
    assert!(content.contains("spotify_token"));
    assert!(content.contains("token123"));
}

#[test]
fn test_roundtrip_serialization_preserves_data() {
    let temp_dir = TempDir::new().unwrap();
    let target = temp_dir.path().join("test.toml");

    let mut config = sample_config();
    config.metadata.cache_path = Some(PathBuf::from("/cache/tracks.json"));
    config.metadata.rate_limit_ms = 250;

    write_toml_config(&config, &target).unwrap();

    let content = std::fs::read_to_string(&target).unwrap();
    let parsed: TomlConfig = toml::from_str(&content).unwrap();

    assert_eq!(parsed.root_folder, config.root_folder);
    assert_eq!(parsed.spotify_token, config.spotify_token);
    assert_eq!(parsed.metadata.cache_path, config.metadata.cache_path);
    assert_eq!(parsed.metadata.rate_limit_ms, 250);
}

#[test]
#[cfg(unix)]
fn test_atomic_write_sets_permissions_0600() {
    use std::os::unix::fs::PermissionsExt;

    let temp_dir = TempDir::new().unwrap();
    let target = temp_dir.path().join("test.toml");

    write_toml_config(&sample_config(), &target).unwrap();

    let mode = std::fs::metadata(&target).unwrap().permissions().mode();
    assert_eq!(mode & 0o777, 0o600);
}

#[test]
#[cfg(unix)]
fn test_check_permissions_detects_loose() {
    use std::os::unix::fs::PermissionsExt;

    let temp_dir = TempDir::new().unwrap();
    let target = temp_dir.path().join("test.toml");

    std::fs::write(&target, "test").unwrap();
    let mut perms = std::fs::metadata(&target).unwrap().permissions();
    perms.set_mode(0o644);
    std::fs::set_permissions(&target, perms).unwrap();

    assert!(check_toml_permissions_loose(&target).unwrap());

    let mut perms = std::fs::metadata(&target).unwrap().permissions();
    perms.set_mode(0o600);
    std::fs::set_permissions(&target, perms).unwrap();

    assert!(!check_toml_permissions_loose(&target).unwrap());
}
