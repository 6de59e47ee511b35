//! Atomic file writes
//!
//! Writers produce `<target>.tmp` next to the target, flush it to disk and
//! rename it over the target. A crash mid-write leaves either the previous
//! document or the new one, never a truncated file.

use std::ffi::OsString;
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// Path of the temporary sibling used while writing `target`
pub fn temp_path_for(target: &Path) -> PathBuf {
    let mut name = target
        .file_name()
        .map(OsString::from)
        .unwrap_or_else(|| OsString::from("unnamed"));
    name.push(".tmp");
    target.with_file_name(name)
}

/// Atomically replace `target` with `contents`
///
/// Missing parent directories are created.
pub fn write_atomic(target: &Path, contents: &[u8]) -> io::Result<()> {
    write_atomic_with_mode(target, contents, None)
}

/// Atomically replace `target` with `contents`, readable by the owner only
///
/// On Unix the file ends up with mode 0600. Other platforms ignore the mode.
pub fn write_atomic_private(target: &Path, contents: &[u8]) -> io::Result<()> {
    write_atomic_with_mode(target, contents, Some(0o600))
}

fn write_atomic_with_mode(target: &Path, contents: &[u8], mode: Option<u32>) -> io::Result<()> {
    if let Some(parent) = target.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let temp_path = temp_path_for(target);

    let result = (|| {
        let mut file = File::create(&temp_path)?;
        file.write_all(contents)?;
        file.sync_all()?;
        drop(file);

        set_mode(&temp_path, mode)?;
        fs::rename(&temp_path, target)
    })();

    if result.is_err() {
        // Leave no stray temp file behind; the target is untouched
        let _ = fs::remove_file(&temp_path);
    }

    result
}

#[cfg(unix)]
fn set_mode(path: &Path, mode: Option<u32>) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;

    if let Some(mode) = mode {
        fs::set_permissions(path, fs::Permissions::from_mode(mode))?;
    }
    Ok(())
}

#[cfg(not(unix))]
fn set_mode(_path: &Path, _mode: Option<u32>) -> io::Result<()> {
    Ok(())
}
