//! Atomic file replacement
//!
//! Shared by the snapshot writer and the checkpoint tracker.

use std::ffi::OsString;
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::error::Result;

/// Suffix appended to a target's file name for its temporary twin
pub const TEMP_SUFFIX: &str = ".tmp";

/// `db.json` → `db.json.tmp`
pub fn temp_path(path: &Path) -> PathBuf {
    let mut name: OsString = path.file_name().map(OsString::from).unwrap_or_default();
    name.push(TEMP_SUFFIX);
    path.with_file_name(name)
}

/// Replace `path` with `bytes` so that `path` is never observed half-written
///
/// 1. Write `bytes` to the temp file
/// 2. Flush and fsync the temp file
/// 3. Rename the temp file over `path`
/// 4. Fsync the parent directory (when `sync_directory`)
pub fn write_atomic(path: &Path, bytes: &[u8], sync_directory: bool) -> Result<()> {
    let temp = temp_path(path);

    let mut file = File::create(&temp)?;
    file.write_all(bytes)?;
    file.flush()?;
    file.sync_all()?;
    drop(file);

    fs::rename(&temp, path)?;

    if sync_directory {
        sync_parent_dir(path)?;
    }

    debug!(path = %path.display(), bytes = bytes.len(), "Atomically replaced file");
    Ok(())
}

/// Fsync the directory containing `path` so renames and creations are durable
#[cfg(unix)]
pub fn sync_parent_dir(path: &Path) -> Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    File::open(dir)?.sync_all()?;
    Ok(())
}

#[cfg(not(unix))]
pub fn sync_parent_dir(_path: &Path) -> Result<()> {
    // NTFS journals metadata; directories cannot be opened for fsync
    Ok(())
}

/// Delete a leftover temp file for `path`, if any
///
/// Only called while no writer can be mid-write. Returns whether a file was
/// removed; failures are logged, never fatal.
pub fn remove_stale_temp(path: &Path) -> bool {
    let temp = temp_path(path);

    match fs::remove_file(&temp) {
        Ok(()) => {
            warn!(path = %temp.display(), "Removed leftover temporary file");
            true
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => false,
        Err(e) => {
            warn!(path = %temp.display(), error = %e, "Could not remove leftover temporary file");
            false
        }
    }
}
