//! Crash-safe file replacement helpers.
//!
//! Container saves never write the backing file in place. The full
//! contents go to a `.tmp` sibling first, are fsynced, and the sibling
//! is renamed over the destination. On platforms where rename refuses
//! to replace an existing file, the destination is removed and the
//! rename retried.

use std::ffi::OsString;
use std::fs::{self, File};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

/// Temporary sibling path used during an atomic replace.
fn tmp_path(path: &Path) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(".tmp");
    PathBuf::from(name)
}

/// Atomically replace the contents of `path` with `bytes`.
pub fn replace_file(path: &Path, bytes: &[u8]) -> Result<()> {
    let tmp = tmp_path(path);
    {
        let mut file = File::create(&tmp)
            .with_context(|| format!("failed to create {}", tmp.display()))?;
        file.write_all(bytes)
            .with_context(|| format!("failed to write {}", tmp.display()))?;
        file.sync_all()
            .with_context(|| format!("failed to sync {}", tmp.display()))?;
    }

    if fs::rename(&tmp, path).is_err() {
        // Windows refuses to rename over an existing destination.
        match fs::remove_file(path) {
            Ok(()) => {}
            Err(err) if err.kind() == ErrorKind::NotFound => {}
            Err(err) => {
                return Err(err)
                    .with_context(|| format!("failed to remove {}", path.display()));
            }
        }
        fs::rename(&tmp, path)
            .with_context(|| format!("failed to rename {} over {}", tmp.display(), path.display()))?;
    }
    Ok(())
}

/// Remove `path` if present. Returns true if a file was removed.
pub fn remove_if_exists(path: &Path) -> Result<bool> {
    match fs::remove_file(path) {
        Ok(()) => Ok(true),
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(false),
        Err(err) => Err(err).with_context(|| format!("failed to remove {}", path.display())),
    }
}
