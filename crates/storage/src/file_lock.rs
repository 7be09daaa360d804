// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Timeout-bounded exclusive advisory file lock

use crate::StoreError;
use fs2::FileExt;
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tally_core::LockSettings;

/// RAII guard over an exclusively locked file.
///
/// The lock is released when the guard is dropped. The lock file itself is
/// never deleted, so every process agrees on the inode being locked.
#[derive(Debug)]
pub struct FileLock {
    file: File,
    path: PathBuf,
}

impl FileLock {
    /// Try once without waiting
    pub fn try_acquire(path: &Path) -> Result<Option<Self>, StoreError> {
        let file = open_lock_file(path)?;
        match file.try_lock_exclusive() {
            Ok(()) => Ok(Some(Self {
                file,
                path: path.to_path_buf(),
            })),
            Err(e) if is_contended(&e) => Ok(None),
            Err(e) => Err(StoreError::io(path, e)),
        }
    }

    /// Poll until the lock is held or `settings.timeout` elapses
    pub fn acquire(path: &Path, settings: &LockSettings) -> Result<Self, StoreError> {
        let start = Instant::now();
        loop {
            if let Some(lock) = Self::try_acquire(path)? {
                tracing::trace!(
                    path = %path.display(),
                    waited_us = start.elapsed().as_micros() as u64,
                    "file lock acquired"
                );
                return Ok(lock);
            }

            let waited = start.elapsed();
            if waited >= settings.timeout {
                tracing::debug!(path = %path.display(), "file lock timed out");
                return Err(StoreError::LockTimeout {
                    path: path.to_path_buf(),
                    waited,
                    holder: None,
                });
            }
            std::thread::sleep(settings.poll_interval.min(settings.timeout - waited));
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for FileLock {
    fn drop(&mut self) {
        if let Err(e) = FileExt::unlock(&self.file) {
            tracing::warn!(path = %self.path.display(), error = %e, "failed to release file lock");
        }
    }
}

fn open_lock_file(path: &Path) -> Result<File, StoreError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| StoreError::io(parent, e))?;
    }
    OpenOptions::new()
        .read(true)
        .write(true)
        .create(true)
        .truncate(false)
        .open(path)
        .map_err(|e| StoreError::io(path, e))
}

fn is_contended(e: &std::io::Error) -> bool {
    e.kind() == std::io::ErrorKind::WouldBlock
        || e.raw_os_error() == fs2::lock_contended_error().raw_os_error()
}

#[cfg(test)]
#[path = "file_lock_tests.rs"]
mod tests;
