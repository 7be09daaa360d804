// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Exclusive access to a whole directory tree
//!
//! A manager acquires the directory lock before touching any data under the
//! tree and releases it when its unit of work is done. Unlike the ledger, the
//! lock is not tied to a pipeline.

use crate::record::{deserialize_owner, require_assignable, Record, RecordFile};
use crate::StoreError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tally_core::{directory_lock_path, LockSettings, ManagerId};

/// Persisted directory lock state
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DirectoryLockRecord {
    #[serde(deserialize_with = "deserialize_owner")]
    pub owner_id: Option<ManagerId>,
    pub locked: bool,
}

impl DirectoryLockRecord {
    fn held_by(owner: ManagerId) -> Self {
        Self {
            owner_id: Some(owner),
            locked: true,
        }
    }

    /// Owner that currently holds the lock, if any
    pub fn holder(&self) -> Option<ManagerId> {
        if self.locked {
            self.owner_id
        } else {
            None
        }
    }
}

impl Record for DirectoryLockRecord {
    fn validate(&self) -> Result<(), String> {
        if self.locked && self.owner_id.is_none() {
            return Err("locked without an owner".to_string());
        }
        Ok(())
    }
}

/// Advisory lock over a directory tree, persisted as a small record
#[derive(Debug, Clone)]
pub struct DirectoryLock {
    file: RecordFile<DirectoryLockRecord>,
    settings: LockSettings,
}

impl DirectoryLock {
    /// Lock guarding `dir`, stored inside the tree itself
    pub fn for_directory(dir: &Path, settings: LockSettings) -> Self {
        Self::at(directory_lock_path(dir), settings)
    }

    /// Lock stored at an explicit record path
    pub fn at(path: impl Into<PathBuf>, settings: LockSettings) -> Self {
        Self {
            file: RecordFile::new(path, settings),
            settings,
        }
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }

    /// Take the lock for `owner`.
    ///
    /// Re-acquiring a lock already held by `owner` succeeds. A lock held by
    /// another manager is waited on for up to `settings.timeout`, after which
    /// `LockTimeout` names the holder.
    ///
    /// `force_reset` overwrites any existing lock without waiting, even one
    /// whose record is corrupt. It exists for deadlock recovery and is unsafe
    /// if the holder is still active.
    pub fn acquire(&self, owner: ManagerId, force_reset: bool) -> Result<(), StoreError> {
        require_assignable(self.path(), owner)?;

        if force_reset {
            // Only for the log line; an unreadable record is overwritten anyway
            let previous = self.file.read().ok().and_then(|record| record.holder());
            self.file.replace(&DirectoryLockRecord::held_by(owner))?;
            tracing::warn!(
                path = %self.path().display(),
                %owner,
                previous = ?previous,
                "directory lock force-reset"
            );
            return Ok(());
        }

        let start = Instant::now();
        loop {
            let blocked_by = self.file.update(|record| match record.holder() {
                Some(current) if current != owner => Ok(Some(current)),
                _ => {
                    *record = DirectoryLockRecord::held_by(owner);
                    Ok(None)
                }
            })?;

            let Some(holder) = blocked_by else {
                tracing::info!(path = %self.path().display(), %owner, "directory lock acquired");
                return Ok(());
            };

            let waited = start.elapsed();
            if waited >= self.settings.timeout {
                tracing::debug!(
                    path = %self.path().display(),
                    %owner,
                    %holder,
                    "directory lock busy"
                );
                return Err(StoreError::LockTimeout {
                    path: self.path().to_path_buf(),
                    waited,
                    holder: Some(holder),
                });
            }
            std::thread::sleep(
                self.settings
                    .poll_interval
                    .min(self.settings.timeout - waited),
            );
        }
    }

    /// Release a lock held by `owner`. Any other caller gets `NotOwner`.
    pub fn release(&self, owner: ManagerId) -> Result<(), StoreError> {
        let path = self.path().to_path_buf();
        self.file.update(|record| {
            let holder = record.holder();
            if holder != Some(owner) {
                return Err(StoreError::NotOwner {
                    path: path.clone(),
                    owner: holder,
                    requested: owner,
                });
            }
            *record = DirectoryLockRecord::default();
            Ok(())
        })?;
        tracing::info!(path = %path.display(), %owner, "directory lock released");
        Ok(())
    }

    /// Unlock regardless of owner. Emergency recovery only.
    pub fn force_release(&self) -> Result<(), StoreError> {
        tracing::warn!(path = %self.path().display(), "directory lock force-released");
        self.file.replace(&DirectoryLockRecord::default())
    }

    /// Fail unless the lock is currently held by `owner`
    pub fn check_owner(&self, owner: ManagerId) -> Result<(), StoreError> {
        let holder = self.holder()?;
        if holder == Some(owner) {
            Ok(())
        } else {
            Err(StoreError::NotOwner {
                path: self.path().to_path_buf(),
                owner: holder,
                requested: owner,
            })
        }
    }

    pub fn holder(&self) -> Result<Option<ManagerId>, StoreError> {
        Ok(self.file.read()?.holder())
    }

    pub fn is_locked(&self) -> Result<bool, StoreError> {
        Ok(self.holder()?.is_some())
    }
}

/// Acquire the directory lock guarding `dir`
pub fn acquire_lock(
    dir: &Path,
    owner: ManagerId,
    force_reset: bool,
    settings: LockSettings,
) -> Result<(), StoreError> {
    DirectoryLock::for_directory(dir, settings).acquire(owner, force_reset)
}

/// Release the directory lock guarding `dir`
pub fn release_lock(
    dir: &Path,
    owner: ManagerId,
    settings: LockSettings,
) -> Result<(), StoreError> {
    DirectoryLock::for_directory(dir, settings).release(owner)
}

#[cfg(test)]
#[path = "dir_lock_tests.rs"]
mod tests;
