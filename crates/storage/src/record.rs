// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Transactional access to a small JSON record on disk

use crate::{FileLock, StoreError};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use std::io::Write;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use tally_core::{LockSettings, ManagerId};

/// A value persisted by [`RecordFile`].
///
/// The default value is what a missing file reads as.
pub trait Record: Serialize + DeserializeOwned + Default + Clone + PartialEq {
    /// Reject decoded values that break the record's invariants
    fn validate(&self) -> Result<(), String> {
        Ok(())
    }
}

/// Lock, read, mutate, write, unlock as a single operation.
///
/// The record lives at `path`; its advisory lock at `path` + `.lock`. Writes go
/// to a temporary file in the same directory which is then renamed over the
/// record, so a crash never leaves a half-written record behind.
#[derive(Debug, Clone)]
pub struct RecordFile<T> {
    path: PathBuf,
    lock_path: PathBuf,
    settings: LockSettings,
    _record: PhantomData<fn() -> T>,
}

impl<T: Record> RecordFile<T> {
    pub fn new(path: impl Into<PathBuf>, settings: LockSettings) -> Self {
        let path = path.into();
        let mut lock_name = path.as_os_str().to_os_string();
        lock_name.push(".lock");
        Self {
            lock_path: PathBuf::from(lock_name),
            path,
            settings,
            _record: PhantomData,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn lock_path(&self) -> &Path {
        &self.lock_path
    }

    pub fn settings(&self) -> &LockSettings {
        &self.settings
    }

    /// Whether the record has been materialized on disk
    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Consistent snapshot of the record
    pub fn read(&self) -> Result<T, StoreError> {
        let _guard = FileLock::acquire(&self.lock_path, &self.settings)?;
        self.load()
    }

    /// Apply `f` to the record under the lock.
    ///
    /// Nothing is written when `f` fails or leaves the record unchanged.
    pub fn update<R>(
        &self,
        f: impl FnOnce(&mut T) -> Result<R, StoreError>,
    ) -> Result<R, StoreError> {
        let _guard = FileLock::acquire(&self.lock_path, &self.settings)?;
        let before = self.load()?;
        let mut record = before.clone();
        let out = f(&mut record)?;
        if record != before {
            self.store(&record)?;
        }
        Ok(out)
    }

    /// Overwrite the record regardless of its current content.
    ///
    /// Does not decode the existing file, so this also recovers corrupt records.
    pub fn replace(&self, value: &T) -> Result<(), StoreError> {
        let _guard = FileLock::acquire(&self.lock_path, &self.settings)?;
        self.store(value)
    }

    fn load(&self) -> Result<T, StoreError> {
        let bytes = match std::fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(T::default()),
            Err(e) => return Err(StoreError::io(&self.path, e)),
        };
        let record: T = serde_json::from_slice(&bytes).map_err(|source| StoreError::Corrupt {
            path: self.path.clone(),
            source,
        })?;
        record
            .validate()
            .map_err(|reason| StoreError::Inconsistent {
                path: self.path.clone(),
                reason,
            })?;
        Ok(record)
    }

    fn store(&self, value: &T) -> Result<(), StoreError> {
        let parent = match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        std::fs::create_dir_all(&parent).map_err(|e| StoreError::io(&parent, e))?;

        let json = serde_json::to_vec_pretty(value).map_err(|source| StoreError::Corrupt {
            path: self.path.clone(),
            source,
        })?;

        let mut temp =
            tempfile::NamedTempFile::new_in(&parent).map_err(|e| StoreError::io(&parent, e))?;
        temp.write_all(&json)
            .and_then(|()| temp.as_file().sync_all())
            .map_err(|e| StoreError::io(temp.path(), e))?;
        temp.persist(&self.path)
            .map_err(|e| StoreError::io(&self.path, e.error))?;
        Ok(())
    }
}

/// Owner field shared by every record: `null` and `0` both read as unowned
pub(crate) fn deserialize_owner<'de, D>(deserializer: D) -> Result<Option<ManagerId>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<u64> = Option::deserialize(deserializer)?;
    Ok(raw.map(ManagerId).filter(|id| !id.is_unowned()))
}

/// Reject the reserved id before it is written as an owner
pub(crate) fn require_assignable(path: &Path, owner: ManagerId) -> Result<(), StoreError> {
    if owner.is_unowned() {
        return Err(StoreError::ReservedOwner {
            path: path.to_path_buf(),
            owner,
        });
    }
    Ok(())
}

#[cfg(test)]
#[path = "record_tests.rs"]
mod tests;
