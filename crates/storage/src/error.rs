// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Storage errors

use std::path::PathBuf;
use std::time::Duration;
use tally_core::ManagerId;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    /// Contention: the lock was not obtained in time. Retry with backoff.
    #[error("lock on {} not acquired within {}", path.display(), humantime::format_duration(*waited))]
    LockTimeout {
        path: PathBuf,
        waited: Duration,
        /// Semantic holder when the wait was on another manager, not on the file lock
        holder: Option<ManagerId>,
    },

    #[error("{} is running under manager {owner}; manager {requested} cannot take it over", path.display())]
    OwnershipConflict {
        path: PathBuf,
        owner: ManagerId,
        requested: ManagerId,
    },

    #[error("{} is not owned by manager {requested} (owner: {})", path.display(), display_owner(owner))]
    NotOwner {
        path: PathBuf,
        owner: Option<ManagerId>,
        requested: ManagerId,
    },

    #[error("manager id {owner} is reserved for unowned records and cannot take {}", path.display())]
    ReservedOwner { path: PathBuf, owner: ManagerId },

    #[error("{} is not running", path.display())]
    NotRunning { path: PathBuf },

    #[error("corrupt record {}: {source}", path.display())]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("inconsistent record {}: {reason}", path.display())]
    Inconsistent { path: PathBuf, reason: String },

    #[error("io error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl StoreError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        StoreError::Io {
            path: path.into(),
            source,
        }
    }

    /// Only contention is worth retrying; everything else needs a human or a code fix
    pub fn is_retryable(&self) -> bool {
        matches!(self, StoreError::LockTimeout { .. })
    }

    /// The caller acted on a record it does not own
    pub fn is_ownership(&self) -> bool {
        matches!(
            self,
            StoreError::OwnershipConflict { .. }
                | StoreError::NotOwner { .. }
                | StoreError::NotRunning { .. }
        )
    }
}

fn display_owner(owner: &Option<ManagerId>) -> String {
    match owner {
        Some(id) => id.to_string(),
        None => "none".to_string(),
    }
}
