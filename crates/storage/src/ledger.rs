// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Pipeline progress ledger
//!
//! One record per pipeline instance. It arbitrates which manager drives the
//! pipeline and counts how many jobs of the current run have reported success.

use crate::record::{deserialize_owner, require_assignable, Record, RecordFile};
use crate::StoreError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tally_core::{ledger_path, LockSettings, ManagerId, PipelineKind};

/// Persisted ledger state
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerRecord {
    /// Current or last owner; `None` (or `0` on disk) means never owned or reset
    #[serde(deserialize_with = "deserialize_owner")]
    pub owner_id: Option<ManagerId>,
    pub running: bool,
    pub complete: bool,
    pub encountered_error: bool,
    pub job_count: u32,
    pub completed_jobs: u32,
}

impl LedgerRecord {
    /// Started at some point, then released without completing or failing
    pub fn is_aborted(&self) -> bool {
        self.owner_id.is_some() && !self.running && !self.complete && !self.encountered_error
    }

    pub fn is_held_by(&self, owner: ManagerId) -> bool {
        self.running && self.owner_id == Some(owner)
    }
}

impl Record for LedgerRecord {
    fn validate(&self) -> Result<(), String> {
        if self.completed_jobs > self.job_count {
            return Err(format!(
                "completed_jobs {} exceeds job_count {}",
                self.completed_jobs, self.job_count
            ));
        }
        if self.running && self.owner_id.is_none() {
            return Err("running without an owner".to_string());
        }
        if self.running && (self.complete || self.encountered_error) {
            return Err("running with a terminal flag set".to_string());
        }
        if self.complete && self.encountered_error {
            return Err("both complete and encountered_error".to_string());
        }
        if self.complete && self.completed_jobs != self.job_count {
            return Err(format!(
                "complete with {} of {} jobs",
                self.completed_jobs, self.job_count
            ));
        }
        Ok(())
    }
}

/// Lock-protected accessor for one pipeline's ledger.
///
/// Every method is a complete lock/read/modify/write/unlock cycle, so calls
/// from different processes never interleave.
#[derive(Debug, Clone)]
pub struct LedgerStore {
    file: RecordFile<LedgerRecord>,
}

impl LedgerStore {
    pub fn open(path: impl Into<PathBuf>, settings: LockSettings) -> Self {
        Self {
            file: RecordFile::new(path, settings),
        }
    }

    /// Ledger for `kind` running against `target_dir`
    pub fn for_pipeline(target_dir: &Path, kind: &PipelineKind, settings: LockSettings) -> Self {
        Self::open(ledger_path(target_dir, kind), settings)
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }

    /// Advisory lock guarding every mutation of the record
    pub fn lock_path(&self) -> &Path {
        self.file.lock_path()
    }

    /// Claim the pipeline for `owner` and reset progress for a run of `job_count` jobs.
    ///
    /// A repeat call by the running owner is a no-op. A running record held by
    /// anyone else yields `OwnershipConflict`. The reserved unowned id is
    /// refused with `ReservedOwner`.
    pub fn start(&self, owner: ManagerId, job_count: u32) -> Result<(), StoreError> {
        let path = self.path().to_path_buf();
        require_assignable(&path, owner)?;
        self.file.update(|record| {
            if record.running {
                return match record.owner_id {
                    Some(current) if current == owner => {
                        tracing::debug!(
                            path = %path.display(),
                            %owner,
                            "ledger already started by this owner"
                        );
                        Ok(())
                    }
                    Some(current) => Err(StoreError::OwnershipConflict {
                        path: path.clone(),
                        owner: current,
                        requested: owner,
                    }),
                    None => Err(StoreError::Inconsistent {
                        path: path.clone(),
                        reason: "running without an owner".to_string(),
                    }),
                };
            }

            *record = LedgerRecord {
                owner_id: Some(owner),
                running: job_count > 0,
                complete: job_count == 0,
                encountered_error: false,
                job_count,
                completed_jobs: 0,
            };
            tracing::info!(path = %path.display(), %owner, job_count, "ledger started");
            Ok(())
        })
    }

    /// Record one successful job; completes the run when the last job reports in
    pub fn complete_job(&self, owner: ManagerId) -> Result<LedgerRecord, StoreError> {
        let path = self.path().to_path_buf();
        self.file.update(|record| {
            require_running_owner(&path, record, owner)?;
            record.completed_jobs += 1;
            if record.completed_jobs == record.job_count {
                record.running = false;
                record.complete = true;
                tracing::info!(
                    path = %path.display(),
                    %owner,
                    jobs = record.job_count,
                    "ledger complete"
                );
            } else {
                tracing::debug!(
                    path = %path.display(),
                    completed = record.completed_jobs,
                    total = record.job_count,
                    "job completed"
                );
            }
            Ok(record.clone())
        })
    }

    /// Record a job failure. Releases the pipeline regardless of progress.
    pub fn fail_job(&self, owner: ManagerId) -> Result<(), StoreError> {
        let path = self.path().to_path_buf();
        self.file.update(|record| {
            require_running_owner(&path, record, owner)?;
            record.running = false;
            record.encountered_error = true;
            tracing::warn!(
                path = %path.display(),
                %owner,
                completed = record.completed_jobs,
                total = record.job_count,
                "ledger marked as failed"
            );
            Ok(())
        })
    }

    /// Alias of [`LedgerStore::fail_job`]
    pub fn error(&self, owner: ManagerId) -> Result<(), StoreError> {
        self.fail_job(owner)
    }

    /// Release a running pipeline without marking it complete or failed
    pub fn stop(&self, owner: ManagerId) -> Result<(), StoreError> {
        let path = self.path().to_path_buf();
        self.file.update(|record| {
            require_running_owner(&path, record, owner)?;
            record.running = false;
            tracing::info!(path = %path.display(), %owner, "ledger stopped");
            Ok(())
        })
    }

    /// Emergency reset to the unowned initial state.
    ///
    /// Callable by anyone. Unsafe if another manager is genuinely still driving
    /// the pipeline: that manager's next ledger call fails and its jobs keep running.
    pub fn abort(&self) -> Result<(), StoreError> {
        tracing::warn!(path = %self.path().display(), "ledger aborted (emergency reset)");
        self.file.replace(&LedgerRecord::default())
    }

    pub fn snapshot(&self) -> Result<LedgerRecord, StoreError> {
        self.file.read()
    }

    pub fn is_complete(&self) -> Result<bool, StoreError> {
        Ok(self.snapshot()?.complete)
    }

    pub fn encountered_error(&self) -> Result<bool, StoreError> {
        Ok(self.snapshot()?.encountered_error)
    }

    pub fn is_running(&self) -> Result<bool, StoreError> {
        Ok(self.snapshot()?.running)
    }
}

fn require_running_owner(
    path: &Path,
    record: &LedgerRecord,
    owner: ManagerId,
) -> Result<(), StoreError> {
    if record.owner_id != Some(owner) {
        return Err(StoreError::NotOwner {
            path: path.to_path_buf(),
            owner: record.owner_id,
            requested: owner,
        });
    }
    if !record.running {
        return Err(StoreError::NotRunning {
            path: path.to_path_buf(),
        });
    }
    Ok(())
}

#[cfg(test)]
#[path = "ledger_tests.rs"]
mod tests;
