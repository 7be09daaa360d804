// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error types for the pipeline engine

use tally_storage::StoreError;
use thiserror::Error;

/// Errors surfaced by the executor and the manager loop.
///
/// Scheduler failures never appear here; they end the pipeline as `failed`.
#[derive(Debug, Error)]
pub enum ExecutorError {
    #[error("ledger error: {0}")]
    Ledger(#[from] StoreError),
    #[error("directory lock error: {0}")]
    DirectoryLock(StoreError),
    #[error("stage {stage} has {jobs} jobs, more than the ledger can count")]
    StageTooLarge { stage: usize, jobs: usize },
}

impl ExecutorError {
    /// Contention that a later cycle may get past
    pub fn is_retryable(&self) -> bool {
        match self {
            ExecutorError::Ledger(e) | ExecutorError::DirectoryLock(e) => e.is_retryable(),
            ExecutorError::StageTooLarge { .. } => false,
        }
    }
}
