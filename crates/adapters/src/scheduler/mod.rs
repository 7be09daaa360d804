// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Remote scheduler adapters
//!
//! The coordinator never waits on a job. It submits, then polls for a terminal
//! status on later cycles.

mod shell;

pub use shell::ShellScheduler;

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
mod fake;
#[cfg(any(test, feature = "test-support"))]
pub use fake::{FakeJob, FakeScheduler, SchedulerCall};

use async_trait::async_trait;
use tally_core::Job;
use thiserror::Error;

/// Scheduler-assigned identifier of a submitted job
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct JobHandle(pub String);

impl JobHandle {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for JobHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Observed state of a submitted job
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobStatus {
    /// Queued or executing
    Pending,
    Succeeded,
    Failed,
}

impl JobStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, JobStatus::Pending)
    }
}

/// Errors from scheduler operations
#[derive(Debug, Error)]
pub enum SchedulerError {
    #[error("failed to submit job {job}: {reason}")]
    SubmitFailed { job: String, reason: String },
    #[error("unknown job: {0}")]
    UnknownJob(JobHandle),
    #[error("failed to query job {handle}: {reason}")]
    PollFailed { handle: JobHandle, reason: String },
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Adapter for the batch scheduler that executes pipeline jobs
#[async_trait]
pub trait SchedulerAdapter: Clone + Send + Sync + 'static {
    /// Dispatch a job and return its handle without waiting for it to run
    async fn submit(&self, job: &Job) -> Result<JobHandle, SchedulerError>;

    /// Current status of a previously submitted job
    async fn poll(&self, handle: &JobHandle) -> Result<JobStatus, SchedulerError>;

    /// Stop a job that has not finished
    async fn cancel(&self, handle: &JobHandle) -> Result<(), SchedulerError>;

    /// Delete the job's log directory
    async fn remove_logs(&self, job: &Job) -> Result<(), SchedulerError>;
}
