// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fake scheduler adapter for testing
#![cfg_attr(coverage_nightly, coverage(off))]

use super::{JobHandle, JobStatus, SchedulerAdapter, SchedulerError};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use tally_core::Job;

/// Recorded scheduler call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchedulerCall {
    Submit { job: String },
    Poll { handle: JobHandle },
    Cancel { handle: JobHandle },
    RemoveLogs { job: String },
}

/// Fake job state
#[derive(Debug, Clone)]
pub struct FakeJob {
    pub job: Job,
    pub handle: JobHandle,
    pub status: JobStatus,
    pub cancelled: bool,
    pub logs_removed: bool,
}

#[derive(Default)]
struct FakeState {
    jobs: Vec<FakeJob>,
    calls: Vec<SchedulerCall>,
    outcomes: HashMap<String, JobStatus>,
    submit_failures: HashSet<String>,
    poll_failures: HashMap<String, u32>,
}

impl FakeState {
    fn job_mut(&mut self, handle: &JobHandle) -> Result<&mut FakeJob, SchedulerError> {
        self.jobs
            .iter_mut()
            .find(|j| &j.handle == handle)
            .ok_or_else(|| SchedulerError::UnknownJob(handle.clone()))
    }
}

/// Fake scheduler adapter for testing
///
/// Jobs stay `Pending` until a test settles them, unless an outcome was
/// registered for the job name before submission.
#[derive(Clone, Default)]
pub struct FakeScheduler {
    state: Arc<Mutex<FakeState>>,
}

impl FakeScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> std::sync::MutexGuard<'_, FakeState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Get all recorded calls
    pub fn calls(&self) -> Vec<SchedulerCall> {
        self.state().calls.clone()
    }

    /// Names of submitted jobs, in submission order
    pub fn submitted(&self) -> Vec<String> {
        self.state().jobs.iter().map(|j| j.job.name.clone()).collect()
    }

    pub fn get_job(&self, name: &str) -> Option<FakeJob> {
        self.state()
            .jobs
            .iter()
            .rev()
            .find(|j| j.job.name == name)
            .cloned()
    }

    pub fn handle_for(&self, name: &str) -> Option<JobHandle> {
        self.get_job(name).map(|j| j.handle)
    }

    pub fn is_cancelled(&self, name: &str) -> bool {
        self.get_job(name).is_some_and(|j| j.cancelled)
    }

    pub fn logs_removed(&self, name: &str) -> bool {
        self.get_job(name).is_some_and(|j| j.logs_removed)
    }

    /// Status a job with this name reports as soon as it is submitted
    pub fn set_outcome(&self, name: &str, status: JobStatus) {
        self.state().outcomes.insert(name.to_string(), status);
    }

    /// Settle the most recent submission of `name`
    pub fn set_status(&self, name: &str, status: JobStatus) {
        let mut state = self.state();
        if let Some(job) = state.jobs.iter_mut().rev().find(|j| j.job.name == name) {
            job.status = status;
        }
    }

    /// Mark every pending job as succeeded
    pub fn succeed_all_pending(&self) {
        for job in self.state().jobs.iter_mut() {
            if job.status == JobStatus::Pending {
                job.status = JobStatus::Succeeded;
            }
        }
    }

    /// Make submission of `name` fail
    pub fn fail_submit_of(&self, name: &str) {
        self.state().submit_failures.insert(name.to_string());
    }

    /// Make the next `times` polls of `name` fail
    pub fn fail_polls_of(&self, name: &str, times: u32) {
        self.state().poll_failures.insert(name.to_string(), times);
    }
}

#[async_trait]
impl SchedulerAdapter for FakeScheduler {
    async fn submit(&self, job: &Job) -> Result<JobHandle, SchedulerError> {
        let mut state = self.state();
        state.calls.push(SchedulerCall::Submit {
            job: job.name.clone(),
        });

        if state.submit_failures.contains(&job.name) {
            return Err(SchedulerError::SubmitFailed {
                job: job.name.clone(),
                reason: "injected failure".to_string(),
            });
        }

        let handle = JobHandle(format!("fake-{}", state.jobs.len() + 1));
        let status = state
            .outcomes
            .get(&job.name)
            .copied()
            .unwrap_or(JobStatus::Pending);
        state.jobs.push(FakeJob {
            job: job.clone(),
            handle: handle.clone(),
            status,
            cancelled: false,
            logs_removed: false,
        });
        Ok(handle)
    }

    async fn poll(&self, handle: &JobHandle) -> Result<JobStatus, SchedulerError> {
        let mut state = self.state();
        state.calls.push(SchedulerCall::Poll {
            handle: handle.clone(),
        });

        let job = state.job_mut(handle)?;
        let (name, status) = (job.job.name.clone(), job.status);
        if let Some(remaining) = state.poll_failures.get_mut(&name) {
            if *remaining > 0 {
                *remaining -= 1;
                return Err(SchedulerError::PollFailed {
                    handle: handle.clone(),
                    reason: "injected failure".to_string(),
                });
            }
        }
        Ok(status)
    }

    async fn cancel(&self, handle: &JobHandle) -> Result<(), SchedulerError> {
        let mut state = self.state();
        state.calls.push(SchedulerCall::Cancel {
            handle: handle.clone(),
        });

        let job = state.job_mut(handle)?;
        if job.status == JobStatus::Pending {
            job.status = JobStatus::Failed;
            job.cancelled = true;
        }
        Ok(())
    }

    async fn remove_logs(&self, job: &Job) -> Result<(), SchedulerError> {
        let mut state = self.state();
        state.calls.push(SchedulerCall::RemoveLogs {
            job: job.name.clone(),
        });

        for fake in state.jobs.iter_mut().filter(|j| j.job.name == job.name) {
            fake.logs_removed = true;
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "fake_tests.rs"]
mod tests;
