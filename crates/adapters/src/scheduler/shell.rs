// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Local shell scheduler
//!
//! Runs each job as `sh -c <spec>` in the job's working directory. Stands in
//! for a batch cluster when everything runs on one machine.

use super::{JobHandle, JobStatus, SchedulerAdapter, SchedulerError};
use async_trait::async_trait;
use std::collections::HashMap;
use std::process::Stdio;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tally_core::Job;
use tokio::process::{Child, Command};

enum ShellJob {
    Running(Child),
    Exited(JobStatus),
}

/// Process-backed scheduler adapter
#[derive(Clone, Default)]
pub struct ShellScheduler {
    jobs: Arc<Mutex<HashMap<JobHandle, ShellJob>>>,
    next_id: Arc<AtomicU64>,
}

impl ShellScheduler {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SchedulerAdapter for ShellScheduler {
    async fn submit(&self, job: &Job) -> Result<JobHandle, SchedulerError> {
        let submit_failed = |reason: String| SchedulerError::SubmitFailed {
            job: job.name.clone(),
            reason,
        };

        tokio::fs::create_dir_all(&job.working_dir)
            .await
            .map_err(|e| submit_failed(e.to_string()))?;
        let stdout =
            std::fs::File::create(job.output_log()).map_err(|e| submit_failed(e.to_string()))?;
        let stderr =
            std::fs::File::create(job.error_log()).map_err(|e| submit_failed(e.to_string()))?;

        let child = Command::new("sh")
            .arg("-c")
            .arg(&job.spec)
            .current_dir(&job.working_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::from(stdout))
            .stderr(Stdio::from(stderr))
            .spawn()
            .map_err(|e| submit_failed(e.to_string()))?;

        let n = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        let handle = JobHandle(format!("shell-{}-{}", n, child.id().unwrap_or(0)));
        self.jobs
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(handle.clone(), ShellJob::Running(child));

        Ok(handle)
    }

    async fn poll(&self, handle: &JobHandle) -> Result<JobStatus, SchedulerError> {
        let mut jobs = self.jobs.lock().unwrap_or_else(|e| e.into_inner());
        let entry = jobs
            .get_mut(handle)
            .ok_or_else(|| SchedulerError::UnknownJob(handle.clone()))?;

        let status = match &mut *entry {
            ShellJob::Exited(status) => return Ok(*status),
            ShellJob::Running(child) => match child.try_wait() {
                Ok(Some(exit)) if exit.success() => JobStatus::Succeeded,
                Ok(Some(_)) => JobStatus::Failed,
                Ok(None) => return Ok(JobStatus::Pending),
                Err(e) => {
                    return Err(SchedulerError::PollFailed {
                        handle: handle.clone(),
                        reason: e.to_string(),
                    })
                }
            },
        };
        *entry = ShellJob::Exited(status);
        Ok(status)
    }

    async fn cancel(&self, handle: &JobHandle) -> Result<(), SchedulerError> {
        let mut jobs = self.jobs.lock().unwrap_or_else(|e| e.into_inner());
        let entry = jobs
            .get_mut(handle)
            .ok_or_else(|| SchedulerError::UnknownJob(handle.clone()))?;

        let ShellJob::Running(child) = &mut *entry else {
            return Ok(());
        };
        // Already-exited children report an error here; either way the job is over
        if let Err(e) = child.start_kill() {
            tracing::debug!(%handle, error = %e, "kill failed (may have exited)");
        }
        *entry = ShellJob::Exited(JobStatus::Failed);
        Ok(())
    }

    async fn remove_logs(&self, job: &Job) -> Result<(), SchedulerError> {
        match tokio::fs::remove_dir_all(&job.working_dir).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
#[path = "shell_tests.rs"]
mod tests;
