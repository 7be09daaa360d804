// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Pipeline executor
//!
//! Drives a precomputed job graph through the remote scheduler one stage at a
//! time. Each call to [`PipelineExecutor::runtime_cycle`] looks at the current
//! state, does whatever can be done without waiting, and returns. Stage `n + 1`
//! is never submitted before every job of stage `n` has been recorded in the
//! ledger.

use crate::ExecutorError;
use tally_adapters::{JobHandle, JobStatus, SchedulerAdapter};
use tally_core::{ExecutorPhase, ExecutorSettings, JobGraph, ManagerId, ProcessingStatus};
use tally_storage::{LedgerRecord, LedgerStore, StoreError};

/// A submitted job that has not yet been recorded as finished
#[derive(Debug, Clone)]
struct Outstanding {
    handle: JobHandle,
    /// Index of the job within its stage
    job: usize,
}

/// State machine that runs one pipeline on behalf of one manager
pub struct PipelineExecutor<S> {
    graph: JobGraph,
    ledger: LedgerStore,
    scheduler: S,
    owner: ManagerId,
    keep_job_logs: bool,
    phase: ExecutorPhase,
    outstanding: Vec<Outstanding>,
    /// A job failed but the ledger has not yet recorded it
    failure_pending: bool,
}

impl<S: SchedulerAdapter> PipelineExecutor<S> {
    pub fn new(graph: JobGraph, ledger: LedgerStore, scheduler: S, owner: ManagerId) -> Self {
        Self {
            graph,
            ledger,
            scheduler,
            owner,
            keep_job_logs: false,
            phase: ExecutorPhase::NotStarted,
            outstanding: Vec::new(),
            failure_pending: false,
        }
    }

    pub fn with_settings(mut self, settings: &ExecutorSettings) -> Self {
        self.keep_job_logs = settings.keep_job_logs;
        self
    }

    pub fn with_keep_job_logs(mut self, keep: bool) -> Self {
        self.keep_job_logs = keep;
        self
    }

    pub fn owner(&self) -> ManagerId {
        self.owner
    }

    pub fn graph(&self) -> &JobGraph {
        &self.graph
    }

    pub fn ledger(&self) -> &LedgerStore {
        &self.ledger
    }

    pub fn phase(&self) -> ExecutorPhase {
        self.phase
    }

    pub fn status(&self) -> ProcessingStatus {
        self.phase.status()
    }

    pub fn is_running(&self) -> bool {
        !self.phase.is_terminal()
    }

    /// Stage currently executing, if any
    pub fn current_stage(&self) -> Option<usize> {
        match self.phase {
            ExecutorPhase::StageRunning { stage } => Some(stage),
            _ => None,
        }
    }

    /// Advance the pipeline as far as possible without waiting on any job.
    ///
    /// Ledger errors are returned after the executor has been left in a state
    /// from which the next cycle retries the failed step. Terminal executors
    /// return their status without side effects.
    pub async fn runtime_cycle(&mut self) -> Result<ProcessingStatus, ExecutorError> {
        match self.phase {
            ExecutorPhase::NotStarted => self.begin_stage(0).await?,
            ExecutorPhase::StageRunning { .. } if self.failure_pending => {
                self.record_failure()?
            }
            ExecutorPhase::StageRunning { stage } => self.poll_stage(stage).await?,
            ExecutorPhase::Succeeded | ExecutorPhase::Failed | ExecutorPhase::Aborted => {}
        }
        Ok(self.status())
    }

    /// Claim the ledger for `stage` and submit all of its jobs
    async fn begin_stage(&mut self, stage: usize) -> Result<(), ExecutorError> {
        let Some(jobs) = self.graph.stage(stage).map(|s| s.jobs()) else {
            return Ok(());
        };

        let job_count = ledger_job_count(stage, jobs.len())?;
        match self.ledger.start(self.owner, job_count) {
            Ok(()) => {}
            // Someone else owns the ledger between our stages
            Err(e) if stage > 0 && e.is_ownership() => {
                self.abort_run(&e.to_string()).await;
                return Ok(());
            }
            Err(e) => return Err(e.into()),
        }
        self.phase = ExecutorPhase::StageRunning { stage };
        tracing::info!(owner = %self.owner, stage, jobs = jobs.len(), "stage started");

        for (index, job) in jobs.iter().enumerate() {
            match self.scheduler.submit(job).await {
                Ok(handle) => {
                    tracing::debug!(stage, job = %job.name, %handle, "job submitted");
                    self.outstanding.push(Outstanding { handle, job: index });
                }
                Err(e) => {
                    tracing::error!(stage, job = %job.name, error = %e, "job submission failed");
                    self.cancel_outstanding().await;
                    return self.record_failure();
                }
            }
        }
        Ok(())
    }

    async fn poll_stage(&mut self, stage: usize) -> Result<(), ExecutorError> {
        let record = self.ledger.snapshot()?;
        if !self.still_owns(&record) {
            self.abort_run("ledger no longer held by this manager").await;
            return Ok(());
        }

        let mut pending = std::mem::take(&mut self.outstanding).into_iter();
        let mut remaining = Vec::new();

        while let Some(entry) = pending.next() {
            let name = self.job_name(stage, entry.job);
            match self.scheduler.poll(&entry.handle).await {
                Ok(JobStatus::Pending) => remaining.push(entry),
                Ok(JobStatus::Succeeded) => match self.ledger.complete_job(self.owner) {
                    Ok(record) => tracing::info!(
                        stage,
                        job = %name,
                        completed = record.completed_jobs,
                        of = record.job_count,
                        "job succeeded"
                    ),
                    Err(e) => {
                        remaining.push(entry);
                        remaining.extend(pending);
                        self.outstanding = remaining;
                        return self.on_ledger_error(e).await;
                    }
                },
                Ok(JobStatus::Failed) => {
                    tracing::error!(stage, job = %name, handle = %entry.handle, "job failed");
                    remaining.extend(pending);
                    self.outstanding = remaining;
                    self.cancel_outstanding().await;
                    return self.record_failure();
                }
                Err(e) => {
                    tracing::warn!(stage, job = %name, error = %e, "poll failed, will retry");
                    remaining.push(entry);
                }
            }
        }
        self.outstanding = remaining;

        if self.outstanding.is_empty() {
            self.finish_stage(stage).await?;
        }
        Ok(())
    }

    async fn finish_stage(&mut self, stage: usize) -> Result<(), ExecutorError> {
        let next = stage + 1;
        if next < self.graph.stage_count() {
            tracing::info!(stage, next, "stage complete, advancing");
            return self.begin_stage(next).await;
        }

        self.phase = ExecutorPhase::Succeeded;
        tracing::info!(
            owner = %self.owner,
            stages = self.graph.stage_count(),
            "pipeline succeeded"
        );

        if !self.keep_job_logs {
            for job in self.graph.jobs() {
                if let Err(e) = self.scheduler.remove_logs(job).await {
                    tracing::warn!(job = %job.name, error = %e, "failed to remove job logs");
                }
            }
        }
        Ok(())
    }

    /// The ledger is still ours, running or finished with the current stage
    fn still_owns(&self, record: &LedgerRecord) -> bool {
        record.owner_id == Some(self.owner) && (record.running || record.complete)
    }

    /// Mark the ledger as failed and end the run
    fn record_failure(&mut self) -> Result<(), ExecutorError> {
        match self.ledger.fail_job(self.owner) {
            Ok(()) => {
                self.failure_pending = false;
                self.phase = ExecutorPhase::Failed;
                tracing::error!(owner = %self.owner, "pipeline failed");
                Ok(())
            }
            Err(e) if e.is_ownership() => {
                self.failure_pending = false;
                self.phase = ExecutorPhase::Aborted;
                tracing::warn!(
                    owner = %self.owner,
                    error = %e,
                    "pipeline aborted before failure was recorded"
                );
                Ok(())
            }
            Err(e) => {
                self.failure_pending = true;
                Err(e.into())
            }
        }
    }

    async fn on_ledger_error(&mut self, e: StoreError) -> Result<(), ExecutorError> {
        if e.is_ownership() {
            self.abort_run(&e.to_string()).await;
            return Ok(());
        }
        Err(e.into())
    }

    async fn abort_run(&mut self, reason: &str) {
        tracing::warn!(owner = %self.owner, reason, "pipeline aborted");
        self.cancel_outstanding().await;
        self.phase = ExecutorPhase::Aborted;
    }

    async fn cancel_outstanding(&mut self) {
        for entry in std::mem::take(&mut self.outstanding) {
            if let Err(e) = self.scheduler.cancel(&entry.handle).await {
                tracing::warn!(handle = %entry.handle, error = %e, "cancel failed");
            }
        }
    }

    fn job_name(&self, stage: usize, job: usize) -> String {
        self.graph
            .stage(stage)
            .and_then(|s| s.jobs().get(job))
            .map(|j| j.name.clone())
            .unwrap_or_default()
    }
}

/// Stage size as the ledger's counter type
fn ledger_job_count(stage: usize, jobs: usize) -> Result<u32, ExecutorError> {
    u32::try_from(jobs).map_err(|_| ExecutorError::StageTooLarge { stage, jobs })
}

#[cfg(test)]
#[path = "executor_tests.rs"]
mod tests;
