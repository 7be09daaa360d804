// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Traced adapter wrappers for consistent observability

use crate::scheduler::{JobHandle, JobStatus, SchedulerAdapter, SchedulerError};
use async_trait::async_trait;
use std::time::Instant;
use tally_core::Job;
use tracing::Instrument;

/// Wrapper that adds tracing to any SchedulerAdapter
#[derive(Clone)]
pub struct TracedSchedulerAdapter<S> {
    inner: S,
}

impl<S> TracedSchedulerAdapter<S> {
    pub fn new(inner: S) -> Self {
        Self { inner }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }
}

#[async_trait]
impl<S: SchedulerAdapter> SchedulerAdapter for TracedSchedulerAdapter<S> {
    async fn submit(&self, job: &Job) -> Result<JobHandle, SchedulerError> {
        let span = tracing::info_span!(
            "scheduler.submit",
            job = %job.name,
            working_dir = %job.working_dir.display()
        );

        async {
            tracing::info!(spec_len = job.spec.len(), "submitting");

            let start = Instant::now();
            let result = self.inner.submit(job).await;
            let elapsed_ms = start.elapsed().as_millis() as u64;

            match &result {
                Ok(handle) => tracing::info!(%handle, elapsed_ms, "job submitted"),
                Err(e) => tracing::error!(elapsed_ms, error = %e, "submit failed"),
            }
            result
        }
        .instrument(span)
        .await
    }

    async fn poll(&self, handle: &JobHandle) -> Result<JobStatus, SchedulerError> {
        let result = self.inner.poll(handle).await;
        match &result {
            Ok(status) => tracing::trace!(%handle, ?status, "polled"),
            Err(e) => tracing::warn!(%handle, error = %e, "poll failed"),
        }
        result
    }

    async fn cancel(&self, handle: &JobHandle) -> Result<(), SchedulerError> {
        let span = tracing::info_span!("scheduler.cancel", %handle);

        async {
            let result = self.inner.cancel(handle).await;
            // Cancelling a finished job may fail; the job is over either way
            match &result {
                Ok(()) => tracing::info!("cancelled"),
                Err(e) => tracing::warn!(error = %e, "cancel failed (may be expected)"),
            }
            result
        }
        .instrument(span)
        .await
    }

    async fn remove_logs(&self, job: &Job) -> Result<(), SchedulerError> {
        let span = tracing::info_span!("scheduler.remove_logs", job = %job.name);

        async {
            let result = self.inner.remove_logs(job).await;
            match &result {
                Ok(()) => tracing::debug!(dir = %job.working_dir.display(), "logs removed"),
                Err(e) => tracing::error!(error = %e, "log removal failed"),
            }
            result
        }
        .instrument(span)
        .await
    }
}

#[cfg(test)]
#[path = "traced_tests.rs"]
mod tests;
