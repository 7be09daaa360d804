// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Manager control loop

use crate::{ExecutorError, PipelineExecutor};
use std::path::Path;
use std::time::Duration;
use tally_adapters::SchedulerAdapter;
use tally_core::{LockSettings, ProcessingStatus};
use tally_storage::DirectoryLock;
use tracing::Instrument;

/// Run a pipeline over `dir` to a terminal status.
///
/// Holds the directory lock for `dir` under the executor's owner id for the
/// whole run and releases it on every exit path. Contention errors from a
/// cycle are retried on the next cycle; any other error ends the run.
pub async fn run_pipeline<S: SchedulerAdapter>(
    dir: &Path,
    executor: &mut PipelineExecutor<S>,
    settings: LockSettings,
    poll_interval: Duration,
) -> Result<ProcessingStatus, ExecutorError> {
    let owner = executor.owner();
    let lock = DirectoryLock::for_directory(dir, settings);
    lock.acquire(owner, false).map_err(ExecutorError::DirectoryLock)?;

    let span = tracing::info_span!("pipeline", %owner, dir = %dir.display());
    let result = drive(executor, poll_interval).instrument(span).await;

    let released = lock.release(owner);
    match (result, released) {
        (Ok(status), Ok(())) => {
            tracing::info!(%owner, %status, "pipeline finished");
            Ok(status)
        }
        (Ok(_), Err(e)) => Err(ExecutorError::DirectoryLock(e)),
        (Err(e), released) => {
            if let Err(release_err) = released {
                tracing::warn!(%owner, error = %release_err, "failed to release directory lock");
            }
            tracing::error!(%owner, error = %e, "pipeline run ended with error");
            Err(e)
        }
    }
}

async fn drive<S: SchedulerAdapter>(
    executor: &mut PipelineExecutor<S>,
    poll_interval: Duration,
) -> Result<ProcessingStatus, ExecutorError> {
    tracing::info!(stages = executor.graph().stage_count(), "running");
    loop {
        match executor.runtime_cycle().await {
            Ok(status) if status.is_terminal() => return Ok(status),
            Ok(_) => {}
            Err(e) if e.is_retryable() => {
                tracing::warn!(
                    phase = %executor.phase(),
                    error = %e,
                    "cycle hit contention, retrying"
                );
            }
            Err(e) => return Err(e),
        }
        tokio::time::sleep(poll_interval).await;
    }
}

#[cfg(test)]
#[path = "manager_tests.rs"]
mod tests;
