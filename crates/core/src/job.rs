// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! A single unit of remote work

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// A job submitted to the remote scheduler.
///
/// `spec` is opaque to the coordinator; only the scheduler adapter interprets it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Job {
    /// Human-readable job name, used in logs and by schedulers that name their jobs
    pub name: String,
    /// Scheduler-specific job specification (for example a shell script body)
    pub spec: String,
    /// Directory the job runs in; holds the job's runtime logs
    pub working_dir: PathBuf,
    /// Artifact the job is expected to produce
    pub output_path: PathBuf,
}

impl Job {
    pub fn new(
        name: impl Into<String>,
        spec: impl Into<String>,
        working_dir: impl Into<PathBuf>,
        output_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            name: name.into(),
            spec: spec.into(),
            working_dir: working_dir.into(),
            output_path: output_path.into(),
        }
    }

    /// Path of the job's captured stdout
    pub fn output_log(&self) -> PathBuf {
        self.working_dir.join("output.txt")
    }

    /// Path of the job's captured stderr
    pub fn error_log(&self) -> PathBuf {
        self.working_dir.join("errors.txt")
    }

    pub fn working_dir(&self) -> &Path {
        &self.working_dir
    }
}
