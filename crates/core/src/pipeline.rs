// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Pipeline kinds, status codes and record locations

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Directory, relative to a target directory, that holds coordination records
pub const STATE_DIR: &str = ".tally";

/// A named pipeline type, e.g. "integrity verification"
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PipelineKind(pub String);

impl PipelineKind {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn name(&self) -> &str {
        &self.0
    }

    /// Deterministic ledger file name for this kind.
    ///
    /// Non-alphanumeric runs collapse to a single underscore:
    /// "single-day processing" -> "single_day_processing_ledger.json".
    pub fn ledger_file_name(&self) -> String {
        let mut slug = String::with_capacity(self.0.len());
        for c in self.0.chars() {
            if c.is_ascii_alphanumeric() {
                slug.push(c.to_ascii_lowercase());
            } else if !slug.is_empty() && !slug.ends_with('_') {
                slug.push('_');
            }
        }
        while slug.ends_with('_') {
            slug.pop();
        }
        if slug.is_empty() {
            slug.push_str("pipeline");
        }
        format!("{slug}_ledger.json")
    }
}

impl std::fmt::Display for PipelineKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for PipelineKind {
    fn from(s: &str) -> Self {
        PipelineKind(s.to_string())
    }
}

/// Location of the ledger record for `kind` running against `target_dir`
pub fn ledger_path(target_dir: &Path, kind: &PipelineKind) -> PathBuf {
    target_dir.join(STATE_DIR).join(kind.ledger_file_name())
}

/// Location of the directory lock record guarding `dir`
pub fn directory_lock_path(dir: &Path) -> PathBuf {
    dir.join(STATE_DIR).join("directory_lock.json")
}

/// Status of a pipeline as a whole, as reported to the manager process
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProcessingStatus {
    /// Jobs are queued or executing
    Running,
    /// Every job of every stage succeeded
    Succeeded,
    /// A job failed or could not be submitted
    Failed,
    /// The ledger was reset or taken over before the pipeline finished
    Aborted,
}

impl ProcessingStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, ProcessingStatus::Running)
    }

    /// Stable integer code for external consumers
    pub fn code(&self) -> u8 {
        match self {
            ProcessingStatus::Running => 0,
            ProcessingStatus::Succeeded => 1,
            ProcessingStatus::Failed => 2,
            ProcessingStatus::Aborted => 3,
        }
    }
}

impl std::fmt::Display for ProcessingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ProcessingStatus::Running => "running",
            ProcessingStatus::Succeeded => "succeeded",
            ProcessingStatus::Failed => "failed",
            ProcessingStatus::Aborted => "aborted",
        };
        write!(f, "{s}")
    }
}

/// Fine-grained executor state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutorPhase {
    NotStarted,
    StageRunning { stage: usize },
    Succeeded,
    Failed,
    Aborted,
}

impl ExecutorPhase {
    pub fn status(&self) -> ProcessingStatus {
        match self {
            ExecutorPhase::NotStarted | ExecutorPhase::StageRunning { .. } => {
                ProcessingStatus::Running
            }
            ExecutorPhase::Succeeded => ProcessingStatus::Succeeded,
            ExecutorPhase::Failed => ProcessingStatus::Failed,
            ExecutorPhase::Aborted => ProcessingStatus::Aborted,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.status().is_terminal()
    }
}

impl std::fmt::Display for ExecutorPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExecutorPhase::NotStarted => write!(f, "not-started"),
            ExecutorPhase::StageRunning { stage } => write!(f, "stage-running({stage})"),
            ExecutorPhase::Succeeded => write!(f, "succeeded"),
            ExecutorPhase::Failed => write!(f, "failed"),
            ExecutorPhase::Aborted => write!(f, "aborted"),
        }
    }
}

#[cfg(test)]
#[path = "pipeline_tests.rs"]
mod tests;
