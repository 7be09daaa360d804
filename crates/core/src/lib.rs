// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! tally-core: shared types for the tally pipeline coordinator
//!
//! This crate provides:
//! - Manager identity (`ManagerId`) and id generators
//! - The immutable job graph handed to the executor (`Job`, `Stage`, `JobGraph`)
//! - Pipeline kinds, their ledger locations, and pipeline status codes
//! - TOML configuration

pub mod config;
pub mod graph;
pub mod id;
pub mod job;
pub mod pipeline;

pub use config::{Config, ConfigError, ExecutorSettings, LockSettings};
pub use graph::{GraphError, JobGraph, JobGraphBuilder, Stage};
pub use id::{IdGen, ManagerId, RandomIdGen, SequentialIdGen};
pub use job::Job;
pub use pipeline::{
    directory_lock_path, ledger_path, ExecutorPhase, PipelineKind, ProcessingStatus, STATE_DIR,
};
