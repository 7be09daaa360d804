// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! Tally pipeline engine

mod error;
mod executor;
mod manager;

pub use error::ExecutorError;
pub use executor::PipelineExecutor;
pub use manager::run_pipeline;
