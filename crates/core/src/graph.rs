// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Stage-ordered job graph
//!
//! A pipeline is a linear sequence of stages. Jobs inside a stage may run
//! concurrently; every job of stage N must succeed before stage N+1 is submitted.
//! The graph is resolved by the caller and never changes once built.

use crate::job::Job;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum GraphError {
    #[error("job graph has no stages")]
    Empty,
    #[error("stage {0} has no jobs")]
    EmptyStage(usize),
}

/// A set of jobs that may execute concurrently
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stage {
    jobs: Vec<Job>,
}

impl Stage {
    pub fn new(jobs: Vec<Job>) -> Self {
        Self { jobs }
    }

    pub fn jobs(&self) -> &[Job] {
        &self.jobs
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }
}

impl FromIterator<Job> for Stage {
    fn from_iter<I: IntoIterator<Item = Job>>(iter: I) -> Self {
        Stage::new(iter.into_iter().collect())
    }
}

/// Immutable, validated sequence of stages
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobGraph {
    stages: Vec<Stage>,
}

impl JobGraph {
    /// Build a graph, rejecting graphs with no stages or with an empty stage
    pub fn new(stages: Vec<Stage>) -> Result<Self, GraphError> {
        if stages.is_empty() {
            return Err(GraphError::Empty);
        }
        if let Some(index) = stages.iter().position(Stage::is_empty) {
            return Err(GraphError::EmptyStage(index));
        }
        Ok(Self { stages })
    }

    pub fn builder() -> JobGraphBuilder {
        JobGraphBuilder::default()
    }

    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    pub fn stage(&self, index: usize) -> Option<&Stage> {
        self.stages.get(index)
    }

    pub fn stage_count(&self) -> usize {
        self.stages.len()
    }

    pub fn job_count(&self) -> usize {
        self.stages.iter().map(Stage::len).sum()
    }

    /// Every job in stage order
    pub fn jobs(&self) -> impl Iterator<Item = &Job> {
        self.stages.iter().flat_map(|s| s.jobs().iter())
    }
}

/// Incremental builder for [`JobGraph`]
#[derive(Debug, Default)]
pub struct JobGraphBuilder {
    stages: Vec<Stage>,
}

impl JobGraphBuilder {
    /// Append a stage after all previously added stages
    pub fn stage(mut self, jobs: impl IntoIterator<Item = Job>) -> Self {
        self.stages.push(jobs.into_iter().collect());
        self
    }

    pub fn build(self) -> Result<JobGraph, GraphError> {
        JobGraph::new(self.stages)
    }
}

#[cfg(test)]
#[path = "graph_tests.rs"]
mod tests;
