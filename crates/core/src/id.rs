// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Manager identity and id generation

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Opaque identifier of a manager process.
///
/// Only compared for equality. Nothing about liveness or uniqueness is
/// inferred from the value; `0` is reserved for "unowned" in persisted records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ManagerId(pub u64);

impl ManagerId {
    /// Value persisted records use for "no owner"
    pub const UNOWNED: ManagerId = ManagerId(0);

    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// Reserved id that can never own a record
    pub fn is_unowned(self) -> bool {
        self == Self::UNOWNED
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for ManagerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for ManagerId {
    fn from(id: u64) -> Self {
        ManagerId(id)
    }
}

/// Generates manager identifiers
pub trait IdGen: Clone + Send + Sync {
    fn next(&self) -> ManagerId;
}

/// Random generator for production use, derived from a v4 UUID
#[derive(Clone, Default)]
pub struct RandomIdGen;

impl IdGen for RandomIdGen {
    fn next(&self) -> ManagerId {
        loop {
            let bits = uuid::Uuid::new_v4().as_u128();
            let id = (bits >> 64) as u64 ^ bits as u64;
            if id != 0 {
                return ManagerId(id);
            }
        }
    }
}

/// Sequential generator for testing
#[derive(Clone)]
pub struct SequentialIdGen {
    counter: Arc<AtomicU64>,
}

impl SequentialIdGen {
    pub fn starting_at(first: u64) -> Self {
        Self {
            counter: Arc::new(AtomicU64::new(first.max(1))),
        }
    }
}

impl Default for SequentialIdGen {
    fn default() -> Self {
        Self::starting_at(1)
    }
}

impl IdGen for SequentialIdGen {
    fn next(&self) -> ManagerId {
        ManagerId(self.counter.fetch_add(1, Ordering::SeqCst))
    }
}

#[cfg(test)]
#[path = "id_tests.rs"]
mod tests;
