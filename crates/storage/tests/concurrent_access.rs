// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Racing managers against one ledger.
//!
//! Each thread opens its own handles, so the advisory locks conflict exactly
//! as they would between separate processes.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use std::path::Path;
use std::sync::{Arc, Barrier};
use std::thread;
use std::time::Duration;
use tally_core::{LockSettings, ManagerId, PipelineKind};
use tally_storage::{DirectoryLock, LedgerStore, StoreError};

fn settings() -> LockSettings {
    LockSettings::for_testing().with_timeout(Duration::from_secs(10))
}

fn ledger(dir: &Path) -> LedgerStore {
    LedgerStore::for_pipeline(dir, &PipelineKind::new("integrity verification"), settings())
}

fn race<T, F>(dir: &Path, contenders: usize, f: F) -> Vec<T>
where
    T: Send + 'static,
    F: Fn(usize, LedgerStore) -> T + Send + Sync + 'static,
{
    let barrier = Arc::new(Barrier::new(contenders));
    let f = Arc::new(f);
    let handles: Vec<_> = (0..contenders)
        .map(|i| {
            let barrier = Arc::clone(&barrier);
            let f = Arc::clone(&f);
            let store = ledger(dir);
            thread::spawn(move || {
                barrier.wait();
                f(i, store)
            })
        })
        .collect();
    handles.into_iter().map(|h| h.join().unwrap()).collect()
}

#[test]
fn same_owner_concurrent_start_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let owner = ManagerId(7);

    let results = race(dir.path(), 2, move |_, store| store.start(owner, 3));

    assert!(results.iter().all(Result::is_ok));
    let record = ledger(dir.path()).snapshot().unwrap();
    assert_eq!(record.owner_id, Some(owner));
    assert_eq!(record.job_count, 3);
    assert_eq!(record.completed_jobs, 0);
    assert!(record.running);
}

#[test]
fn different_owners_racing_start_yield_one_winner() {
    let dir = tempfile::tempdir().unwrap();

    let results = race(dir.path(), 2, |i, store| {
        store.start(ManagerId(100 + i as u64), 2)
    });

    let wins = results.iter().filter(|r| r.is_ok()).count();
    let conflicts = results
        .iter()
        .filter(|r| matches!(r, Err(StoreError::OwnershipConflict { .. })))
        .count();
    assert_eq!(wins, 1);
    assert_eq!(conflicts, 1);
}

#[test]
fn many_owners_racing_start_yield_one_winner() {
    let dir = tempfile::tempdir().unwrap();

    let results = race(dir.path(), 8, |i, store| {
        store.start(ManagerId(1 + i as u64), 1)
    });

    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
}

#[test]
fn concurrent_completions_are_never_lost() {
    let dir = tempfile::tempdir().unwrap();
    let owner = ManagerId(9);
    ledger(dir.path()).start(owner, 16).unwrap();

    let results = race(dir.path(), 16, move |_, store| store.complete_job(owner));

    assert!(results.iter().all(Result::is_ok));
    let record = ledger(dir.path()).snapshot().unwrap();
    assert_eq!(record.completed_jobs, 16);
    assert!(record.complete);
    assert!(!record.running);
    assert_eq!(
        results
            .iter()
            .filter(|r| matches!(r, Ok(record) if record.complete))
            .count(),
        1
    );
}

#[test]
fn directory_lock_race_has_one_holder() {
    let dir = tempfile::tempdir().unwrap();
    let quick = LockSettings::for_testing().with_timeout(Duration::from_millis(50));
    let barrier = Arc::new(Barrier::new(4));

    let handles: Vec<_> = (0..4u64)
        .map(|i| {
            let barrier = Arc::clone(&barrier);
            let lock = DirectoryLock::for_directory(dir.path(), quick);
            thread::spawn(move || {
                barrier.wait();
                lock.acquire(ManagerId(50 + i), false).is_ok()
            })
        })
        .collect();

    let acquired = handles
        .into_iter()
        .map(|h| h.join().unwrap())
        .filter(|ok| *ok)
        .count();
    assert_eq!(acquired, 1);
    assert!(DirectoryLock::for_directory(dir.path(), quick)
        .holder()
        .unwrap()
        .is_some());
}
