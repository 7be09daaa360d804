// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use std::time::Duration;

#[test]
fn acquire_creates_parent_directories() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested/deeper/record.json.lock");

    let lock = FileLock::acquire(&path, &LockSettings::for_testing()).unwrap();
    assert!(path.exists());
    assert_eq!(lock.path(), path.as_path());
}

#[test]
fn second_acquire_times_out_while_held() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("record.lock");
    let settings = LockSettings::for_testing().with_timeout(Duration::from_millis(30));

    let _held = FileLock::acquire(&path, &settings).unwrap();
    let err = FileLock::acquire(&path, &settings).unwrap_err();

    match err {
        StoreError::LockTimeout { waited, holder, .. } => {
            assert!(waited >= Duration::from_millis(30));
            assert!(holder.is_none());
        }
        other => panic!("expected LockTimeout, got {other:?}"),
    }
}

#[test]
fn try_acquire_reports_contention_without_waiting() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("record.lock");

    let held = FileLock::try_acquire(&path).unwrap();
    assert!(held.is_some());
    assert!(FileLock::try_acquire(&path).unwrap().is_none());
}

#[test]
fn drop_releases_lock() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("record.lock");

    {
        let _held = FileLock::acquire(&path, &LockSettings::for_testing()).unwrap();
    }
    assert!(FileLock::try_acquire(&path).unwrap().is_some());
}

#[test]
fn waiter_gets_lock_after_holder_releases() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("record.lock");
    let settings = LockSettings::for_testing().with_timeout(Duration::from_secs(5));

    let held = FileLock::acquire(&path, &settings).unwrap();
    let waiter_path = path.clone();
    let waiter = std::thread::spawn(move || FileLock::acquire(&waiter_path, &settings).is_ok());

    std::thread::sleep(Duration::from_millis(20));
    drop(held);

    assert!(waiter.join().unwrap());
}
