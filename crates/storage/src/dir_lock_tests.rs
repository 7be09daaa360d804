// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use std::time::Duration;
use yare::parameterized;

const A: ManagerId = ManagerId(11);
const B: ManagerId = ManagerId(22);

fn settings() -> LockSettings {
    LockSettings::for_testing().with_timeout(Duration::from_millis(40))
}

fn lock(dir: &Path) -> DirectoryLock {
    DirectoryLock::for_directory(dir, settings())
}

#[test]
fn acquire_records_owner() {
    let dir = tempfile::tempdir().unwrap();
    let lock = lock(dir.path());

    assert!(!lock.is_locked().unwrap());
    lock.acquire(A, false).unwrap();

    assert_eq!(lock.holder().unwrap(), Some(A));
    assert!(lock.path().exists());
    lock.check_owner(A).unwrap();
}

#[test]
fn reacquire_by_same_owner_succeeds() {
    let dir = tempfile::tempdir().unwrap();
    let lock = lock(dir.path());

    lock.acquire(A, false).unwrap();
    lock.acquire(A, false).unwrap();
    assert_eq!(lock.holder().unwrap(), Some(A));
}

#[test]
fn second_owner_times_out_naming_the_holder() {
    let dir = tempfile::tempdir().unwrap();
    let lock = lock(dir.path());

    lock.acquire(A, false).unwrap();
    let err = lock.acquire(B, false).unwrap_err();
    assert!(err.is_retryable());

    match err {
        StoreError::LockTimeout { holder, waited, .. } => {
            assert_eq!(holder, Some(A));
            assert!(waited >= Duration::from_millis(40));
        }
        other => panic!("expected LockTimeout, got {other:?}"),
    }
}

#[test]
fn release_by_non_owner_is_ownership_error() {
    let dir = tempfile::tempdir().unwrap();
    let lock = lock(dir.path());

    lock.acquire(A, false).unwrap();
    match lock.release(B).unwrap_err() {
        StoreError::NotOwner {
            owner, requested, ..
        } => {
            assert_eq!(owner, Some(A));
            assert_eq!(requested, B);
        }
        other => panic!("expected NotOwner, got {other:?}"),
    }
    assert_eq!(lock.holder().unwrap(), Some(A));
}

#[test]
fn release_then_other_owner_acquires() {
    let dir = tempfile::tempdir().unwrap();
    let lock = lock(dir.path());

    lock.acquire(A, false).unwrap();
    lock.release(A).unwrap();
    assert!(!lock.is_locked().unwrap());

    lock.acquire(B, false).unwrap();
    assert_eq!(lock.holder().unwrap(), Some(B));
}

#[test]
fn release_of_unlocked_directory_fails() {
    let dir = tempfile::tempdir().unwrap();
    let lock = lock(dir.path());

    assert!(matches!(
        lock.release(A),
        Err(StoreError::NotOwner { owner: None, .. })
    ));
}

#[test]
fn force_reset_overrides_existing_holder() {
    let dir = tempfile::tempdir().unwrap();
    let lock = lock(dir.path());

    lock.acquire(A, false).unwrap();
    lock.acquire(B, true).unwrap();

    assert_eq!(lock.holder().unwrap(), Some(B));
    assert!(lock.release(A).is_err());
    lock.release(B).unwrap();
}

#[test]
fn waiter_acquires_once_holder_releases() {
    let dir = tempfile::tempdir().unwrap();
    let patient = LockSettings::for_testing().with_timeout(Duration::from_secs(5));
    let holder = DirectoryLock::for_directory(dir.path(), patient);
    holder.acquire(A, false).unwrap();

    let waiter = DirectoryLock::for_directory(dir.path(), patient);
    let handle = std::thread::spawn(move || waiter.acquire(B, false));

    std::thread::sleep(Duration::from_millis(30));
    holder.release(A).unwrap();

    handle.join().unwrap().unwrap();
    assert_eq!(holder.holder().unwrap(), Some(B));
}

#[test]
fn force_release_clears_any_owner() {
    let dir = tempfile::tempdir().unwrap();
    let lock = lock(dir.path());

    lock.acquire(A, false).unwrap();
    lock.force_release().unwrap();

    assert!(!lock.is_locked().unwrap());
    assert!(matches!(
        lock.check_owner(A),
        Err(StoreError::NotOwner { owner: None, .. })
    ));
}

#[test]
fn check_owner_rejects_other_manager() {
    let dir = tempfile::tempdir().unwrap();
    let lock = lock(dir.path());

    lock.acquire(A, false).unwrap();
    assert!(matches!(
        lock.check_owner(B),
        Err(StoreError::NotOwner { .. })
    ));
}

#[test]
fn free_functions_operate_on_directory() {
    let dir = tempfile::tempdir().unwrap();

    acquire_lock(dir.path(), A, false, settings()).unwrap();
    assert!(acquire_lock(dir.path(), B, false, settings()).is_err());
    assert!(release_lock(dir.path(), B, settings()).is_err());
    release_lock(dir.path(), A, settings()).unwrap();
    acquire_lock(dir.path(), B, false, settings()).unwrap();
}

#[test]
fn locked_without_owner_is_inconsistent() {
    let dir = tempfile::tempdir().unwrap();
    let lock = lock(dir.path());
    std::fs::create_dir_all(lock.path().parent().unwrap()).unwrap();
    std::fs::write(lock.path(), r#"{"owner_id": null, "locked": true}"#).unwrap();

    assert!(matches!(
        lock.acquire(A, false),
        Err(StoreError::Inconsistent { .. })
    ));
}

#[test]
fn acquire_refuses_reserved_unowned_id() {
    let dir = tempfile::tempdir().unwrap();
    let lock = lock(dir.path());

    for force_reset in [false, true] {
        assert!(matches!(
            lock.acquire(ManagerId::UNOWNED, force_reset),
            Err(StoreError::ReservedOwner { .. })
        ));
    }
    assert!(!lock.path().exists());
    lock.acquire(A, false).unwrap();
}

#[test]
fn zero_owner_on_disk_reads_as_unowned() {
    let dir = tempfile::tempdir().unwrap();
    let lock = lock(dir.path());
    std::fs::create_dir_all(lock.path().parent().unwrap()).unwrap();
    std::fs::write(lock.path(), r#"{"owner_id": 0, "locked": false}"#).unwrap();

    assert_eq!(lock.holder().unwrap(), None);
    assert_eq!(lock.file.read().unwrap().owner_id, None);
}

#[parameterized(
    garbage = { "{garbage" },
    locked_unowned = { r#"{"owner_id": null, "locked": true}"# },
    locked_zero_owner = { r#"{"owner_id": 0, "locked": true}"# },
)]
fn force_reset_recovers_unreadable_record(content: &str) {
    let dir = tempfile::tempdir().unwrap();
    let lock = lock(dir.path());
    std::fs::create_dir_all(lock.path().parent().unwrap()).unwrap();
    std::fs::write(lock.path(), content).unwrap();
    assert!(lock.acquire(A, false).is_err());

    lock.acquire(A, true).unwrap();

    assert_eq!(lock.holder().unwrap(), Some(A));
    lock.release(A).unwrap();
}
