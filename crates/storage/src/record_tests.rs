// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use serde::Deserialize;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
struct Counter {
    value: u32,
}

impl Record for Counter {
    fn validate(&self) -> Result<(), String> {
        if self.value > 100 {
            return Err(format!("value {} out of range", self.value));
        }
        Ok(())
    }
}

fn counter_file(dir: &Path) -> RecordFile<Counter> {
    RecordFile::new(dir.join("state/counter.json"), LockSettings::for_testing())
}

#[test]
fn missing_file_reads_as_default_and_is_not_created() {
    let dir = tempfile::tempdir().unwrap();
    let file = counter_file(dir.path());

    assert_eq!(file.read().unwrap(), Counter::default());
    assert!(!file.exists());
}

#[test]
fn lock_path_is_sidecar() {
    let file: RecordFile<Counter> = RecordFile::new("/x/ledger.json", LockSettings::default());
    assert_eq!(file.lock_path(), Path::new("/x/ledger.json.lock"));
}

#[test]
fn update_persists_changes() {
    let dir = tempfile::tempdir().unwrap();
    let file = counter_file(dir.path());

    let out = file
        .update(|c| {
            c.value += 2;
            Ok(c.value)
        })
        .unwrap();
    assert_eq!(out, 2);
    assert!(file.exists());

    let reopened = counter_file(dir.path());
    assert_eq!(reopened.read().unwrap(), Counter { value: 2 });
}

#[test]
fn failed_update_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let file = counter_file(dir.path());

    let result: Result<(), _> = file.update(|c| {
        c.value = 7;
        Err(StoreError::NotRunning {
            path: PathBuf::from("x"),
        })
    });
    assert!(matches!(result, Err(StoreError::NotRunning { .. })));
    assert!(!file.exists());
}

#[test]
fn unchanged_update_does_not_materialize_record() {
    let dir = tempfile::tempdir().unwrap();
    let file = counter_file(dir.path());

    file.update(|_| Ok(())).unwrap();
    assert!(!file.exists());
}

#[test]
fn corrupt_record_is_reported_not_repaired() {
    let dir = tempfile::tempdir().unwrap();
    let file = counter_file(dir.path());
    std::fs::create_dir_all(file.path().parent().unwrap()).unwrap();
    std::fs::write(file.path(), b"{ not json").unwrap();

    assert!(matches!(file.read(), Err(StoreError::Corrupt { .. })));
    assert!(matches!(
        file.update(|c| {
            c.value = 1;
            Ok(())
        }),
        Err(StoreError::Corrupt { .. })
    ));
    assert_eq!(std::fs::read(file.path()).unwrap(), b"{ not json");
}

#[test]
fn invalid_record_is_inconsistent() {
    let dir = tempfile::tempdir().unwrap();
    let file = counter_file(dir.path());
    std::fs::create_dir_all(file.path().parent().unwrap()).unwrap();
    std::fs::write(file.path(), br#"{"value": 500}"#).unwrap();

    match file.read().unwrap_err() {
        StoreError::Inconsistent { reason, .. } => assert!(reason.contains("500")),
        other => panic!("expected Inconsistent, got {other:?}"),
    }
}

#[test]
fn replace_overwrites_corrupt_record() {
    let dir = tempfile::tempdir().unwrap();
    let file = counter_file(dir.path());
    std::fs::create_dir_all(file.path().parent().unwrap()).unwrap();
    std::fs::write(file.path(), b"garbage").unwrap();

    file.replace(&Counter { value: 3 }).unwrap();
    assert_eq!(file.read().unwrap(), Counter { value: 3 });
}

#[test]
fn no_temp_files_left_behind() {
    let dir = tempfile::tempdir().unwrap();
    let file = counter_file(dir.path());
    for _ in 0..5 {
        file.update(|c| {
            c.value += 1;
            Ok(())
        })
        .unwrap();
    }

    let mut names: Vec<_> = std::fs::read_dir(file.path().parent().unwrap())
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
        .collect();
    names.sort();
    assert_eq!(names, vec!["counter.json", "counter.json.lock"]);
}

#[test]
fn update_waits_out_a_held_lock_then_times_out() {
    let dir = tempfile::tempdir().unwrap();
    let file = counter_file(dir.path());

    let _held = FileLock::acquire(file.lock_path(), file.settings()).unwrap();
    let err = file.update(|_| Ok(())).unwrap_err();
    assert!(err.is_retryable());
}
