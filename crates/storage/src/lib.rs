// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! Lock-protected persistent records shared between manager processes
//!
//! Every mutation follows the same shape: take a short-lived advisory lock on
//! the record's sidecar `.lock` file, read the record, mutate it, replace it
//! atomically, release the lock. Managers never share memory, only a filesystem.

mod dir_lock;
mod error;
mod file_lock;
mod ledger;
mod record;

pub use dir_lock::{acquire_lock, release_lock, DirectoryLock, DirectoryLockRecord};
pub use error::StoreError;
pub use file_lock::FileLock;
pub use ledger::{LedgerRecord, LedgerStore};
pub use record::{Record, RecordFile};
