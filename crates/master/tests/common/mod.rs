// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared utilities for master integration tests.

#![allow(dead_code)]

use std::path::Path;
use std::thread;
use std::time::Duration;
use tempfile::TempDir;
use tern_core::{FakeClock, JournalConfig, TailerConfig};
use tern_journal::{Journal, ReadWriteJournal};
use tern_master::{MasterJournal, NamespaceMaster};

pub type TestMaster = NamespaceMaster<FakeClock>;

/// Poll fast so standby tests don't wait on the default interval
pub fn fast_tailer() -> TailerConfig {
    TailerConfig {
        poll_interval: Duration::from_millis(5),
        max_backoff: Duration::from_millis(50),
    }
}

/// A journal directory shared by every master of one test
pub fn journal_dir() -> TempDir {
    TempDir::new().expect("Failed to create temp directory")
}

pub fn read_write_master(dir: &Path, max_segment_bytes: u64) -> TestMaster {
    let config = JournalConfig {
        dir: dir.to_path_buf(),
        max_segment_bytes,
    };
    let journal = ReadWriteJournal::open(&config).expect("Failed to open journal");
    NamespaceMaster::new(
        "namespace",
        MasterJournal::ReadWrite(journal),
        fast_tailer(),
        FakeClock::at(1_000),
    )
}

pub fn read_only_master(dir: &Path) -> TestMaster {
    NamespaceMaster::new(
        "namespace",
        MasterJournal::ReadOnly(Journal::open(dir)),
        fast_tailer(),
        FakeClock::at(1_000),
    )
}

/// Wait until the standby loop has applied `sequence`.
/// Polls every 10ms until timeout_ms.
pub fn wait_for_standby(master: &TestMaster, sequence: u64, timeout_ms: u64) -> bool {
    let poll_interval = Duration::from_millis(10);
    let max_iterations = timeout_ms / 10;

    for _ in 0..max_iterations {
        if master.base().standby_sequence() == Some(sequence) {
            return true;
        }
        if let Some(failure) = master.base().standby_failure() {
            eprintln!("standby failed: {failure}");
            return false;
        }
        thread::sleep(poll_interval);
    }
    false
}
