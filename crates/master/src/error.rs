// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use tern_core::ApplyError;
use tern_journal::JournalError;
use thiserror::Error;

/// Errors from the master lifecycle and the leader mutation path
#[derive(Debug, Error)]
pub enum MasterError {
    #[error("journal error: {0}")]
    Journal(#[from] JournalError),
    #[error("rejected mutation: {0}")]
    Apply(#[from] ApplyError),
    #[error("cannot lead with a read-only journal")]
    ReadOnlyJournal,
    #[error("not the leader")]
    NotLeader,
    #[error("already the leader")]
    AlreadyLeader,
    #[error("journal writer failed; mutations are no longer accepted")]
    WriterFailed,
    #[error("failed to spawn standby tailer: {0}")]
    Spawn(#[source] std::io::Error),
}
