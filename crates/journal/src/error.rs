// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::path::PathBuf;
use tern_core::ApplyError;
use thiserror::Error;

/// Errors that can occur reading, writing or replaying a journal
#[derive(Debug, Error)]
pub enum JournalError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("corrupted record at {}:{line}: {reason}", .path.display())]
    Corrupted {
        path: PathBuf,
        line: u64,
        reason: String,
    },
    #[error("checksum mismatch at {}:{line}", .path.display())]
    ChecksumMismatch { path: PathBuf, line: u64 },
    #[error("unknown entry kind {kind:?} at {}:{line}", .path.display())]
    UnknownEntryKind {
        path: PathBuf,
        line: u64,
        kind: String,
    },
    #[error("sequence gap: expected {expected}, found {found}")]
    SequenceGap { expected: u64, found: u64 },
    #[error("checkpoint at {checkpoint} supersedes replay position {position}")]
    CheckpointSuperseded { checkpoint: u64, position: u64 },
    #[error("journal has no checkpoint")]
    NoCheckpoint,
    #[error("journal writer lock is held elsewhere")]
    WriterLocked(#[source] std::io::Error),
    #[error("illegal journal state: {0}")]
    IllegalState(&'static str),
    #[error("failed to apply entry: {0}")]
    Apply(#[from] ApplyError),
}

impl JournalError {
    /// Whether retrying the same operation later may succeed
    ///
    /// Only plain I/O failures qualify. Everything else means the journal
    /// or the replay position can't be trusted.
    pub fn is_transient(&self) -> bool {
        matches!(self, JournalError::Io(_))
    }
}
