// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Journal handles
//!
//! [`Journal`] is the read side every node has. [`ReadWriteJournal`] adds
//! the ability to become the single writer; only a node that may be
//! promoted to leader holds one.

use crate::error::JournalError;
use crate::input::JournalInputStream;
use crate::layout::{JournalLayout, SegmentInfo};
use crate::writer::JournalWriter;
use std::path::{Path, PathBuf};
use tern_core::JournalConfig;

/// Read-only view of a journal directory
#[derive(Debug, Clone)]
pub struct Journal {
    layout: JournalLayout,
}

impl Journal {
    /// Open a journal directory for reading
    ///
    /// The directory need not exist yet; it then reads as an empty journal.
    pub fn open(dir: impl Into<PathBuf>) -> Self {
        Self {
            layout: JournalLayout::new(dir),
        }
    }

    pub fn dir(&self) -> &Path {
        self.layout.dir()
    }

    pub fn layout(&self) -> &JournalLayout {
        &self.layout
    }

    pub fn checkpoint_exists(&self) -> Result<bool, JournalError> {
        Ok(self.latest_checkpoint()?.is_some())
    }

    /// Sequence number of the newest checkpoint
    pub fn latest_checkpoint(&self) -> Result<Option<u64>, JournalError> {
        Ok(self.layout.latest_checkpoint()?)
    }

    /// Completed segments, ordered by sequence
    pub fn completed_segments(&self) -> Result<Vec<SegmentInfo>, JournalError> {
        Ok(self.layout.segments()?)
    }

    /// Stream over the newest checkpoint
    ///
    /// The header must agree with the sequence in the file name.
    pub fn checkpoint_input_stream(&self) -> Result<JournalInputStream, JournalError> {
        let sequence = self
            .latest_checkpoint()?
            .ok_or(JournalError::NoCheckpoint)?;
        let path = self.layout.checkpoint_path(sequence);
        let stream = JournalInputStream::open_checkpoint(&path)?;
        match stream.checkpoint_sequence() {
            Some(header) if header == sequence => Ok(stream),
            header => Err(JournalError::Corrupted {
                path,
                line: 1,
                reason: format!("checkpoint header sequence {header:?} does not match file name"),
            }),
        }
    }

    pub fn segment_input_stream(
        &self,
        segment: &SegmentInfo,
    ) -> Result<JournalInputStream, JournalError> {
        JournalInputStream::open_segment(&segment.path, segment.first, segment.last)
    }
}

/// A journal this node may write to once it holds the writer lock
#[derive(Debug, Clone)]
pub struct ReadWriteJournal {
    journal: Journal,
    max_segment_bytes: u64,
}

impl ReadWriteJournal {
    /// Open, creating the directory if needed
    pub fn open(config: &JournalConfig) -> Result<Self, JournalError> {
        std::fs::create_dir_all(&config.dir)?;
        Ok(Self {
            journal: Journal::open(&config.dir),
            max_segment_bytes: config.max_segment_bytes,
        })
    }

    pub fn journal(&self) -> &Journal {
        &self.journal
    }

    /// Take the exclusive writer lock and return the writer
    ///
    /// Fails with [`JournalError::WriterLocked`] while another writer holds
    /// the lock, in this process or any other.
    pub fn new_writer(&self) -> Result<JournalWriter, JournalError> {
        JournalWriter::new(self.journal.layout().clone(), self.max_segment_bytes)
    }
}

#[cfg(test)]
#[path = "journal_tests.rs"]
mod tests;
