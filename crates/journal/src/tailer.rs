// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Journal tailer
//!
//! Replays a checkpoint followed by completed segments into a state
//! machine, tracking the highest sequence number applied. A tailer that
//! hits a fatal error becomes invalid and must be replaced; its owner
//! resets the state machine and replays from scratch.

use crate::error::JournalError;
use crate::input::JournalInputStream;
use crate::journal::Journal;
use std::sync::Arc;
use tern_core::JournalEntry;

/// State that is rebuilt by replaying the journal
pub trait JournalStateMachine: Send + Sync {
    /// Apply one entry; unknown or invalid entries fail
    fn process_journal_entry(&self, entry: &JournalEntry) -> Result<(), JournalError>;

    /// Apply every entry of a checkpoint
    ///
    /// Takes ownership of the stream, so it is closed on every path.
    fn process_journal_checkpoint(
        &self,
        mut stream: JournalInputStream,
    ) -> Result<(), JournalError> {
        while let Some(entry) = stream.next_entry()? {
            self.process_journal_entry(&entry)?;
        }
        Ok(())
    }

    /// Return to the empty state a replay starts from
    fn reset_state(&self);
}

pub struct JournalTailer {
    state_machine: Arc<dyn JournalStateMachine>,
    journal: Journal,
    checkpoint_sequence: Option<u64>,
    latest_sequence: u64,
    valid: bool,
}

impl JournalTailer {
    /// A tailer positioned before the first entry
    pub fn new(state_machine: Arc<dyn JournalStateMachine>, journal: Journal) -> Self {
        Self {
            state_machine,
            journal,
            checkpoint_sequence: None,
            latest_sequence: 0,
            valid: true,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.valid
    }

    pub fn checkpoint_exists(&self) -> Result<bool, JournalError> {
        self.journal.checkpoint_exists()
    }

    /// Highest sequence number applied so far
    pub fn latest_sequence_number(&self) -> u64 {
        self.latest_sequence
    }

    /// Sequence of the checkpoint this tailer started from, if any
    pub fn checkpoint_sequence(&self) -> Option<u64> {
        self.checkpoint_sequence
    }

    /// Replay the newest checkpoint
    ///
    /// With `apply = false` the checkpoint is only read and validated, and
    /// the position still moves to its sequence.
    pub fn process_journal_checkpoint(&mut self, apply: bool) -> Result<u64, JournalError> {
        self.ensure_valid()?;
        let result = self.replay_checkpoint(apply);
        self.invalidate_on_fatal(result)
    }

    /// Apply every completed segment past the current position
    ///
    /// Returns the number of entries applied; 0 once caught up.
    pub fn process_next_journal_log_files(&mut self) -> Result<usize, JournalError> {
        self.ensure_valid()?;
        let result = self.replay_segments();
        self.invalidate_on_fatal(result)
    }

    fn replay_checkpoint(&mut self, apply: bool) -> Result<u64, JournalError> {
        let mut stream = self.journal.checkpoint_input_stream()?;
        let sequence = stream
            .checkpoint_sequence()
            .ok_or(JournalError::IllegalState("checkpoint stream without sequence"))?;
        if apply {
            self.state_machine.process_journal_checkpoint(stream)?;
        } else {
            while stream.next_record()?.is_some() {}
        }
        self.checkpoint_sequence = Some(sequence);
        self.latest_sequence = sequence;
        tracing::debug!(sequence, apply, "replayed checkpoint");
        Ok(sequence)
    }

    fn replay_segments(&mut self) -> Result<usize, JournalError> {
        // Segments between our position and a newer checkpoint are gone
        if let Some(checkpoint) = self.journal.latest_checkpoint()? {
            if checkpoint > self.latest_sequence {
                return Err(JournalError::CheckpointSuperseded {
                    checkpoint,
                    position: self.latest_sequence,
                });
            }
        }

        let mut applied = 0;
        for segment in self.journal.completed_segments()? {
            if segment.last <= self.latest_sequence {
                continue;
            }
            let expected = self.latest_sequence + 1;
            if segment.first > expected {
                return Err(JournalError::SequenceGap {
                    expected,
                    found: segment.first,
                });
            }

            let mut stream = self.journal.segment_input_stream(&segment)?;
            while let Some(record) = stream.next_record()? {
                if record.sequence <= self.latest_sequence {
                    continue;
                }
                self.state_machine.process_journal_entry(&record.entry)?;
                self.latest_sequence = record.sequence;
                applied += 1;
            }
        }

        if applied > 0 {
            tracing::debug!(applied, latest = self.latest_sequence, "replayed segments");
        }
        Ok(applied)
    }

    fn ensure_valid(&self) -> Result<(), JournalError> {
        if !self.valid {
            return Err(JournalError::IllegalState("journal tailer is invalid"));
        }
        Ok(())
    }

    fn invalidate_on_fatal<T>(&mut self, result: Result<T, JournalError>) -> Result<T, JournalError> {
        if let Err(e) = &result {
            if !e.is_transient() {
                tracing::warn!(error = %e, latest = self.latest_sequence, "journal tailer invalidated");
                self.valid = false;
            }
        }
        result
    }
}

#[cfg(test)]
#[path = "tailer_tests.rs"]
mod tests;
