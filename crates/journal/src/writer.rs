// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Journal writer for the leader
//!
//! The writer holds an exclusive lock on the journal directory for its
//! whole life. It must write a checkpoint before it accepts appends, and
//! it assigns strictly increasing, gapless sequence numbers after that
//! checkpoint. Appends go to `current.jsonl`, which is sealed into a
//! completed segment on rotation and on close.

use crate::error::JournalError;
use crate::input::scan_incomplete;
use crate::layout::JournalLayout;
use crate::record::{CheckpointHeader, JournalRecord};
use fs2::FileExt;
use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use tern_core::JournalEntry;

/// The incomplete segment currently being appended to
struct SegmentWriter {
    out: BufWriter<File>,
    first: u64,
    last: u64,
    bytes: u64,
}

/// Single producer of journal entries
pub struct JournalWriter {
    layout: JournalLayout,
    max_segment_bytes: u64,
    lock: Option<File>,
    current: Option<SegmentWriter>,
    /// Set once a checkpoint has been written
    next_sequence: Option<u64>,
}

impl JournalWriter {
    pub(crate) fn new(layout: JournalLayout, max_segment_bytes: u64) -> Result<Self, JournalError> {
        fs::create_dir_all(layout.dir())?;
        let lock = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(layout.lock_path())?;
        lock.try_lock_exclusive()
            .map_err(JournalError::WriterLocked)?;

        Ok(Self {
            layout,
            max_segment_bytes,
            lock: Some(lock),
            current: None,
            next_sequence: None,
        })
    }

    /// Sequence number the next append gets, once a checkpoint exists
    pub fn next_sequence_number(&self) -> Option<u64> {
        self.next_sequence
    }

    pub fn is_closed(&self) -> bool {
        self.lock.is_none()
    }

    /// Seal every incomplete segment into a completed one
    ///
    /// Also recovers an incomplete segment left behind by a previous writer
    /// that crashed: a torn tail is truncated at the last valid record, and
    /// a file with no valid record is removed. Idempotent.
    pub fn complete_all_logs(&mut self) -> Result<(), JournalError> {
        self.ensure_open()?;
        if self.current.is_some() {
            return self.seal_current();
        }

        let path = self.layout.current_path();
        if !path.exists() {
            return Ok(());
        }

        let scan = scan_incomplete(&path)?;
        let Some((first, last)) = scan.range else {
            tracing::warn!(path = %path.display(), "removing incomplete segment with no valid records");
            fs::remove_file(&path)?;
            self.layout.sync_dir()?;
            return Ok(());
        };

        if scan.valid_len < scan.total_len {
            let file = OpenOptions::new().write(true).open(&path)?;
            file.set_len(scan.valid_len)?;
            file.sync_all()?;
            tracing::warn!(
                path = %path.display(),
                discarded = scan.total_len - scan.valid_len,
                "truncated torn tail of incomplete segment"
            );
        }

        let sealed = self.layout.segment_path(first, last);
        fs::rename(&path, &sealed)?;
        self.layout.sync_dir()?;
        tracing::info!(first, last, "sealed incomplete segment");
        Ok(())
    }

    /// Begin writing a checkpoint covering entries up to `sequence`
    ///
    /// Requires that no incomplete segment exists and that `sequence` is
    /// not below the current checkpoint or any completed segment.
    pub fn checkpoint_output_stream(
        &mut self,
        sequence: u64,
    ) -> Result<CheckpointOutputStream<'_>, JournalError> {
        self.ensure_open()?;
        if self.current.is_some() || self.layout.current_path().exists() {
            return Err(JournalError::IllegalState(
                "checkpoint requested while an incomplete segment exists",
            ));
        }
        if self
            .layout
            .latest_checkpoint()?
            .is_some_and(|latest| latest > sequence)
        {
            return Err(JournalError::IllegalState(
                "checkpoint would be older than the current checkpoint",
            ));
        }
        if self
            .layout
            .segments()?
            .iter()
            .any(|segment| segment.last > sequence)
        {
            return Err(JournalError::IllegalState(
                "checkpoint would be older than a completed segment",
            ));
        }

        let tmp_path = self.layout.checkpoint_tmp_path();
        let mut out = BufWriter::new(File::create(&tmp_path)?);
        serde_json::to_writer(&mut out, &CheckpointHeader::new(sequence))?;
        out.write_all(b"\n")?;

        Ok(CheckpointOutputStream {
            writer: self,
            out,
            tmp_path,
            sequence,
            entries: 0,
        })
    }

    /// Append an entry and return its sequence number
    ///
    /// The entry is buffered; call [`JournalWriter::flush`] to make it
    /// durable.
    pub fn append(&mut self, entry: &JournalEntry) -> Result<u64, JournalError> {
        self.ensure_open()?;
        let Some(sequence) = self.next_sequence else {
            return Err(JournalError::IllegalState(
                "append before a checkpoint was written",
            ));
        };

        if self
            .current
            .as_ref()
            .is_some_and(|segment| segment.bytes >= self.max_segment_bytes)
        {
            self.seal_current()?;
        }
        if self.current.is_none() {
            let file = OpenOptions::new()
                .create_new(true)
                .write(true)
                .open(self.layout.current_path())?;
            self.current = Some(SegmentWriter {
                out: BufWriter::new(file),
                first: sequence,
                last: sequence,
                bytes: 0,
            });
        }
        let Some(segment) = self.current.as_mut() else {
            return Err(JournalError::IllegalState("no incomplete segment"));
        };

        let mut line = JournalRecord::new(sequence, entry.clone()).to_line()?;
        line.push('\n');
        segment.out.write_all(line.as_bytes())?;
        segment.bytes += line.len() as u64;
        segment.last = sequence;
        self.next_sequence = Some(sequence + 1);
        Ok(sequence)
    }

    /// Force appended entries to durable storage
    pub fn flush(&mut self) -> Result<(), JournalError> {
        self.ensure_open()?;
        if let Some(segment) = self.current.as_mut() {
            segment.out.flush()?;
            segment.out.get_ref().sync_data()?;
        }
        Ok(())
    }

    /// Seal the current segment and release the lock. Idempotent.
    pub fn close(&mut self) -> Result<(), JournalError> {
        let Some(lock) = self.lock.take() else {
            return Ok(());
        };
        let sealed = if self.current.is_some() {
            self.seal_current()
        } else {
            Ok(())
        };
        FileExt::unlock(&lock)?;
        sealed
    }

    fn ensure_open(&self) -> Result<(), JournalError> {
        if self.is_closed() {
            return Err(JournalError::IllegalState("journal writer is closed"));
        }
        Ok(())
    }

    fn seal_current(&mut self) -> Result<(), JournalError> {
        let Some(mut segment) = self.current.take() else {
            return Ok(());
        };
        segment.out.flush()?;
        segment.out.get_ref().sync_all()?;
        drop(segment.out);

        let sealed = self.layout.segment_path(segment.first, segment.last);
        fs::rename(self.layout.current_path(), &sealed)?;
        self.layout.sync_dir()?;
        tracing::debug!(first = segment.first, last = segment.last, "sealed segment");
        Ok(())
    }
}

/// Scoped write target for a new checkpoint
///
/// Nothing becomes visible until [`CheckpointOutputStream::close`]; a
/// stream dropped without closing leaves the previous checkpoint in place.
pub struct CheckpointOutputStream<'a> {
    writer: &'a mut JournalWriter,
    out: BufWriter<File>,
    tmp_path: PathBuf,
    sequence: u64,
    entries: u64,
}

impl CheckpointOutputStream<'_> {
    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    pub fn write_entry(&mut self, entry: &JournalEntry) -> Result<(), JournalError> {
        let mut line = JournalRecord::new(self.entries, entry.clone()).to_line()?;
        line.push('\n');
        self.out.write_all(line.as_bytes())?;
        self.entries += 1;
        Ok(())
    }

    /// Atomically install the checkpoint and drop what it supersedes
    ///
    /// Older checkpoints and every completed segment ending at or before
    /// the checkpoint's sequence are removed. The writer then accepts
    /// appends from `sequence + 1`.
    pub fn close(self) -> Result<(), JournalError> {
        let Self {
            writer,
            mut out,
            tmp_path,
            sequence,
            entries,
        } = self;
        out.flush()?;
        out.get_ref().sync_all()?;
        drop(out);

        let layout = &writer.layout;
        fs::rename(&tmp_path, layout.checkpoint_path(sequence))?;
        layout.sync_dir()?;

        for old in layout.checkpoints()?.into_iter().filter(|s| *s < sequence) {
            fs::remove_file(layout.checkpoint_path(old))?;
        }
        for segment in layout.segments()?.into_iter().filter(|s| s.last <= sequence) {
            fs::remove_file(&segment.path)?;
        }
        layout.sync_dir()?;

        writer.next_sequence = Some(sequence + 1);
        tracing::info!(sequence, entries, "wrote checkpoint");
        Ok(())
    }
}

#[cfg(test)]
#[path = "writer_tests.rs"]
mod tests;
