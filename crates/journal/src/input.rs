// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Forward-only input streams over checkpoints and segments
//!
//! A stream yields records in order, checks that their sequence numbers are
//! contiguous, and reports the first bad line as an error. End of stream is
//! `Ok(None)`. Streams are not rewindable; open a new one to read again.

use crate::error::JournalError;
use crate::record::{CheckpointHeader, JournalRecord, RecordError};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use tern_core::JournalEntry;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Source {
    /// Records are numbered from 0; `sequence` comes from the header
    Checkpoint { sequence: u64 },
    /// Records must cover exactly `first..=last`
    Segment { first: u64, last: u64 },
}

/// Lazy reader over one checkpoint or completed segment
pub struct JournalInputStream {
    path: PathBuf,
    reader: Option<BufReader<File>>,
    source: Source,
    line_number: u64,
    next_expected: u64,
    latest_sequence: Option<u64>,
}

impl JournalInputStream {
    /// Open a checkpoint and read its header
    pub fn open_checkpoint(path: &Path) -> Result<Self, JournalError> {
        let mut reader = BufReader::new(File::open(path)?);
        let mut line = String::new();
        reader.read_line(&mut line)?;
        let header: CheckpointHeader =
            serde_json::from_str(line.trim()).map_err(|e| JournalError::Corrupted {
                path: path.to_path_buf(),
                line: 1,
                reason: format!("bad checkpoint header: {e}"),
            })?;
        if header.version != CheckpointHeader::CURRENT_VERSION {
            return Err(JournalError::Corrupted {
                path: path.to_path_buf(),
                line: 1,
                reason: format!(
                    "unsupported checkpoint version: {} (expected {})",
                    header.version,
                    CheckpointHeader::CURRENT_VERSION
                ),
            });
        }

        Ok(Self {
            path: path.to_path_buf(),
            reader: Some(reader),
            source: Source::Checkpoint {
                sequence: header.sequence,
            },
            line_number: 1,
            next_expected: 0,
            latest_sequence: None,
        })
    }

    /// Open a completed segment covering `first..=last`
    pub fn open_segment(path: &Path, first: u64, last: u64) -> Result<Self, JournalError> {
        let reader = BufReader::new(File::open(path)?);
        Ok(Self {
            path: path.to_path_buf(),
            reader: Some(reader),
            source: Source::Segment { first, last },
            line_number: 0,
            next_expected: first,
            latest_sequence: None,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Sequence number the checkpoint covers, `None` for a segment
    pub fn checkpoint_sequence(&self) -> Option<u64> {
        match self.source {
            Source::Checkpoint { sequence } => Some(sequence),
            Source::Segment { .. } => None,
        }
    }

    /// Sequence number of the last record returned
    pub fn latest_sequence_number(&self) -> Option<u64> {
        self.latest_sequence
    }

    /// Next entry, or `None` once the stream is exhausted
    pub fn next_entry(&mut self) -> Result<Option<JournalEntry>, JournalError> {
        Ok(self.next_record()?.map(|record| record.entry))
    }

    /// Next record, or `None` once the stream is exhausted
    pub fn next_record(&mut self) -> Result<Option<JournalRecord>, JournalError> {
        let Some(reader) = self.reader.as_mut() else {
            return Ok(None);
        };

        loop {
            let mut line = String::new();
            let bytes_read = reader.read_line(&mut line)?;
            if bytes_read == 0 {
                self.reader = None;
                return self.check_complete().map(|()| None);
            }
            self.line_number += 1;

            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }

            let record = decode_line(trimmed, &self.path, self.line_number)?;
            if record.sequence != self.next_expected {
                return Err(JournalError::SequenceGap {
                    expected: self.next_expected,
                    found: record.sequence,
                });
            }
            if let Source::Segment { last, .. } = self.source {
                if record.sequence > last {
                    return Err(self.corrupted(format!(
                        "record {} beyond segment end {last}",
                        record.sequence
                    )));
                }
            }

            self.next_expected = record.sequence.saturating_add(1);
            self.latest_sequence = Some(record.sequence);
            return Ok(Some(record));
        }
    }

    // A segment must hold every sequence number its name claims
    fn check_complete(&self) -> Result<(), JournalError> {
        match self.source {
            Source::Segment { last, .. } if self.latest_sequence != Some(last) => {
                Err(self.corrupted(format!(
                    "segment ended at {:?}, expected last record {last}",
                    self.latest_sequence
                )))
            }
            _ => Ok(()),
        }
    }

    fn corrupted(&self, reason: String) -> JournalError {
        JournalError::Corrupted {
            path: self.path.clone(),
            line: self.line_number,
            reason,
        }
    }
}

fn decode_line(line: &str, path: &Path, line_number: u64) -> Result<JournalRecord, JournalError> {
    JournalRecord::decode(line).map_err(|e| match e {
        RecordError::Malformed(reason) => JournalError::Corrupted {
            path: path.to_path_buf(),
            line: line_number,
            reason,
        },
        RecordError::ChecksumMismatch => JournalError::ChecksumMismatch {
            path: path.to_path_buf(),
            line: line_number,
        },
        RecordError::UnknownKind(kind) => JournalError::UnknownEntryKind {
            path: path.to_path_buf(),
            line: line_number,
            kind,
        },
    })
}

/// Valid prefix of an incomplete segment left behind by a writer
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct IncompleteScan {
    /// Sequence range of the valid records, `None` if there are none
    pub range: Option<(u64, u64)>,
    /// Byte length of the valid prefix
    pub valid_len: u64,
    /// Byte length of the whole file
    pub total_len: u64,
}

/// Scan an incomplete segment for its longest valid prefix
///
/// Stops at the first line that is torn (no trailing newline), unparsable,
/// fails its checksum, or breaks the sequence. A checksummed record of an
/// unknown entry kind is not a torn write and is returned as an error; a
/// kind name that fails its checksum counts as torn.
pub(crate) fn scan_incomplete(path: &Path) -> Result<IncompleteScan, JournalError> {
    let total_len = std::fs::metadata(path)?.len();
    let mut reader = BufReader::new(File::open(path)?);
    let mut position: u64 = 0;
    let mut line_number: u64 = 0;
    let mut range: Option<(u64, u64)> = None;

    loop {
        let mut line = String::new();
        let bytes_read = match reader.read_line(&mut line) {
            Ok(n) => n,
            // Invalid UTF-8 from a torn write
            Err(e) if e.kind() == std::io::ErrorKind::InvalidData => break,
            Err(e) => return Err(e.into()),
        };
        if bytes_read == 0 || !line.ends_with('\n') {
            break;
        }
        line_number += 1;

        let trimmed = line.trim();
        if !trimmed.is_empty() {
            let record = match decode_line(trimmed, path, line_number) {
                Ok(record) => record,
                Err(e @ JournalError::UnknownEntryKind { .. }) => return Err(e),
                Err(_) => break,
            };
            let contiguous = match range {
                None => true,
                Some((_, last)) => record.sequence == last.saturating_add(1),
            };
            if !contiguous {
                break;
            }
            range = Some(match range {
                None => (record.sequence, record.sequence),
                Some((first, _)) => (first, record.sequence),
            });
        }
        position += bytes_read as u64;
    }

    Ok(IncompleteScan {
        range,
        valid_len: position,
        total_len,
    })
}

#[cfg(test)]
#[path = "input_tests.rs"]
mod tests;
