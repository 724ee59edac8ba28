// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! On-disk record format
//!
//! Each line of a checkpoint or segment is one record:
//! `{"sequence":n,"entry":{...},"checksum":crc32}`. The checksum covers the
//! sequence number and the serialized entry, so a record copied to the
//! wrong position fails verification.

use serde::{Deserialize, Serialize};
use tern_core::{EntryKind, JournalEntry};
use thiserror::Error;

/// A sequenced, checksummed journal entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JournalRecord {
    pub sequence: u64,
    pub entry: JournalEntry,
    pub checksum: u32,
}

/// First line of a checkpoint file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckpointHeader {
    pub version: u32,
    /// Sequence number of the last entry folded into the checkpoint
    pub sequence: u64,
}

impl CheckpointHeader {
    pub const CURRENT_VERSION: u32 = 1;

    pub fn new(sequence: u64) -> Self {
        Self {
            version: Self::CURRENT_VERSION,
            sequence,
        }
    }
}

/// Why a line failed to decode
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecordError {
    #[error("malformed record: {0}")]
    Malformed(String),
    #[error("checksum mismatch")]
    ChecksumMismatch,
    #[error("unknown entry kind {0:?}")]
    UnknownKind(String),
}

impl JournalRecord {
    /// Create a record with computed checksum
    pub fn new(sequence: u64, entry: JournalEntry) -> Self {
        let checksum = Self::calculate_checksum(sequence, &entry);
        Self {
            sequence,
            entry,
            checksum,
        }
    }

    fn calculate_checksum(sequence: u64, entry: &JournalEntry) -> u32 {
        // Entries hold only integers, strings, bools and lists of those, so
        // serialization always succeeds
        let value = serde_json::to_value(entry).unwrap_or_default();
        Self::checksum_of(sequence, &value)
    }

    /// Checksum of a sequence number and an entry in JSON form
    ///
    /// Works on the untyped value, so a record whose kind this build can't
    /// parse can still be verified.
    pub fn checksum_of(sequence: u64, entry: &serde_json::Value) -> u32 {
        let json = entry.to_string();
        let mut hasher = crc32fast::Hasher::new();
        hasher.update(&sequence.to_le_bytes());
        hasher.update(json.as_bytes());
        hasher.finalize()
    }

    pub fn verify(&self) -> bool {
        self.checksum == Self::calculate_checksum(self.sequence, &self.entry)
    }

    /// Serialize to one line of JSON, without the trailing newline
    pub fn to_line(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Parse and verify one line
    ///
    /// An entry kind this build doesn't know is reported as
    /// [`RecordError::UnknownKind`] rather than as a malformed line, but
    /// only if the record's checksum holds. Otherwise the kind name itself
    /// may be the corrupted part.
    pub fn decode(line: &str) -> Result<Self, RecordError> {
        let value: serde_json::Value =
            serde_json::from_str(line).map_err(|e| RecordError::Malformed(e.to_string()))?;

        let kind = value
            .get("entry")
            .and_then(|entry| entry.get("kind"))
            .and_then(serde_json::Value::as_str);
        if let Some(kind) = kind {
            if kind.parse::<EntryKind>().is_err() {
                return Err(unknown_kind(&value, kind));
            }
        }

        let record: JournalRecord =
            serde_json::from_value(value).map_err(|e| RecordError::Malformed(e.to_string()))?;
        if !record.verify() {
            return Err(RecordError::ChecksumMismatch);
        }
        Ok(record)
    }
}

fn unknown_kind(value: &serde_json::Value, kind: &str) -> RecordError {
    let sequence = value.get("sequence").and_then(serde_json::Value::as_u64);
    let checksum = value.get("checksum").and_then(serde_json::Value::as_u64);
    let (Some(sequence), Some(checksum), Some(entry)) = (sequence, checksum, value.get("entry"))
    else {
        return RecordError::Malformed(format!("record of unknown kind {kind:?} is incomplete"));
    };
    if u64::from(JournalRecord::checksum_of(sequence, entry)) == checksum {
        RecordError::UnknownKind(kind.to_string())
    } else {
        RecordError::ChecksumMismatch
    }
}

#[cfg(test)]
#[path = "record_tests.rs"]
mod tests;
