// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Journal entry types
//!
//! Every namespace mutation is represented as a typed entry. Entries are the
//! payload of the journal: the leader records them, tailers replay them.
//!
//! On the wire an entry is `{ "kind": "BLOCK_INFO", "parameters": { ... } }`,
//! with parameter names in camelCase.

use crate::inode::InodeId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// One namespace mutation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    tag = "kind",
    content = "parameters",
    rename_all = "SCREAMING_SNAKE_CASE"
)]
pub enum JournalEntry {
    BlockInfo(BlockInfoEntry),
    InodeDirectory(InodeDirectoryEntry),
    InodeFile(InodeFileEntry),
    CompleteFile(CompleteFileEntry),
    Rename(RenameEntry),
    SetPinned(SetPinnedEntry),
    Persist(PersistEntry),
    Delete(DeleteEntry),
    Restore(RestoreEntry),
}

/// Discriminator of a [`JournalEntry`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EntryKind {
    BlockInfo,
    InodeDirectory,
    InodeFile,
    CompleteFile,
    Rename,
    SetPinned,
    Persist,
    Delete,
    Restore,
}

impl EntryKind {
    pub const ALL: [EntryKind; 9] = [
        EntryKind::BlockInfo,
        EntryKind::InodeDirectory,
        EntryKind::InodeFile,
        EntryKind::CompleteFile,
        EntryKind::Rename,
        EntryKind::SetPinned,
        EntryKind::Persist,
        EntryKind::Delete,
        EntryKind::Restore,
    ];

    /// Wire name of this kind
    pub fn as_str(&self) -> &'static str {
        match self {
            EntryKind::BlockInfo => "BLOCK_INFO",
            EntryKind::InodeDirectory => "INODE_DIRECTORY",
            EntryKind::InodeFile => "INODE_FILE",
            EntryKind::CompleteFile => "COMPLETE_FILE",
            EntryKind::Rename => "RENAME",
            EntryKind::SetPinned => "SET_PINNED",
            EntryKind::Persist => "PERSIST",
            EntryKind::Delete => "DELETE",
            EntryKind::Restore => "RESTORE",
        }
    }
}

impl fmt::Display for EntryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error parsing an unknown entry kind name
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown journal entry kind: {0}")]
pub struct UnknownEntryKind(pub String);

impl FromStr for EntryKind {
    type Err = UnknownEntryKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EntryKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| UnknownEntryKind(s.to_string()))
    }
}

/// The recorded length of a block
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockInfoEntry {
    pub block_id: u64,
    pub length: u64,
}

/// A directory inode, in full
///
/// Used both to create a directory and to record one in a checkpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InodeDirectoryEntry {
    pub id: InodeId,
    pub parent_id: Option<InodeId>,
    pub name: String,
    pub creation_time_ms: i64,
    pub last_modification_time_ms: i64,
    pub pinned: bool,
    pub persisted: bool,
    pub deleted: bool,
}

/// A file inode, in full
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InodeFileEntry {
    pub id: InodeId,
    pub parent_id: Option<InodeId>,
    pub name: String,
    pub creation_time_ms: i64,
    pub last_modification_time_ms: i64,
    pub pinned: bool,
    pub persisted: bool,
    pub deleted: bool,
    pub block_size_bytes: u64,
    pub length: u64,
    pub completed: bool,
    pub block_ids: Vec<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompleteFileEntry {
    pub id: InodeId,
    pub block_ids: Vec<u64>,
    pub length: u64,
    pub op_time_ms: i64,
}

/// Rename and/or move an inode
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenameEntry {
    pub id: InodeId,
    pub new_parent_id: InodeId,
    pub new_name: String,
    pub op_time_ms: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetPinnedEntry {
    pub id: InodeId,
    pub pinned: bool,
    pub op_time_ms: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistEntry {
    pub id: InodeId,
    pub op_time_ms: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteEntry {
    pub id: InodeId,
    pub recursive: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RestoreEntry {
    pub id: InodeId,
}

impl JournalEntry {
    pub fn kind(&self) -> EntryKind {
        match self {
            JournalEntry::BlockInfo(_) => EntryKind::BlockInfo,
            JournalEntry::InodeDirectory(_) => EntryKind::InodeDirectory,
            JournalEntry::InodeFile(_) => EntryKind::InodeFile,
            JournalEntry::CompleteFile(_) => EntryKind::CompleteFile,
            JournalEntry::Rename(_) => EntryKind::Rename,
            JournalEntry::SetPinned(_) => EntryKind::SetPinned,
            JournalEntry::Persist(_) => EntryKind::Persist,
            JournalEntry::Delete(_) => EntryKind::Delete,
            JournalEntry::Restore(_) => EntryKind::Restore,
        }
    }

    /// The entry's parameters keyed by their wire names
    pub fn parameters(&self) -> BTreeMap<String, serde_json::Value> {
        // Entries only contain integers, strings, bools and vectors of those,
        // so serialization cannot fail.
        match serde_json::to_value(self) {
            Ok(serde_json::Value::Object(mut object)) => match object.remove("parameters") {
                Some(serde_json::Value::Object(parameters)) => parameters.into_iter().collect(),
                _ => BTreeMap::new(),
            },
            _ => BTreeMap::new(),
        }
    }

    /// The inode this entry mutates, if any
    pub fn inode_id(&self) -> Option<InodeId> {
        match self {
            JournalEntry::BlockInfo(_) => None,
            JournalEntry::InodeDirectory(e) => Some(e.id),
            JournalEntry::InodeFile(e) => Some(e.id),
            JournalEntry::CompleteFile(e) => Some(e.id),
            JournalEntry::Rename(e) => Some(e.id),
            JournalEntry::SetPinned(e) => Some(e.id),
            JournalEntry::Persist(e) => Some(e.id),
            JournalEntry::Delete(e) => Some(e.id),
            JournalEntry::Restore(e) => Some(e.id),
        }
    }
}

#[cfg(test)]
#[path = "entry_tests.rs"]
mod tests;
