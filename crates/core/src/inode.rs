// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Inode model
//!
//! An [`Inode`] is an immutable value. Every mutation returns a new inode,
//! which the namespace swaps into the tree in one step, so all fields
//! changed by a single journal entry become visible together.

use crate::entry::{InodeDirectoryEntry, InodeFileEntry, JournalEntry};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable numeric identifier of an inode; never reused
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct InodeId(pub u64);

impl InodeId {
    /// The root directory
    pub const ROOT: InodeId = InodeId(0);

    pub fn next(self) -> InodeId {
        InodeId(self.0.saturating_add(1))
    }
}

impl fmt::Display for InodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// File-only state
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FileAttributes {
    pub block_size_bytes: u64,
    pub length: u64,
    pub completed: bool,
    /// Ordered blocks that make up the file
    pub block_ids: Vec<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InodeKind {
    Directory,
    File(FileAttributes),
}

/// Parameters for creating a new file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileConfig {
    pub id: InodeId,
    pub parent_id: InodeId,
    pub name: String,
    pub creation_time_ms: i64,
    pub block_size_bytes: u64,
    pub pinned: bool,
}

/// Parameters for creating a new directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryConfig {
    pub id: InodeId,
    pub parent_id: InodeId,
    pub name: String,
    pub creation_time_ms: i64,
    pub pinned: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InodeConfig {
    File(FileConfig),
    Directory(DirectoryConfig),
}

/// A file or directory in the namespace
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Inode {
    id: InodeId,
    name: String,
    parent_id: Option<InodeId>,
    creation_time_ms: i64,
    last_modification_time_ms: i64,
    pinned: bool,
    persisted: bool,
    deleted: bool,
    kind: InodeKind,
}

impl Inode {
    /// Create a fresh inode from its configuration
    ///
    /// New inodes are not persisted, not deleted, and were last modified
    /// at creation. New files are empty and incomplete.
    pub fn new(config: InodeConfig) -> Self {
        match config {
            InodeConfig::File(file) => Self {
                id: file.id,
                name: file.name,
                parent_id: Some(file.parent_id),
                creation_time_ms: file.creation_time_ms,
                last_modification_time_ms: file.creation_time_ms,
                pinned: file.pinned,
                persisted: false,
                deleted: false,
                kind: InodeKind::File(FileAttributes {
                    block_size_bytes: file.block_size_bytes,
                    ..FileAttributes::default()
                }),
            },
            InodeConfig::Directory(dir) => Self {
                id: dir.id,
                name: dir.name,
                parent_id: Some(dir.parent_id),
                creation_time_ms: dir.creation_time_ms,
                last_modification_time_ms: dir.creation_time_ms,
                pinned: dir.pinned,
                persisted: false,
                deleted: false,
                kind: InodeKind::Directory,
            },
        }
    }

    /// The root directory: id 0, empty name, no parent
    pub fn root() -> Self {
        Self {
            id: InodeId::ROOT,
            name: String::new(),
            parent_id: None,
            creation_time_ms: 0,
            last_modification_time_ms: 0,
            pinned: false,
            persisted: false,
            deleted: false,
            kind: InodeKind::Directory,
        }
    }

    pub fn from_directory_entry(entry: &InodeDirectoryEntry) -> Self {
        Self {
            id: entry.id,
            name: entry.name.clone(),
            parent_id: entry.parent_id,
            creation_time_ms: entry.creation_time_ms,
            last_modification_time_ms: entry.last_modification_time_ms,
            pinned: entry.pinned,
            persisted: entry.persisted,
            deleted: entry.deleted,
            kind: InodeKind::Directory,
        }
    }

    pub fn from_file_entry(entry: &InodeFileEntry) -> Self {
        Self {
            id: entry.id,
            name: entry.name.clone(),
            parent_id: entry.parent_id,
            creation_time_ms: entry.creation_time_ms,
            last_modification_time_ms: entry.last_modification_time_ms,
            pinned: entry.pinned,
            persisted: entry.persisted,
            deleted: entry.deleted,
            kind: InodeKind::File(FileAttributes {
                block_size_bytes: entry.block_size_bytes,
                length: entry.length,
                completed: entry.completed,
                block_ids: entry.block_ids.clone(),
            }),
        }
    }

    /// The full-state entry that recreates this inode
    pub fn to_entry(&self) -> JournalEntry {
        match &self.kind {
            InodeKind::Directory => JournalEntry::InodeDirectory(InodeDirectoryEntry {
                id: self.id,
                parent_id: self.parent_id,
                name: self.name.clone(),
                creation_time_ms: self.creation_time_ms,
                last_modification_time_ms: self.last_modification_time_ms,
                pinned: self.pinned,
                persisted: self.persisted,
                deleted: self.deleted,
            }),
            InodeKind::File(file) => JournalEntry::InodeFile(InodeFileEntry {
                id: self.id,
                parent_id: self.parent_id,
                name: self.name.clone(),
                creation_time_ms: self.creation_time_ms,
                last_modification_time_ms: self.last_modification_time_ms,
                pinned: self.pinned,
                persisted: self.persisted,
                deleted: self.deleted,
                block_size_bytes: file.block_size_bytes,
                length: file.length,
                completed: file.completed,
                block_ids: file.block_ids.clone(),
            }),
        }
    }

    pub fn id(&self) -> InodeId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn parent_id(&self) -> Option<InodeId> {
        self.parent_id
    }

    pub fn creation_time_ms(&self) -> i64 {
        self.creation_time_ms
    }

    pub fn last_modification_time_ms(&self) -> i64 {
        self.last_modification_time_ms
    }

    pub fn is_pinned(&self) -> bool {
        self.pinned
    }

    pub fn is_persisted(&self) -> bool {
        self.persisted
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted
    }

    pub fn kind(&self) -> &InodeKind {
        &self.kind
    }

    pub fn is_directory(&self) -> bool {
        matches!(self.kind, InodeKind::Directory)
    }

    /// File attributes, or `None` for a directory
    pub fn file(&self) -> Option<&FileAttributes> {
        match &self.kind {
            InodeKind::File(file) => Some(file),
            InodeKind::Directory => None,
        }
    }

    // Modification time strictly increases even when the clock does not.
    fn touched(&self, op_time_ms: i64) -> i64 {
        op_time_ms.max(self.last_modification_time_ms.saturating_add(1))
    }

    /// Move and/or rename
    pub fn renamed(&self, new_parent_id: InodeId, new_name: &str, op_time_ms: i64) -> Self {
        Self {
            name: new_name.to_string(),
            parent_id: Some(new_parent_id),
            last_modification_time_ms: self.touched(op_time_ms),
            ..self.clone()
        }
    }

    pub fn with_pinned(&self, pinned: bool, op_time_ms: i64) -> Self {
        Self {
            pinned,
            last_modification_time_ms: self.touched(op_time_ms),
            ..self.clone()
        }
    }

    pub fn with_persisted(&self, op_time_ms: i64) -> Self {
        Self {
            persisted: true,
            last_modification_time_ms: self.touched(op_time_ms),
            ..self.clone()
        }
    }

    /// Attach the final block list and length to a file and mark it complete
    ///
    /// Returns `None` for a directory.
    pub fn completed(&self, block_ids: &[u64], length: u64, op_time_ms: i64) -> Option<Self> {
        let file = self.file()?;
        Some(Self {
            last_modification_time_ms: self.touched(op_time_ms),
            kind: InodeKind::File(FileAttributes {
                block_size_bytes: file.block_size_bytes,
                length,
                completed: true,
                block_ids: block_ids.to_vec(),
            }),
            ..self.clone()
        })
    }

    /// Set the soft-delete marker; no other field changes
    pub fn delete(&self) -> Self {
        Self {
            deleted: true,
            ..self.clone()
        }
    }

    /// Clear the soft-delete marker; no other field changes
    pub fn restore(&self) -> Self {
        Self {
            deleted: false,
            ..self.clone()
        }
    }
}

#[cfg(test)]
#[path = "inode_tests.rs"]
mod tests;
