// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Namespace state and the entry transition function
//!
//! [`Namespace::apply`] is the one function both the leader and every
//! tailer use to turn an entry into a state change. It is split in two:
//! [`Namespace::plan`] validates the entry and computes the new inode
//! values without touching the tree, and [`Namespace::commit`] swaps them
//! in. The leader journals the entry between the two steps.

use crate::entry::{
    BlockInfoEntry, CompleteFileEntry, DeleteEntry, InodeFileEntry, JournalEntry, PersistEntry,
    RenameEntry, RestoreEntry, SetPinnedEntry,
};
use crate::inode::{Inode, InodeId};
use crate::tree::InodeTree;
use std::collections::BTreeMap;
use thiserror::Error;

/// Recorded length of a block
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockInfo {
    pub block_id: u64,
    pub length: u64,
}

/// Errors from validating an entry against the namespace
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApplyError {
    #[error("inode {0} not found")]
    NotFound(InodeId),
    #[error("inode {0} already exists")]
    AlreadyExists(InodeId),
    #[error("inode {0} is not a directory")]
    NotADirectory(InodeId),
    #[error("parent directory {0} is deleted")]
    ParentDeleted(InodeId),
    #[error("{name:?} already exists in directory {parent}")]
    NameConflict { parent: InodeId, name: String },
    #[error("invalid name {0:?}")]
    InvalidName(String),
    #[error("cannot move inode {id} below itself ({new_parent})")]
    Cycle { id: InodeId, new_parent: InodeId },
    #[error("the root directory cannot be modified")]
    CannotModifyRoot,
    #[error("inode {0} is deleted")]
    Deleted(InodeId),
    #[error("inode {0} is not deleted")]
    NotDeleted(InodeId),
    #[error("directory {0} is not empty")]
    DirectoryNotEmpty(InodeId),
    #[error("inode {0} is not a file")]
    NotAFile(InodeId),
    #[error("file {0} is already completed")]
    AlreadyCompleted(InodeId),
    #[error("invalid entry: {0}")]
    InvalidEntry(String),
}

/// New values computed from one entry, ready to be committed together
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Mutation {
    pub inodes: Vec<Inode>,
    pub blocks: Vec<BlockInfo>,
}

/// The replicated state: inode tree plus block lengths
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Namespace {
    tree: InodeTree,
    blocks: BTreeMap<u64, BlockInfo>,
}

impl Namespace {
    /// An empty namespace: only the root directory, no blocks
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tree(&self) -> &InodeTree {
        &self.tree
    }

    pub fn block(&self, block_id: u64) -> Option<&BlockInfo> {
        self.blocks.get(&block_id)
    }

    pub fn blocks(&self) -> impl Iterator<Item = &BlockInfo> {
        self.blocks.values()
    }

    /// Validate and apply one entry
    pub fn apply(&mut self, entry: &JournalEntry) -> Result<(), ApplyError> {
        let mutation = self.plan(entry)?;
        self.commit(mutation);
        Ok(())
    }

    /// Swap planned values into the namespace
    pub fn commit(&mut self, mutation: Mutation) {
        for inode in mutation.inodes {
            self.tree.upsert(inode);
        }
        for block in mutation.blocks {
            self.blocks.insert(block.block_id, block);
        }
    }

    /// Validate an entry and compute the values it produces
    pub fn plan(&self, entry: &JournalEntry) -> Result<Mutation, ApplyError> {
        match entry {
            JournalEntry::BlockInfo(e) => Ok(self.plan_block_info(e)),
            JournalEntry::InodeDirectory(e) => self.plan_insert(Inode::from_directory_entry(e)),
            JournalEntry::InodeFile(e) => self.plan_insert_file(e),
            JournalEntry::CompleteFile(e) => self.plan_complete(e),
            JournalEntry::Rename(e) => self.plan_rename(e),
            JournalEntry::SetPinned(e) => self.plan_set_pinned(e),
            JournalEntry::Persist(e) => self.plan_persist(e),
            JournalEntry::Delete(e) => self.plan_delete(e),
            JournalEntry::Restore(e) => self.plan_restore(e),
        }
    }

    /// Entries that rebuild this namespace from [`Namespace::new`]
    ///
    /// Inodes come parents first, then block lengths.
    pub fn checkpoint_entries(&self) -> Vec<JournalEntry> {
        let inodes = self.tree.preorder().into_iter().map(Inode::to_entry);
        let blocks = self.blocks.values().map(|b| {
            JournalEntry::BlockInfo(BlockInfoEntry {
                block_id: b.block_id,
                length: b.length,
            })
        });
        inodes.chain(blocks).collect()
    }

    fn plan_block_info(&self, entry: &BlockInfoEntry) -> Mutation {
        Mutation {
            inodes: Vec::new(),
            blocks: vec![BlockInfo {
                block_id: entry.block_id,
                length: entry.length,
            }],
        }
    }

    fn plan_insert_file(&self, entry: &InodeFileEntry) -> Result<Mutation, ApplyError> {
        if entry.id == InodeId::ROOT {
            return Err(ApplyError::InvalidEntry("the root must be a directory".into()));
        }
        self.plan_insert(Inode::from_file_entry(entry))
    }

    fn plan_insert(&self, inode: Inode) -> Result<Mutation, ApplyError> {
        let id = inode.id();
        let Some(parent_id) = inode.parent_id() else {
            // Only the root has no parent; recording it replaces the initial root
            if id == InodeId::ROOT && inode.is_directory() && !inode.is_deleted() {
                return Ok(Mutation {
                    inodes: vec![inode],
                    blocks: Vec::new(),
                });
            }
            return Err(ApplyError::InvalidEntry(format!("inode {id} has no parent")));
        };
        if self.tree.contains(id) {
            return Err(ApplyError::AlreadyExists(id));
        }
        validate_name(inode.name())?;
        let parent = self.directory(parent_id)?;
        // Deleted inodes recorded in a checkpoint may sit below deleted parents
        if !inode.is_deleted() {
            if parent.is_deleted() {
                return Err(ApplyError::ParentDeleted(parent_id));
            }
            self.check_name_free(parent_id, inode.name(), id)?;
        }
        Ok(Mutation {
            inodes: vec![inode],
            blocks: Vec::new(),
        })
    }

    fn plan_complete(&self, entry: &CompleteFileEntry) -> Result<Mutation, ApplyError> {
        let inode = self.live(entry.id)?;
        let file = inode.file().ok_or(ApplyError::NotAFile(entry.id))?;
        if file.completed {
            return Err(ApplyError::AlreadyCompleted(entry.id));
        }
        let completed = inode
            .completed(&entry.block_ids, entry.length, entry.op_time_ms)
            .ok_or(ApplyError::NotAFile(entry.id))?;
        Ok(Mutation {
            inodes: vec![completed],
            blocks: Vec::new(),
        })
    }

    fn plan_rename(&self, entry: &RenameEntry) -> Result<Mutation, ApplyError> {
        let inode = self.modifiable(entry.id)?;
        validate_name(&entry.new_name)?;
        let parent = self.directory(entry.new_parent_id)?;
        if parent.is_deleted() {
            return Err(ApplyError::ParentDeleted(entry.new_parent_id));
        }
        if self.tree.is_ancestor(entry.id, entry.new_parent_id) {
            return Err(ApplyError::Cycle {
                id: entry.id,
                new_parent: entry.new_parent_id,
            });
        }
        self.check_name_free(entry.new_parent_id, &entry.new_name, entry.id)?;
        Ok(Mutation {
            inodes: vec![inode.renamed(entry.new_parent_id, &entry.new_name, entry.op_time_ms)],
            blocks: Vec::new(),
        })
    }

    fn plan_set_pinned(&self, entry: &SetPinnedEntry) -> Result<Mutation, ApplyError> {
        let inode = self.modifiable(entry.id)?;
        let mut inodes = vec![inode.with_pinned(entry.pinned, entry.op_time_ms)];
        inodes.extend(
            self.live_descendants(entry.id)
                .map(|child| child.with_pinned(entry.pinned, entry.op_time_ms)),
        );
        Ok(Mutation {
            inodes,
            blocks: Vec::new(),
        })
    }

    fn plan_persist(&self, entry: &PersistEntry) -> Result<Mutation, ApplyError> {
        let inode = self.modifiable(entry.id)?;
        Ok(Mutation {
            inodes: vec![inode.with_persisted(entry.op_time_ms)],
            blocks: Vec::new(),
        })
    }

    fn plan_delete(&self, entry: &DeleteEntry) -> Result<Mutation, ApplyError> {
        let inode = self.modifiable(entry.id)?;
        let mut live_below = self.live_descendants(entry.id).peekable();
        if !entry.recursive && live_below.peek().is_some() {
            return Err(ApplyError::DirectoryNotEmpty(entry.id));
        }
        let mut inodes = vec![inode.delete()];
        inodes.extend(live_below.map(Inode::delete));
        Ok(Mutation {
            inodes,
            blocks: Vec::new(),
        })
    }

    fn plan_restore(&self, entry: &RestoreEntry) -> Result<Mutation, ApplyError> {
        let inode = self.existing(entry.id)?;
        if !inode.is_deleted() {
            return Err(ApplyError::NotDeleted(entry.id));
        }
        let parent_id = inode.parent_id().ok_or(ApplyError::CannotModifyRoot)?;
        let parent = self.existing(parent_id)?;
        if parent.is_deleted() {
            return Err(ApplyError::ParentDeleted(parent_id));
        }
        self.check_name_free(parent_id, inode.name(), entry.id)?;
        Ok(Mutation {
            inodes: vec![inode.restore()],
            blocks: Vec::new(),
        })
    }

    fn existing(&self, id: InodeId) -> Result<&Inode, ApplyError> {
        self.tree.get(id).ok_or(ApplyError::NotFound(id))
    }

    fn live(&self, id: InodeId) -> Result<&Inode, ApplyError> {
        let inode = self.existing(id)?;
        if inode.is_deleted() {
            return Err(ApplyError::Deleted(id));
        }
        Ok(inode)
    }

    /// A live inode other than the root
    fn modifiable(&self, id: InodeId) -> Result<&Inode, ApplyError> {
        if id == InodeId::ROOT {
            return Err(ApplyError::CannotModifyRoot);
        }
        self.live(id)
    }

    fn directory(&self, id: InodeId) -> Result<&Inode, ApplyError> {
        let inode = self.existing(id)?;
        if !inode.is_directory() {
            return Err(ApplyError::NotADirectory(id));
        }
        Ok(inode)
    }

    fn check_name_free(&self, parent: InodeId, name: &str, id: InodeId) -> Result<(), ApplyError> {
        match self.tree.live_child_named(parent, name) {
            Some(other) if other.id() != id => Err(ApplyError::NameConflict {
                parent,
                name: name.to_string(),
            }),
            _ => Ok(()),
        }
    }

    fn live_descendants(&self, id: InodeId) -> impl Iterator<Item = &Inode> {
        self.tree
            .descendants(id)
            .into_iter()
            .filter_map(|child| self.tree.get(child))
            .filter(|child| !child.is_deleted())
    }
}

fn validate_name(name: &str) -> Result<(), ApplyError> {
    if name.is_empty() || name.contains('/') {
        return Err(ApplyError::InvalidName(name.to_string()));
    }
    Ok(())
}

#[cfg(test)]
#[path = "namespace_tests.rs"]
mod tests;
