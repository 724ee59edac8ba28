// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Namespace master
//!
//! [`NamespaceState`] is the journal state machine: a [`Namespace`] behind a
//! reader-writer lock. [`NamespaceMaster`] adds the leader mutation API on
//! top of [`MasterBase`].

use crate::error::MasterError;
use crate::master::{Master, MasterBase, MasterJournal, MasterState};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tern_core::{
    ApplyError, BlockInfoEntry, Clock, CompleteFileEntry, DeleteEntry, DirectoryConfig,
    FileConfig, Inode, InodeConfig, InodeId, JournalEntry, Namespace, PersistEntry, RenameEntry,
    RestoreEntry, SetPinnedEntry, TailerConfig,
};
use tern_journal::{CheckpointOutputStream, JournalError, JournalStateMachine, ReadWriteJournal};

/// Replicated namespace state
pub struct NamespaceState {
    service_name: String,
    namespace: RwLock<Namespace>,
}

impl NamespaceState {
    pub fn new(service_name: impl Into<String>) -> Self {
        Self {
            service_name: service_name.into(),
            namespace: RwLock::new(Namespace::new()),
        }
    }

    /// Consistent view for readers; never observes a half-applied entry
    pub fn read(&self) -> RwLockReadGuard<'_, Namespace> {
        self.namespace.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Namespace> {
        self.namespace.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl JournalStateMachine for NamespaceState {
    fn process_journal_entry(&self, entry: &JournalEntry) -> Result<(), JournalError> {
        self.write().apply(entry)?;
        Ok(())
    }

    fn reset_state(&self) {
        *self.write() = Namespace::new();
    }
}

impl Master for NamespaceState {
    fn service_name(&self) -> &str {
        &self.service_name
    }

    fn stream_to_journal_checkpoint(
        &self,
        out: &mut CheckpointOutputStream<'_>,
    ) -> Result<(), JournalError> {
        let entries = self.read().checkpoint_entries();
        for entry in &entries {
            out.write_entry(entry)?;
        }
        tracing::debug!(service = %self.service_name, entries = entries.len(), "streamed namespace checkpoint");
        Ok(())
    }
}

/// Namespace master with the leader mutation API
///
/// Mutations are accepted only while leader. Each one is validated against
/// the current namespace, appended and flushed to the journal, and only
/// then made visible to readers.
pub struct NamespaceMaster<C: Clock> {
    base: MasterBase<NamespaceState>,
    clock: C,
}

impl<C: Clock> NamespaceMaster<C> {
    pub fn new(
        service_name: impl Into<String>,
        journal: MasterJournal,
        tailer_config: TailerConfig,
        clock: C,
    ) -> Self {
        let state = Arc::new(NamespaceState::new(service_name));
        Self {
            base: MasterBase::new(state, journal, tailer_config),
            clock,
        }
    }

    pub fn base(&self) -> &MasterBase<NamespaceState> {
        &self.base
    }

    pub fn start(&self, is_leader: bool) -> Result<(), MasterError> {
        self.base.start(is_leader)
    }

    pub fn stop(&self) -> Result<(), MasterError> {
        self.base.stop()
    }

    pub fn state(&self) -> MasterState {
        self.base.state()
    }

    pub fn service_name(&self) -> &str {
        self.base.service_name()
    }

    pub fn upgrade_to_read_write_journal(&self, journal: ReadWriteJournal) {
        self.base.upgrade_to_read_write_journal(journal);
    }

    // Leader mutations

    /// Create a directory and return its id
    pub fn create_directory(&self, parent_id: InodeId, name: &str) -> Result<InodeId, MasterError> {
        self.journal_and_apply(|namespace, now| {
            let pinned = inherited_pinned(namespace, parent_id)?;
            let id = namespace.tree().next_inode_id();
            let inode = Inode::new(InodeConfig::Directory(DirectoryConfig {
                id,
                parent_id,
                name: name.to_string(),
                creation_time_ms: now,
                pinned,
            }));
            Ok((inode.to_entry(), id))
        })
    }

    /// Create an incomplete file and return its id
    pub fn create_file(
        &self,
        parent_id: InodeId,
        name: &str,
        block_size_bytes: u64,
    ) -> Result<InodeId, MasterError> {
        self.journal_and_apply(|namespace, now| {
            let pinned = inherited_pinned(namespace, parent_id)?;
            let id = namespace.tree().next_inode_id();
            let inode = Inode::new(InodeConfig::File(FileConfig {
                id,
                parent_id,
                name: name.to_string(),
                creation_time_ms: now,
                block_size_bytes,
                pinned,
            }));
            Ok((inode.to_entry(), id))
        })
    }

    pub fn rename(
        &self,
        id: InodeId,
        new_parent_id: InodeId,
        new_name: &str,
    ) -> Result<(), MasterError> {
        self.journal_and_apply(|_, now| {
            let entry = JournalEntry::Rename(RenameEntry {
                id,
                new_parent_id,
                new_name: new_name.to_string(),
                op_time_ms: now,
            });
            Ok((entry, ()))
        })
    }

    /// Pin or unpin an inode and everything live below it
    pub fn set_pinned(&self, id: InodeId, pinned: bool) -> Result<(), MasterError> {
        self.journal_and_apply(|_, now| {
            let entry = JournalEntry::SetPinned(SetPinnedEntry {
                id,
                pinned,
                op_time_ms: now,
            });
            Ok((entry, ()))
        })
    }

    pub fn persist(&self, id: InodeId) -> Result<(), MasterError> {
        self.journal_and_apply(|_, now| {
            Ok((JournalEntry::Persist(PersistEntry { id, op_time_ms: now }), ()))
        })
    }

    pub fn complete_file(
        &self,
        id: InodeId,
        block_ids: Vec<u64>,
        length: u64,
    ) -> Result<(), MasterError> {
        self.journal_and_apply(|_, now| {
            let entry = JournalEntry::CompleteFile(CompleteFileEntry {
                id,
                block_ids,
                length,
                op_time_ms: now,
            });
            Ok((entry, ()))
        })
    }

    /// Record the length of a block; the latest length wins
    pub fn commit_block(&self, block_id: u64, length: u64) -> Result<(), MasterError> {
        self.journal_and_apply(|_, _| {
            Ok((JournalEntry::BlockInfo(BlockInfoEntry { block_id, length }), ()))
        })
    }

    /// Soft-delete an inode; a non-empty directory needs `recursive`
    pub fn delete(&self, id: InodeId, recursive: bool) -> Result<(), MasterError> {
        self.journal_and_apply(|_, _| Ok((JournalEntry::Delete(DeleteEntry { id, recursive }), ())))
    }

    pub fn restore(&self, id: InodeId) -> Result<(), MasterError> {
        self.journal_and_apply(|_, _| Ok((JournalEntry::Restore(RestoreEntry { id }), ())))
    }

    // Reads, in any state

    pub fn inode(&self, id: InodeId) -> Option<Inode> {
        self.base.master().read().tree().get(id).cloned()
    }

    /// Live inode at an absolute path
    pub fn resolve(&self, path: &str) -> Option<Inode> {
        self.base.master().read().tree().resolve(path).cloned()
    }

    pub fn path_of(&self, id: InodeId) -> Option<String> {
        self.base.master().read().tree().path(id)
    }

    /// Direct children of a directory, deleted ones included
    pub fn children(&self, id: InodeId) -> Vec<Inode> {
        self.base
            .master()
            .read()
            .tree()
            .children(id)
            .cloned()
            .collect()
    }

    pub fn block_length(&self, block_id: u64) -> Option<u64> {
        self.base
            .master()
            .read()
            .block(block_id)
            .map(|block| block.length)
    }

    /// Copy of the whole namespace
    pub fn snapshot(&self) -> Namespace {
        self.base.master().read().clone()
    }

    /// Plan, journal, then commit one entry under the writer lock
    fn journal_and_apply<T>(
        &self,
        build: impl FnOnce(&Namespace, i64) -> Result<(JournalEntry, T), ApplyError>,
    ) -> Result<T, MasterError> {
        let state = self.base.master();
        self.base.with_writer(|writer| {
            let now = self.clock.now_ms();
            let (entry, value, mutation) = {
                let namespace = state.read();
                let (entry, value) = build(&namespace, now)?;
                let mutation = namespace.plan(&entry)?;
                (entry, value, mutation)
            };

            let sequence = writer.append(&entry)?;
            writer.flush()?;
            state.write().commit(mutation);
            tracing::debug!(
                service = %state.service_name,
                sequence,
                kind = %entry.kind(),
                inode = ?entry.inode_id(),
                "applied mutation"
            );
            Ok(value)
        })
    }
}

/// Pinned flag a new child of `parent_id` inherits
fn inherited_pinned(namespace: &Namespace, parent_id: InodeId) -> Result<bool, ApplyError> {
    let parent = namespace
        .tree()
        .get(parent_id)
        .ok_or(ApplyError::NotFound(parent_id))?;
    Ok(parent.is_pinned())
}

#[cfg(test)]
#[path = "namespace_tests.rs"]
mod tests;
