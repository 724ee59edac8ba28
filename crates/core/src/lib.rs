// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! tern-core: the namespace model replicated by the Tern metadata master
//!
//! This crate provides:
//! - Journal entries, the typed records of every namespace mutation
//! - The inode model and the in-memory namespace tree
//! - The pure transition function that applies entries to the namespace
//! - Clock and configuration plumbing shared by the other crates

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod clock;
pub mod config;
pub mod entry;
pub mod inode;
pub mod namespace;
pub mod tree;

pub use clock::{Clock, FakeClock, SystemClock};
pub use config::{ConfigError, JournalConfig, TailerConfig, TernConfig};
pub use entry::{
    BlockInfoEntry, CompleteFileEntry, DeleteEntry, EntryKind, InodeDirectoryEntry,
    InodeFileEntry, JournalEntry, PersistEntry, RenameEntry, RestoreEntry, SetPinnedEntry,
};
pub use inode::{DirectoryConfig, FileAttributes, FileConfig, Inode, InodeConfig, InodeId, InodeKind};
pub use namespace::{ApplyError, BlockInfo, Mutation, Namespace};
pub use tree::InodeTree;
