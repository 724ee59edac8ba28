// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-memory namespace tree
//!
//! The tree owns every inode by id. Parent links live on the inodes; the
//! tree keeps a child index so listing and name lookup don't scan.

use crate::inode::{Inode, InodeId};
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InodeTree {
    inodes: BTreeMap<InodeId, Inode>,
    children: BTreeMap<InodeId, BTreeSet<InodeId>>,
}

impl Default for InodeTree {
    fn default() -> Self {
        Self::new()
    }
}

impl InodeTree {
    /// A tree holding only the root directory
    pub fn new() -> Self {
        let mut tree = Self {
            inodes: BTreeMap::new(),
            children: BTreeMap::new(),
        };
        tree.upsert(Inode::root());
        tree
    }

    pub fn get(&self, id: InodeId) -> Option<&Inode> {
        self.inodes.get(&id)
    }

    pub fn contains(&self, id: InodeId) -> bool {
        self.inodes.contains_key(&id)
    }

    /// Number of inodes, deleted ones and the root included
    pub fn len(&self) -> usize {
        self.inodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inodes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Inode> {
        self.inodes.values()
    }

    /// Direct children of a directory, deleted ones included, by id
    pub fn children(&self, id: InodeId) -> impl Iterator<Item = &Inode> {
        self.children
            .get(&id)
            .into_iter()
            .flatten()
            .filter_map(|child| self.inodes.get(child))
    }

    pub fn live_child_named(&self, parent: InodeId, name: &str) -> Option<&Inode> {
        self.children(parent)
            .find(|child| !child.is_deleted() && child.name() == name)
    }

    /// Whether `ancestor` is `id` or lies on its parent chain
    pub fn is_ancestor(&self, ancestor: InodeId, id: InodeId) -> bool {
        let mut current = Some(id);
        while let Some(cursor) = current {
            if cursor == ancestor {
                return true;
            }
            current = self.inodes.get(&cursor).and_then(Inode::parent_id);
        }
        false
    }

    /// All inodes below `id`, depth first
    pub fn descendants(&self, id: InodeId) -> Vec<InodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<InodeId> = self
            .children
            .get(&id)
            .map(|c| c.iter().rev().copied().collect())
            .unwrap_or_default();
        while let Some(next) = stack.pop() {
            out.push(next);
            if let Some(grandchildren) = self.children.get(&next) {
                stack.extend(grandchildren.iter().rev().copied());
            }
        }
        out
    }

    /// Absolute path of an inode; `/` for the root
    pub fn path(&self, id: InodeId) -> Option<String> {
        let mut names = Vec::new();
        let mut cursor = self.inodes.get(&id)?;
        while let Some(parent) = cursor.parent_id() {
            names.push(cursor.name());
            cursor = self.inodes.get(&parent)?;
        }
        if names.is_empty() {
            return Some("/".to_string());
        }
        names.reverse();
        Some(format!("/{}", names.join("/")))
    }

    /// Walk an absolute path through live inodes
    pub fn resolve(&self, path: &str) -> Option<&Inode> {
        let mut cursor = self.inodes.get(&InodeId::ROOT)?;
        for component in path.split('/').filter(|c| !c.is_empty()) {
            cursor = self.live_child_named(cursor.id(), component)?;
        }
        Some(cursor)
    }

    /// The id the next created inode gets
    pub fn next_inode_id(&self) -> InodeId {
        self.inodes
            .keys()
            .next_back()
            .map(|id| id.next())
            .unwrap_or(InodeId::ROOT)
    }

    /// Insert or replace an inode, keeping the child index in step
    pub fn upsert(&mut self, inode: Inode) {
        let id = inode.id();
        if let Some(previous) = self.inodes.get(&id) {
            if previous.parent_id() != inode.parent_id() {
                if let Some(old_parent) = previous.parent_id() {
                    if let Some(siblings) = self.children.get_mut(&old_parent) {
                        siblings.remove(&id);
                        if siblings.is_empty() {
                            self.children.remove(&old_parent);
                        }
                    }
                }
            }
        }
        if let Some(parent) = inode.parent_id() {
            self.children.entry(parent).or_default().insert(id);
        }
        self.inodes.insert(id, inode);
    }

    /// Every inode reachable from the root, parents before children
    pub fn preorder(&self) -> Vec<&Inode> {
        let mut out = Vec::with_capacity(self.inodes.len());
        if let Some(root) = self.inodes.get(&InodeId::ROOT) {
            out.push(root);
            out.extend(
                self.descendants(InodeId::ROOT)
                    .into_iter()
                    .filter_map(|id| self.inodes.get(&id)),
            );
        }
        out
    }
}

#[cfg(test)]
#[path = "tree_tests.rs"]
mod tests;
