// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! File naming inside a journal directory
//!
//! Artifacts are discovered by the sequence numbers encoded in their
//! names, never by file times:
//!
//! - `checkpoint-<S>.jsonl`: checkpoint covering entries up to `S`
//! - `checkpoint.tmp`: checkpoint being written
//! - `segment-<first>-<last>.jsonl`: completed segment
//! - `current.jsonl`: incomplete segment of the active writer
//! - `writer.lock`: advisory lock held by the writer

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

const CHECKPOINT_PREFIX: &str = "checkpoint-";
const SEGMENT_PREFIX: &str = "segment-";
const EXTENSION: &str = ".jsonl";

/// A completed segment and the sequence range it covers
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SegmentInfo {
    pub first: u64,
    pub last: u64,
    pub path: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JournalLayout {
    dir: PathBuf,
}

impl JournalLayout {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn checkpoint_path(&self, sequence: u64) -> PathBuf {
        self.dir
            .join(format!("{CHECKPOINT_PREFIX}{sequence:020}{EXTENSION}"))
    }

    pub fn checkpoint_tmp_path(&self) -> PathBuf {
        self.dir.join("checkpoint.tmp")
    }

    pub fn segment_path(&self, first: u64, last: u64) -> PathBuf {
        self.dir
            .join(format!("{SEGMENT_PREFIX}{first:020}-{last:020}{EXTENSION}"))
    }

    pub fn current_path(&self) -> PathBuf {
        self.dir.join("current.jsonl")
    }

    pub fn lock_path(&self) -> PathBuf {
        self.dir.join("writer.lock")
    }

    /// Sequence numbers of all checkpoints, ascending
    pub fn checkpoints(&self) -> io::Result<Vec<u64>> {
        let mut found: Vec<u64> = self
            .file_names()?
            .iter()
            .filter_map(|name| parse_checkpoint_name(name))
            .collect();
        found.sort_unstable();
        Ok(found)
    }

    pub fn latest_checkpoint(&self) -> io::Result<Option<u64>> {
        Ok(self.checkpoints()?.last().copied())
    }

    /// All completed segments, ordered by first sequence
    pub fn segments(&self) -> io::Result<Vec<SegmentInfo>> {
        let mut found: Vec<SegmentInfo> = self
            .file_names()?
            .iter()
            .filter_map(|name| {
                let (first, last) = parse_segment_name(name)?;
                Some(SegmentInfo {
                    first,
                    last,
                    path: self.dir.join(name),
                })
            })
            .collect();
        found.sort_by_key(|s| (s.first, s.last));
        Ok(found)
    }

    /// Make renames and removals in the directory durable
    pub fn sync_dir(&self) -> io::Result<()> {
        fs::File::open(&self.dir)?.sync_all()
    }

    fn file_names(&self) -> io::Result<Vec<String>> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e),
        };
        let mut names = Vec::new();
        for entry in entries {
            if let Some(name) = entry?.file_name().to_str() {
                names.push(name.to_string());
            }
        }
        Ok(names)
    }
}

fn parse_checkpoint_name(name: &str) -> Option<u64> {
    name.strip_prefix(CHECKPOINT_PREFIX)?
        .strip_suffix(EXTENSION)?
        .parse()
        .ok()
}

fn parse_segment_name(name: &str) -> Option<(u64, u64)> {
    let range = name.strip_prefix(SEGMENT_PREFIX)?.strip_suffix(EXTENSION)?;
    let (first, last) = range.split_once('-')?;
    let first: u64 = first.parse().ok()?;
    let last: u64 = last.parse().ok()?;
    (first <= last).then_some((first, last))
}

#[cfg(test)]
#[path = "layout_tests.rs"]
mod tests;
