// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use tempfile::TempDir;

#[test]
fn read_only_journal_over_missing_directory_is_empty() {
    let dir = TempDir::new().unwrap();
    let journal = Journal::open(dir.path().join("not-yet"));

    assert!(!journal.checkpoint_exists().unwrap());
    assert!(journal.completed_segments().unwrap().is_empty());
    assert!(matches!(
        journal.checkpoint_input_stream().err().unwrap(),
        JournalError::NoCheckpoint
    ));
}

#[test]
fn read_write_journal_creates_directory() {
    let dir = TempDir::new().unwrap();
    let config = JournalConfig::at(dir.path().join("a/b/journal"));

    let journal = ReadWriteJournal::open(&config).unwrap();

    assert!(config.dir.is_dir());
    assert_eq!(journal.journal().dir(), config.dir.as_path());
}

#[test]
fn read_only_view_sees_writer_output() {
    let dir = TempDir::new().unwrap();
    let rw = ReadWriteJournal::open(&JournalConfig::at(dir.path())).unwrap();
    let ro = Journal::open(dir.path());

    let mut writer = rw.new_writer().unwrap();
    writer.checkpoint_output_stream(0).unwrap().close().unwrap();
    writer
        .append(&tern_core::JournalEntry::BlockInfo(tern_core::BlockInfoEntry {
            block_id: 1,
            length: 2,
        }))
        .unwrap();
    writer.close().unwrap();

    assert_eq!(ro.latest_checkpoint().unwrap(), Some(0));
    let segments = ro.completed_segments().unwrap();
    assert_eq!(segments.len(), 1);
    let mut stream = ro.segment_input_stream(&segments[0]).unwrap();
    assert!(stream.next_entry().unwrap().is_some());
}

#[test]
fn checkpoint_header_must_match_file_name() {
    let dir = TempDir::new().unwrap();
    let journal = Journal::open(dir.path());
    std::fs::write(
        journal.layout().checkpoint_path(5),
        "{\"version\":1,\"sequence\":7}\n",
    )
    .unwrap();

    let err = journal.checkpoint_input_stream().err().unwrap();

    assert!(
        matches!(&err, JournalError::Corrupted { line: 1, reason, .. } if reason.contains("file name")),
        "{err:?}"
    );
}

#[test]
fn checkpoint_header_matching_file_name_opens() {
    let dir = TempDir::new().unwrap();
    let journal = Journal::open(dir.path());
    std::fs::write(
        journal.layout().checkpoint_path(5),
        "{\"version\":1,\"sequence\":5}\n",
    )
    .unwrap();

    let stream = journal.checkpoint_input_stream().unwrap();

    assert_eq!(stream.checkpoint_sequence(), Some(5));
}
