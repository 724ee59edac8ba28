// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::input::JournalInputStream;
use crate::journal::ReadWriteJournal;
use tempfile::TempDir;
use tern_core::{BlockInfoEntry, JournalConfig};

fn block_info(block_id: u64, length: u64) -> JournalEntry {
    JournalEntry::BlockInfo(BlockInfoEntry { block_id, length })
}

fn temp_journal(max_segment_bytes: u64) -> (TempDir, ReadWriteJournal) {
    let dir = TempDir::new().unwrap();
    let config = JournalConfig {
        dir: dir.path().join("journal"),
        max_segment_bytes,
    };
    let journal = ReadWriteJournal::open(&config).unwrap();
    (dir, journal)
}

/// A writer that has written an empty checkpoint at 0
fn ready_writer(journal: &ReadWriteJournal) -> JournalWriter {
    let mut writer = journal.new_writer().unwrap();
    writer.complete_all_logs().unwrap();
    writer.checkpoint_output_stream(0).unwrap().close().unwrap();
    writer
}

fn segment_ranges(journal: &ReadWriteJournal) -> Vec<(u64, u64)> {
    journal
        .journal()
        .completed_segments()
        .unwrap()
        .into_iter()
        .map(|s| (s.first, s.last))
        .collect()
}

#[test]
fn append_before_checkpoint_is_illegal() {
    let (_dir, journal) = temp_journal(1 << 20);
    let mut writer = journal.new_writer().unwrap();

    let err = writer.append(&block_info(1, 1)).unwrap_err();

    assert!(matches!(err, JournalError::IllegalState(_)));
}

#[test]
fn sequence_numbers_follow_checkpoint() {
    let (_dir, journal) = temp_journal(1 << 20);
    let mut writer = ready_writer(&journal);

    assert_eq!(writer.next_sequence_number(), Some(1));
    let sequences: Vec<u64> = (0..5)
        .map(|i| writer.append(&block_info(i, i)).unwrap())
        .collect();

    assert_eq!(sequences, vec![1, 2, 3, 4, 5]);
    assert_eq!(writer.next_sequence_number(), Some(6));
}

#[test]
fn flush_makes_entries_visible_in_current_segment() {
    let (_dir, journal) = temp_journal(1 << 20);
    let mut writer = ready_writer(&journal);

    writer.append(&block_info(42, 1024)).unwrap();
    writer.flush().unwrap();

    let content = std::fs::read_to_string(journal.journal().layout().current_path()).unwrap();
    assert_eq!(content.lines().count(), 1);
    // Not yet a completed segment
    assert!(segment_ranges(&journal).is_empty());
}

#[test]
fn close_seals_current_segment_and_is_idempotent() {
    let (_dir, journal) = temp_journal(1 << 20);
    let mut writer = ready_writer(&journal);
    writer.append(&block_info(42, 1024)).unwrap();
    writer.append(&block_info(42, 2048)).unwrap();

    writer.close().unwrap();
    writer.close().unwrap();

    assert!(writer.is_closed());
    assert_eq!(segment_ranges(&journal), vec![(1, 2)]);
    assert!(!journal.journal().layout().current_path().exists());
}

#[test]
fn append_after_close_is_illegal() {
    let (_dir, journal) = temp_journal(1 << 20);
    let mut writer = ready_writer(&journal);
    writer.close().unwrap();

    assert!(matches!(
        writer.append(&block_info(1, 1)).unwrap_err(),
        JournalError::IllegalState(_)
    ));
}

#[test]
fn second_writer_is_locked_out() {
    let (_dir, journal) = temp_journal(1 << 20);
    let mut first = journal.new_writer().unwrap();

    let err = journal.new_writer().err().unwrap();
    assert!(matches!(err, JournalError::WriterLocked(_)));

    first.close().unwrap();
    assert!(journal.new_writer().is_ok());
}

#[test]
fn segments_rotate_at_size_limit() {
    let (_dir, journal) = temp_journal(1);
    let mut writer = ready_writer(&journal);

    for i in 1..=3 {
        writer.append(&block_info(i, i)).unwrap();
    }
    writer.close().unwrap();

    assert_eq!(segment_ranges(&journal), vec![(1, 1), (2, 2), (3, 3)]);
}

#[test]
fn complete_all_logs_is_idempotent() {
    let (_dir, journal) = temp_journal(1 << 20);
    let mut writer = ready_writer(&journal);
    writer.append(&block_info(1, 1)).unwrap();

    writer.complete_all_logs().unwrap();
    writer.complete_all_logs().unwrap();

    assert_eq!(segment_ranges(&journal), vec![(1, 1)]);
    // Appends continue in a fresh segment
    assert_eq!(writer.append(&block_info(2, 2)).unwrap(), 2);
    writer.close().unwrap();
    assert_eq!(segment_ranges(&journal), vec![(1, 1), (2, 2)]);
}

#[test]
fn complete_all_logs_repairs_torn_tail_from_crashed_writer() {
    let (_dir, journal) = temp_journal(1 << 20);
    {
        let mut crashed = ready_writer(&journal);
        crashed.append(&block_info(1, 1)).unwrap();
        crashed.append(&block_info(2, 2)).unwrap();
        crashed.flush().unwrap();
        // Dropped without close, like a crash
    }
    let current = journal.journal().layout().current_path();
    let mut file = OpenOptions::new().append(true).open(&current).unwrap();
    file.write_all(br#"{"sequence":3,"entry":{"kind":"BLO"#).unwrap();
    drop(file);

    let mut writer = journal.new_writer().unwrap();
    writer.complete_all_logs().unwrap();

    assert_eq!(segment_ranges(&journal), vec![(1, 2)]);
    assert!(!current.exists());
    let segment = &journal.journal().completed_segments().unwrap()[0];
    let mut stream = journal.journal().segment_input_stream(segment).unwrap();
    assert_eq!(stream.next_entry().unwrap(), Some(block_info(1, 1)));
    assert_eq!(stream.next_entry().unwrap(), Some(block_info(2, 2)));
    assert_eq!(stream.next_entry().unwrap(), None);
}

#[test]
fn complete_all_logs_removes_incomplete_segment_without_records() {
    let (_dir, journal) = temp_journal(1 << 20);
    let current = journal.journal().layout().current_path();
    std::fs::write(&current, "{\"sequence\":1,\"en").unwrap();

    let mut writer = journal.new_writer().unwrap();
    writer.complete_all_logs().unwrap();

    assert!(!current.exists());
    assert!(segment_ranges(&journal).is_empty());
}

#[test]
fn checkpoint_requires_sealed_segments() {
    let (_dir, journal) = temp_journal(1 << 20);
    let mut writer = ready_writer(&journal);
    writer.append(&block_info(1, 1)).unwrap();

    let err = writer.checkpoint_output_stream(1).err().unwrap();

    assert!(matches!(err, JournalError::IllegalState(_)));
}

#[test]
fn checkpoint_cannot_go_backwards() {
    let (_dir, journal) = temp_journal(1 << 20);
    let mut writer = ready_writer(&journal);
    writer.append(&block_info(1, 1)).unwrap();
    writer.append(&block_info(2, 2)).unwrap();
    writer.complete_all_logs().unwrap();

    assert!(matches!(
        writer.checkpoint_output_stream(1).err().unwrap(),
        JournalError::IllegalState(_)
    ));

    writer.checkpoint_output_stream(2).unwrap().close().unwrap();
    assert!(matches!(
        writer.checkpoint_output_stream(1).err().unwrap(),
        JournalError::IllegalState(_)
    ));
}

#[test]
fn checkpoint_close_supersedes_old_checkpoint_and_segments() {
    let (_dir, journal) = temp_journal(1);
    let mut writer = ready_writer(&journal);
    for i in 1..=3 {
        writer.append(&block_info(i, i)).unwrap();
    }
    writer.complete_all_logs().unwrap();
    assert_eq!(segment_ranges(&journal).len(), 3);

    let mut checkpoint = writer.checkpoint_output_stream(3).unwrap();
    assert_eq!(checkpoint.sequence(), 3);
    for i in 1..=3 {
        checkpoint.write_entry(&block_info(i, i)).unwrap();
    }
    checkpoint.close().unwrap();

    let layout = journal.journal().layout();
    assert_eq!(layout.checkpoints().unwrap(), vec![3]);
    assert!(segment_ranges(&journal).is_empty());
    assert!(!layout.checkpoint_tmp_path().exists());
    assert_eq!(writer.next_sequence_number(), Some(4));

    let mut stream = JournalInputStream::open_checkpoint(&layout.checkpoint_path(3)).unwrap();
    assert_eq!(stream.checkpoint_sequence(), Some(3));
    assert_eq!(stream.next_entry().unwrap(), Some(block_info(1, 1)));
}

#[test]
fn unclosed_checkpoint_is_not_installed() {
    let (_dir, journal) = temp_journal(1 << 20);
    let mut writer = ready_writer(&journal);

    {
        let mut checkpoint = writer.checkpoint_output_stream(0).unwrap();
        checkpoint.write_entry(&block_info(9, 9)).unwrap();
        // Dropped without close
    }

    let layout = journal.journal().layout();
    assert_eq!(layout.checkpoints().unwrap(), vec![0]);
    let mut stream = journal.journal().checkpoint_input_stream().unwrap();
    assert_eq!(stream.next_entry().unwrap(), None);
}

#[test]
fn rewriting_checkpoint_at_same_sequence_replaces_it() {
    let (_dir, journal) = temp_journal(1 << 20);
    let mut writer = ready_writer(&journal);

    let mut checkpoint = writer.checkpoint_output_stream(0).unwrap();
    checkpoint.write_entry(&block_info(5, 5)).unwrap();
    checkpoint.close().unwrap();

    let mut stream = journal.journal().checkpoint_input_stream().unwrap();
    assert_eq!(stream.next_entry().unwrap(), Some(block_info(5, 5)));
}
