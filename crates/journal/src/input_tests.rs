// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use std::io::Write;
use tempfile::TempDir;
use tern_core::BlockInfoEntry;

fn block_info(block_id: u64) -> JournalEntry {
    JournalEntry::BlockInfo(BlockInfoEntry {
        block_id,
        length: block_id * 10,
    })
}

fn line(sequence: u64) -> String {
    let mut line = JournalRecord::new(sequence, block_info(sequence)).to_line().unwrap();
    line.push('\n');
    line
}

/// A verified record of a kind this build doesn't know
fn truncate_line(sequence: u64) -> String {
    let entry = serde_json::json!({"kind": "TRUNCATE", "parameters": {}});
    let checksum = JournalRecord::checksum_of(sequence, &entry);
    let record = serde_json::json!({"sequence": sequence, "entry": entry, "checksum": checksum});
    format!("{record}\n")
}

fn write_file(dir: &TempDir, name: &str, content: &str) -> PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, content).unwrap();
    path
}

fn drain(stream: &mut JournalInputStream) -> Result<Vec<u64>, JournalError> {
    let mut sequences = Vec::new();
    while let Some(record) = stream.next_record()? {
        sequences.push(record.sequence);
    }
    Ok(sequences)
}

#[test]
fn checkpoint_stream_reads_header_and_records() {
    let dir = TempDir::new().unwrap();
    let content = format!("{}\n{}{}", r#"{"version":1,"sequence":9}"#, line(0), line(1));
    let path = write_file(&dir, "checkpoint", &content);

    let mut stream = JournalInputStream::open_checkpoint(&path).unwrap();

    assert_eq!(stream.checkpoint_sequence(), Some(9));
    assert_eq!(stream.next_entry().unwrap(), Some(block_info(0)));
    assert_eq!(stream.next_entry().unwrap(), Some(block_info(1)));
    assert_eq!(stream.next_entry().unwrap(), None);
    // Exhausted streams stay exhausted
    assert_eq!(stream.next_entry().unwrap(), None);
    assert_eq!(stream.latest_sequence_number(), Some(1));
}

#[test]
fn checkpoint_with_unknown_version_is_rejected() {
    let dir = TempDir::new().unwrap();
    let path = write_file(&dir, "checkpoint", "{\"version\":2,\"sequence\":0}\n");

    let err = JournalInputStream::open_checkpoint(&path).err().unwrap();
    assert!(matches!(err, JournalError::Corrupted { line: 1, .. }), "{err:?}");
}

#[test]
fn checkpoint_records_must_start_at_zero() {
    let dir = TempDir::new().unwrap();
    let content = format!("{}\n{}", r#"{"version":1,"sequence":4}"#, line(1));
    let path = write_file(&dir, "checkpoint", &content);

    let mut stream = JournalInputStream::open_checkpoint(&path).unwrap();
    let err = drain(&mut stream).unwrap_err();
    assert!(matches!(
        err,
        JournalError::SequenceGap {
            expected: 0,
            found: 1
        }
    ));
}

#[test]
fn segment_stream_reads_its_range() {
    let dir = TempDir::new().unwrap();
    let content = format!("{}\n{}{}", line(5), line(6), line(7));
    let path = write_file(&dir, "segment", &content);

    let mut stream = JournalInputStream::open_segment(&path, 5, 7).unwrap();

    assert_eq!(drain(&mut stream).unwrap(), vec![5, 6, 7]);
    assert_eq!(stream.checkpoint_sequence(), None);
}

#[test]
fn segment_shorter_than_its_name_is_corrupt() {
    let dir = TempDir::new().unwrap();
    let path = write_file(&dir, "segment", &format!("{}{}", line(5), line(6)));

    let mut stream = JournalInputStream::open_segment(&path, 5, 7).unwrap();

    assert!(matches!(
        drain(&mut stream).unwrap_err(),
        JournalError::Corrupted { .. }
    ));
}

#[test]
fn segment_gap_is_reported() {
    let dir = TempDir::new().unwrap();
    let path = write_file(&dir, "segment", &format!("{}{}", line(5), line(7)));

    let mut stream = JournalInputStream::open_segment(&path, 5, 7).unwrap();

    assert!(matches!(
        drain(&mut stream).unwrap_err(),
        JournalError::SequenceGap {
            expected: 6,
            found: 7
        }
    ));
}

#[test]
fn checksum_mismatch_reports_line() {
    let dir = TempDir::new().unwrap();
    let mut bad = JournalRecord::new(6, block_info(6));
    bad.checksum ^= 1;
    let content = format!("{}{}\n", line(5), bad.to_line().unwrap());
    let path = write_file(&dir, "segment", &content);

    let mut stream = JournalInputStream::open_segment(&path, 5, 6).unwrap();

    assert!(stream.next_record().unwrap().is_some());
    assert!(matches!(
        stream.next_record().unwrap_err(),
        JournalError::ChecksumMismatch { line: 2, .. }
    ));
}

#[test]
fn unknown_kind_reports_kind_name() {
    let dir = TempDir::new().unwrap();
    let path = write_file(&dir, "segment", &truncate_line(1));

    let mut stream = JournalInputStream::open_segment(&path, 1, 1).unwrap();

    match stream.next_record().unwrap_err() {
        JournalError::UnknownEntryKind { kind, line, .. } => {
            assert_eq!(kind, "TRUNCATE");
            assert_eq!(line, 1);
        }
        other => panic!("expected UnknownEntryKind, got {other:?}"),
    }
}

#[test]
fn scan_of_clean_incomplete_segment() {
    let dir = TempDir::new().unwrap();
    let content = format!("{}{}", line(3), line(4));
    let path = write_file(&dir, "current.jsonl", &content);

    let scan = scan_incomplete(&path).unwrap();

    assert_eq!(scan.range, Some((3, 4)));
    assert_eq!(scan.valid_len, content.len() as u64);
    assert_eq!(scan.total_len, content.len() as u64);
}

#[test]
fn scan_stops_at_torn_tail() {
    let dir = TempDir::new().unwrap();
    let good = format!("{}{}", line(3), line(4));
    let torn = &line(5)[..20];
    let path = write_file(&dir, "current.jsonl", &format!("{good}{torn}"));

    let scan = scan_incomplete(&path).unwrap();

    assert_eq!(scan.range, Some((3, 4)));
    assert_eq!(scan.valid_len, good.len() as u64);
    assert!(scan.total_len > scan.valid_len);
}

#[test]
fn scan_treats_complete_line_without_newline_as_torn() {
    let dir = TempDir::new().unwrap();
    let good = line(3);
    let unterminated = line(4);
    let path = write_file(
        &dir,
        "current.jsonl",
        &format!("{good}{}", unterminated.trim_end()),
    );

    let scan = scan_incomplete(&path).unwrap();

    assert_eq!(scan.range, Some((3, 3)));
    assert_eq!(scan.valid_len, good.len() as u64);
}

#[test]
fn scan_of_garbage_has_no_records() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("current.jsonl");
    let mut file = std::fs::File::create(&path).unwrap();
    file.write_all(&[0xff, 0xfe, b'{', b'\n']).unwrap();

    let scan = scan_incomplete(&path).unwrap();

    assert_eq!(scan.range, None);
    assert_eq!(scan.valid_len, 0);
}

#[test]
fn scan_propagates_unknown_kind() {
    let dir = TempDir::new().unwrap();
    let path = write_file(&dir, "current.jsonl", &format!("{}{}", line(3), truncate_line(4)));

    assert!(matches!(
        scan_incomplete(&path).unwrap_err(),
        JournalError::UnknownEntryKind { .. }
    ));
}

#[test]
fn scan_treats_corrupted_kind_as_torn() {
    let dir = TempDir::new().unwrap();
    let corrupted = line(4).replace("BLOCK_INFO", "BLOCK_INFX");
    let path = write_file(&dir, "current.jsonl", &format!("{}{corrupted}", line(3)));

    let scan = scan_incomplete(&path).unwrap();

    assert_eq!(scan.range, Some((3, 3)));
    assert_eq!(scan.valid_len, line(3).len() as u64);
}
