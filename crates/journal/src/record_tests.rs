// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use tern_core::{BlockInfoEntry, InodeId, RestoreEntry};
use yare::parameterized;

fn block_info(block_id: u64, length: u64) -> JournalEntry {
    JournalEntry::BlockInfo(BlockInfoEntry { block_id, length })
}

#[test]
fn record_creation_computes_checksum() {
    let record = JournalRecord::new(1, block_info(42, 1024));

    assert_eq!(record.sequence, 1);
    assert!(record.verify());
}

#[test]
fn record_line_layout() {
    let line = JournalRecord::new(3, block_info(42, 1024)).to_line().unwrap();

    assert!(line.starts_with(
        r#"{"sequence":3,"entry":{"kind":"BLOCK_INFO","parameters":{"blockId":42,"length":1024}},"checksum":"#
    ));
    assert!(!line.contains('\n'));
}

#[test]
fn record_decodes_its_own_line() {
    let record = JournalRecord::new(12345, block_info(1, 2));
    let decoded = JournalRecord::decode(&record.to_line().unwrap()).unwrap();
    assert_eq!(decoded, record);
}

#[test]
fn checksum_covers_sequence() {
    let first = JournalRecord::new(1, block_info(42, 1024));
    let second = JournalRecord::new(2, block_info(42, 1024));
    assert_ne!(first.checksum, second.checksum);
}

#[test]
fn checksum_covers_entry() {
    let first = JournalRecord::new(1, block_info(42, 1024));
    let second = JournalRecord::new(1, block_info(42, 2048));
    assert_ne!(first.checksum, second.checksum);
}

#[test]
fn tampered_entry_fails_verification() {
    let mut record = JournalRecord::new(1, block_info(42, 1024));
    record.entry = block_info(42, 4096);
    assert!(!record.verify());

    let line = record.to_line().unwrap();
    assert_eq!(
        JournalRecord::decode(&line).unwrap_err(),
        RecordError::ChecksumMismatch
    );
}

fn truncate_line(sequence: u64) -> String {
    let entry = serde_json::json!({"kind": "TRUNCATE", "parameters": {"id": 3}});
    let checksum = JournalRecord::checksum_of(sequence, &entry);
    serde_json::json!({"sequence": sequence, "entry": entry, "checksum": checksum}).to_string()
}

#[test]
fn unknown_kind_is_reported_by_name() {
    assert_eq!(
        JournalRecord::decode(&truncate_line(1)).unwrap_err(),
        RecordError::UnknownKind("TRUNCATE".to_string())
    );
}

#[test]
fn corrupted_kind_name_is_a_checksum_mismatch() {
    let line = JournalRecord::new(1, block_info(42, 1024))
        .to_line()
        .unwrap()
        .replace("BLOCK_INFO", "BLOCK_INFX");

    assert_eq!(
        JournalRecord::decode(&line).unwrap_err(),
        RecordError::ChecksumMismatch
    );
}

#[test]
fn unknown_kind_without_checksum_is_malformed() {
    let line = r#"{"sequence":1,"entry":{"kind":"TRUNCATE","parameters":{}}}"#;
    assert!(matches!(
        JournalRecord::decode(line).unwrap_err(),
        RecordError::Malformed(_)
    ));
}

#[test]
fn typed_and_untyped_checksums_agree() {
    let entry = block_info(7, 70);
    let value = serde_json::to_value(&entry).unwrap();
    assert_eq!(
        JournalRecord::new(5, entry).checksum,
        JournalRecord::checksum_of(5, &value)
    );
}

#[parameterized(
    not_json = { "not valid json {" },
    truncated = { r#"{"sequence":1,"entry":{"kind":"RESTORE","param"# },
    missing_checksum = { r#"{"sequence":1,"entry":{"kind":"RESTORE","parameters":{"id":3}}}"# },
    bad_parameters = { r#"{"sequence":1,"entry":{"kind":"RESTORE","parameters":{}},"checksum":1}"# },
)]
fn malformed_lines_are_rejected(line: &str) {
    assert!(matches!(
        JournalRecord::decode(line),
        Err(RecordError::Malformed(_))
    ));
}

#[test]
fn restore_record_decodes() {
    let record = JournalRecord::new(
        9,
        JournalEntry::Restore(RestoreEntry { id: InodeId(3) }),
    );
    let decoded = JournalRecord::decode(&record.to_line().unwrap()).unwrap();
    assert_eq!(decoded.entry.kind(), EntryKind::Restore);
}

#[test]
fn checkpoint_header_shape() {
    let header = CheckpointHeader::new(17);
    assert_eq!(
        serde_json::to_string(&header).unwrap(),
        r#"{"version":1,"sequence":17}"#
    );
}
