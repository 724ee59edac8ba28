// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

fn file_a() -> Inode {
    Inode::new(InodeConfig::File(FileConfig {
        id: InodeId(7),
        parent_id: InodeId(1),
        name: "a".to_string(),
        creation_time_ms: 1_000,
        block_size_bytes: 4096,
        pinned: false,
    }))
}

#[test]
fn new_file_starts_empty_and_incomplete() {
    let inode = file_a();

    assert_eq!(inode.id(), InodeId(7));
    assert_eq!(inode.name(), "a");
    assert_eq!(inode.parent_id(), Some(InodeId(1)));
    assert_eq!(inode.creation_time_ms(), 1_000);
    assert_eq!(inode.last_modification_time_ms(), 1_000);
    assert!(!inode.is_directory());
    assert!(!inode.is_persisted());
    assert!(!inode.is_deleted());

    let file = inode.file().unwrap();
    assert_eq!(file.block_size_bytes, 4096);
    assert_eq!(file.length, 0);
    assert!(!file.completed);
    assert!(file.block_ids.is_empty());
}

#[test]
fn new_directory_has_no_file_attributes() {
    let inode = Inode::new(InodeConfig::Directory(DirectoryConfig {
        id: InodeId(2),
        parent_id: InodeId::ROOT,
        name: "dir".to_string(),
        creation_time_ms: 5,
        pinned: true,
    }));

    assert!(inode.is_directory());
    assert!(inode.is_pinned());
    assert!(inode.file().is_none());
    assert_eq!(inode.kind(), &InodeKind::Directory);
}

#[test]
fn rename_changes_name_and_bumps_modification_time() {
    let inode = file_a();

    let renamed = inode.renamed(InodeId(1), "b", 2_000);

    assert_eq!(renamed.name(), "b");
    assert!(renamed.last_modification_time_ms() > inode.creation_time_ms());
    assert_eq!(renamed.last_modification_time_ms(), 2_000);
    // The original value is untouched
    assert_eq!(inode.name(), "a");
}

#[test]
fn modification_time_increases_even_when_clock_goes_backwards() {
    let inode = file_a();

    let renamed = inode.renamed(InodeId(1), "b", 10);
    let pinned = renamed.with_pinned(true, 10);

    assert_eq!(renamed.last_modification_time_ms(), 1_001);
    assert_eq!(pinned.last_modification_time_ms(), 1_002);
}

#[test]
fn delete_then_restore_leaves_other_fields_unchanged() {
    let inode = file_a().with_persisted(1_500);

    let deleted = inode.delete();
    assert!(deleted.is_deleted());
    assert_eq!(
        deleted.last_modification_time_ms(),
        inode.last_modification_time_ms()
    );

    let restored = deleted.restore();
    assert!(!restored.is_deleted());
    assert_eq!(restored, inode);
}

#[test]
fn complete_attaches_blocks() {
    let inode = file_a();

    let completed = inode.completed(&[11, 12], 6_000, 3_000).unwrap();

    let file = completed.file().unwrap();
    assert!(file.completed);
    assert_eq!(file.block_ids, vec![11, 12]);
    assert_eq!(file.length, 6_000);
    assert_eq!(file.block_size_bytes, 4096);
    assert_eq!(completed.last_modification_time_ms(), 3_000);
}

#[test]
fn complete_on_directory_is_none() {
    assert!(Inode::root().completed(&[1], 1, 1).is_none());
}

#[test]
fn entry_conversion_recreates_inode() {
    let inode = file_a()
        .completed(&[3], 10, 2_000)
        .unwrap()
        .with_pinned(true, 2_500)
        .delete();

    let recreated = match inode.to_entry() {
        JournalEntry::InodeFile(entry) => Inode::from_file_entry(&entry),
        other => panic!("expected INODE_FILE, got {other:?}"),
    };

    assert_eq!(recreated, inode);
}

#[test]
fn root_entry_has_no_parent() {
    match Inode::root().to_entry() {
        JournalEntry::InodeDirectory(entry) => {
            assert_eq!(entry.id, InodeId::ROOT);
            assert_eq!(entry.parent_id, None);
            assert_eq!(entry.name, "");
            assert_eq!(Inode::from_directory_entry(&entry), Inode::root());
        }
        other => panic!("expected INODE_DIRECTORY, got {other:?}"),
    }
}
