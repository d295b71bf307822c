//! Tree diff and rename/copy detection integration tests.

use bstr::BString;
use git_diff::rename::{rename_detector, rename_detector_with_progress, similarity};
use git_diff::{tree::tree_changes, ChangeKind, DiffError};
use git_object::{Blob, FileMode, Object, Tree, TreeEntry};
use git_odb::ObjectDatabase;
use git_utils::CancellationToken;

fn blob_id(odb: &ObjectDatabase, content: &[u8]) -> git_hash::ObjectId {
    odb.write(&Object::Blob(Blob::new(content.to_vec()))).unwrap()
}

fn tree_id(odb: &ObjectDatabase, entries: Vec<TreeEntry>) -> git_hash::ObjectId {
    odb.write(&Object::Tree(Tree { entries })).unwrap()
}

fn entry(name: &str, mode: FileMode, oid: git_hash::ObjectId) -> TreeEntry {
    TreeEntry {
        mode,
        name: BString::from(name),
        oid,
    }
}

#[test]
fn similarity_identical_content() {
    assert_eq!(similarity(b"hello world\n", b"hello world\n"), 1.0);
}

#[test]
fn similarity_empty_files() {
    assert_eq!(similarity(b"", b""), 1.0);
}

#[test]
fn similarity_one_empty() {
    assert_eq!(similarity(b"content\n", b""), 0.0);
    assert_eq!(similarity(b"", b"content\n"), 0.0);
}

#[test]
fn tree_changes_detects_add_delete_modify() {
    let dir = tempfile::tempdir().unwrap();
    let odb = ObjectDatabase::open(dir.path()).unwrap();

    let a1 = blob_id(&odb, b"version one\n");
    let a2 = blob_id(&odb, b"version two\n");
    let unchanged = blob_id(&odb, b"never changes\n");

    let old_tree = tree_id(
        &odb,
        vec![
            entry("a.txt", FileMode::Regular, a1),
            entry("keep.txt", FileMode::Regular, unchanged),
            entry("gone.txt", FileMode::Regular, a1),
        ],
    );
    let new_tree = tree_id(
        &odb,
        vec![
            entry("a.txt", FileMode::Regular, a2),
            entry("keep.txt", FileMode::Regular, unchanged),
        ],
    );

    let changes = tree_changes(&odb, Some(&old_tree), Some(&new_tree), false).unwrap();
    let kinds: Vec<ChangeKind> = changes.iter().map(|c| c.kind).collect();

    assert!(kinds.contains(&ChangeKind::Modify));
    assert!(kinds.contains(&ChangeKind::Delete));
    assert!(!kinds.contains(&ChangeKind::Add));
    // "keep.txt" is identical and include_unchanged was false.
    assert_eq!(changes.len(), 2);
}

#[test]
fn rename_detector_pairs_exact_content_move() {
    let dir = tempfile::tempdir().unwrap();
    let odb = ObjectDatabase::open(dir.path()).unwrap();

    let content = blob_id(&odb, b"moved without changes\n");

    let old_tree = tree_id(&odb, vec![entry("src/old_name.rs", FileMode::Regular, content)]);
    let new_tree = tree_id(&odb, vec![entry("src/new_name.rs", FileMode::Regular, content)]);

    let changes = tree_changes(&odb, Some(&old_tree), Some(&new_tree), false).unwrap();
    assert_eq!(changes.len(), 2); // one Delete, one Add before detection

    let changes = rename_detector(&odb, changes, 0.5, false, None).unwrap();
    assert_eq!(changes.len(), 1);
    assert_eq!(changes[0].kind, ChangeKind::Rename);
    assert_eq!(changes[0].similarity, Some(1.0));
    assert_eq!(changes[0].old_entry.as_ref().unwrap().path, "src/old_name.rs");
    assert_eq!(changes[0].new_entry.as_ref().unwrap().path, "src/new_name.rs");
}

#[test]
fn rename_detector_below_threshold_stays_split() {
    let dir = tempfile::tempdir().unwrap();
    let odb = ObjectDatabase::open(dir.path()).unwrap();

    let old_content = blob_id(&odb, &vec![b'a'; 500]);
    let new_content = blob_id(&odb, &vec![b'z'; 500]);

    let old_tree = tree_id(&odb, vec![entry("one.bin", FileMode::Regular, old_content)]);
    let new_tree = tree_id(&odb, vec![entry("two.bin", FileMode::Regular, new_content)]);

    let changes = tree_changes(&odb, Some(&old_tree), Some(&new_tree), false).unwrap();
    let changes = rename_detector(&odb, changes, 0.5, false, None).unwrap();

    assert_eq!(changes.len(), 2);
    assert!(changes.iter().any(|c| c.kind == ChangeKind::Delete));
    assert!(changes.iter().any(|c| c.kind == ChangeKind::Add));
}

#[test]
fn rename_detector_finds_copies_from_unchanged_source() {
    let dir = tempfile::tempdir().unwrap();
    let odb = ObjectDatabase::open(dir.path()).unwrap();

    let shared = blob_id(&odb, b"shared template content\n");

    let old_tree = tree_id(&odb, vec![entry("template.txt", FileMode::Regular, shared)]);
    let new_tree = tree_id(
        &odb,
        vec![
            entry("template.txt", FileMode::Regular, shared),
            entry("copy_of_template.txt", FileMode::Regular, shared),
        ],
    );

    let changes = tree_changes(&odb, Some(&old_tree), Some(&new_tree), true).unwrap();
    let changes = rename_detector(&odb, changes, 0.5, true, None).unwrap();

    let copy = changes.iter().find(|c| c.kind == ChangeKind::Copy);
    assert!(copy.is_some(), "expected a Copy change, got {changes:?}");
}

#[test]
fn rename_detector_respects_pre_cancelled_token() {
    let dir = tempfile::tempdir().unwrap();
    let odb = ObjectDatabase::open(dir.path()).unwrap();

    let old_content = blob_id(&odb, &vec![b'a'; 500]);
    let new_content = blob_id(&odb, &vec![b'a'; 480]);

    let old_tree = tree_id(&odb, vec![entry("one.bin", FileMode::Regular, old_content)]);
    let new_tree = tree_id(&odb, vec![entry("two.bin", FileMode::Regular, new_content)]);

    let changes = tree_changes(&odb, Some(&old_tree), Some(&new_tree), false).unwrap();

    let token = CancellationToken::new();
    token.cancel();

    let result =
        rename_detector_with_progress(&odb, changes, 0.5, false, None, None, Some(&token));
    assert!(matches!(result, Err(DiffError::Cancelled)));
}

#[test]
fn rename_detector_reports_progress_per_candidate() {
    let dir = tempfile::tempdir().unwrap();
    let odb = ObjectDatabase::open(dir.path()).unwrap();

    let old_content = blob_id(&odb, &vec![b'a'; 500]);
    let new_content = blob_id(&odb, &vec![b'z'; 500]);

    let old_tree = tree_id(&odb, vec![entry("one.bin", FileMode::Regular, old_content)]);
    let new_tree = tree_id(&odb, vec![entry("two.bin", FileMode::Regular, new_content)]);

    let changes = tree_changes(&odb, Some(&old_tree), Some(&new_tree), false).unwrap();

    let mut calls = 0;
    let mut cb = |_update: git_utils::progress::ProgressUpdate| calls += 1;
    rename_detector_with_progress(&odb, changes, 0.5, false, None, Some(&mut cb), None).unwrap();

    assert_eq!(calls, 1);
}
