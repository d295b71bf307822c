//! Integration tests: ref resolution across loose, symbolic, and packed refs.
//!
//! These tests build ref layouts directly through the store's own write
//! API and check that resolution matches what was written.

use git_hash::ObjectId;
use git_ref::{FilesRefStore, PackedRefs, RefName, RefStore};

fn setup_store() -> (tempfile::TempDir, FilesRefStore) {
    let dir = tempfile::tempdir().unwrap();
    let store = FilesRefStore::new(dir.path());
    (dir, store)
}

fn oid(hex: &str) -> ObjectId {
    ObjectId::from_hex(hex).unwrap()
}

// ── US1: Resolve refs ────────────────────────────────────────────────────────

#[test]
fn resolve_branch_ref() {
    let (_dir, store) = setup_store();
    let name = RefName::new("refs/heads/feature").unwrap();
    let expected = oid("da39a3ee5e6b4b0d3255bfef95601890afd80709");
    store.write_ref(&name, &expected).unwrap();

    let resolved = store.resolve_to_oid(&name).unwrap().unwrap();
    assert_eq!(resolved, expected);
}

#[test]
fn resolve_head_symbolic() {
    let (_dir, store) = setup_store();
    let main = RefName::new("refs/heads/main").unwrap();
    let expected = oid("da39a3ee5e6b4b0d3255bfef95601890afd80709");
    store.write_ref(&main, &expected).unwrap();

    let head = RefName::new("HEAD").unwrap();
    store.write_symbolic_ref(&head, &main).unwrap();

    let resolved = store.resolve_to_oid(&head).unwrap().unwrap();
    assert_eq!(resolved, expected);
    assert!(store.resolve(&head).unwrap().unwrap().is_symbolic());
}

#[test]
fn resolve_detached_head() {
    let (_dir, store) = setup_store();
    let expected = oid("da39a3ee5e6b4b0d3255bfef95601890afd80709");
    let head = RefName::new("HEAD").unwrap();
    store.write_ref(&head, &expected).unwrap();

    assert!(store.resolve(&head).unwrap().unwrap().is_direct());
    let resolved = store.resolve_to_oid(&head).unwrap().unwrap();
    assert_eq!(resolved, expected);
}

#[test]
fn resolve_tag_ref() {
    let (_dir, store) = setup_store();
    let name = RefName::new("refs/tags/v1.0").unwrap();
    let expected = oid("da39a3ee5e6b4b0d3255bfef95601890afd80709");
    store.write_ref(&name, &expected).unwrap();

    let resolved = store.resolve_to_oid(&name).unwrap().unwrap();
    assert_eq!(resolved, expected);
}

#[test]
fn resolve_nonexistent_ref() {
    let (_dir, store) = setup_store();
    let name = RefName::new("refs/heads/nonexistent").unwrap();
    assert!(store.resolve_to_oid(&name).unwrap().is_none());
}

#[test]
fn resolve_multiple_branches() {
    let (_dir, store) = setup_store();
    for (branch, hex) in [
        ("alpha", "aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa"),
        ("beta", "bbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbb"),
        ("gamma", "cccccccccccccccccccccccccccccccccccccccc"),
    ] {
        let name = RefName::new(format!("refs/heads/{branch}")).unwrap();
        let expected = oid(hex);
        store.write_ref(&name, &expected).unwrap();

        let resolved = store.resolve_to_oid(&name).unwrap().unwrap();
        assert_eq!(resolved, expected, "mismatch for branch {branch}");
    }
}

#[test]
fn resolve_packed_ref() {
    let (dir, store) = setup_store();
    let name = RefName::new("refs/heads/packed-branch").unwrap();
    let expected = oid("da39a3ee5e6b4b0d3255bfef95601890afd80709");

    let mut packed = PackedRefs::load(dir.path()).unwrap();
    packed.upsert(name.clone(), expected, None);
    packed.write(dir.path()).unwrap();

    let resolved = store.resolve_to_oid(&name).unwrap().unwrap();
    assert_eq!(resolved, expected);
}

#[test]
fn resolve_after_second_commit() {
    let (_dir, store) = setup_store();
    let head = RefName::new("HEAD").unwrap();
    let first = oid("aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa");
    store.write_ref(&head, &first).unwrap();
    assert_eq!(store.resolve_to_oid(&head).unwrap().unwrap(), first);

    let second = oid("bbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbb");
    store.write_ref(&head, &second).unwrap();
    assert_eq!(store.resolve_to_oid(&head).unwrap().unwrap(), second);
}

// ── Symbolic ref chain ───────────────────────────────────────────────────────

#[test]
fn resolve_symbolic_ref_chain() {
    let (_dir, store) = setup_store();
    let main = RefName::new("refs/heads/main").unwrap();
    let head_oid = oid("da39a3ee5e6b4b0d3255bfef95601890afd80709");
    store.write_ref(&main, &head_oid).unwrap();

    // refs/test/a -> refs/test/b -> refs/heads/main
    let b = RefName::new("refs/test/b").unwrap();
    store.write_symbolic_ref(&b, &main).unwrap();

    let a = RefName::new("refs/test/a").unwrap();
    store.write_symbolic_ref(&a, &b).unwrap();

    let resolved = store.resolve_to_oid(&a).unwrap().unwrap();
    assert_eq!(resolved, head_oid);
}
