use git_hash::hasher::Hasher;
use git_hash::{HashAlgorithm, ObjectId};

// ── SHA-1 raw digest test vectors ───────────────────────────────────

#[test]
fn sha1_empty_string() {
    let oid = Hasher::digest(HashAlgorithm::Sha1, b"").unwrap();
    assert_eq!(oid.to_hex(), "da39a3ee5e6b4b0d3255bfef95601890afd80709");
}

#[test]
fn sha1_hello_world() {
    let oid = Hasher::digest(HashAlgorithm::Sha1, b"hello world").unwrap();
    assert_eq!(oid.to_hex(), "2aae6c35c94fcfb415dbe95f408b9ce91ee846ed");
}

// ── hash-object compatible test vectors ──────────────────────────
// These match `git hash-object --stdin` output.
// The header "blob <len>\0" is prepended to the content before hashing.

#[test]
fn hash_object_empty_blob() {
    let oid = Hasher::hash_object(HashAlgorithm::Sha1, "blob", b"").unwrap();
    assert_eq!(oid.to_hex(), "e69de29bb2d1d6434b8b29ae775ad8c2e48c5391");
}

#[test]
fn hash_object_hello_world() {
    let oid = Hasher::hash_object(HashAlgorithm::Sha1, "blob", b"hello world").unwrap();
    assert_eq!(oid.to_hex(), "95d09f2b10159347eece71399a7e2e907ea3df4f");
}

#[test]
fn hash_object_hello_world_newline() {
    // "Hello, World!\n" as a blob — 14 bytes content
    let oid = Hasher::hash_object(HashAlgorithm::Sha1, "blob", b"Hello, World!\n").unwrap();
    assert_eq!(oid.to_hex(), "8ab686eafeb1f44702738c8b0f24f2567c36da6d");
}

#[test]
fn hash_object_six_byte_blob_matches_e1() {
    let oid = Hasher::hash_object(HashAlgorithm::Sha1, "blob", b"hello\n").unwrap();
    assert_eq!(oid.to_hex(), "ce013625030ba8dba906f756967f9e9ca394464a");
}

// ── Streaming hash (multi-chunk) ────────────────────────────────────

#[test]
fn streaming_matches_oneshot() {
    let data = b"the quick brown fox jumps over the lazy dog";
    let oneshot = Hasher::digest(HashAlgorithm::Sha1, data).unwrap();

    let mut hasher = Hasher::new(HashAlgorithm::Sha1);
    hasher.update(&data[..10]);
    hasher.update(&data[10..20]);
    hasher.update(&data[20..]);
    let streamed = hasher.finalize().unwrap();

    assert_eq!(oneshot, streamed);
}

// ── Write trait usage ───────────────────────────────────────────────

#[test]
fn write_trait() {
    use std::io::Write;

    let data = b"hello world";
    let expected = Hasher::digest(HashAlgorithm::Sha1, data).unwrap();

    let mut hasher = Hasher::new(HashAlgorithm::Sha1);
    hasher.write_all(data).unwrap();
    let result = hasher.finalize().unwrap();

    assert_eq!(expected, result);
}

// ── object kind discriminates the hash ──────────────────────────────

#[test]
fn hash_object_tree_type() {
    let data = b"some content";
    let blob = Hasher::hash_object(HashAlgorithm::Sha1, "blob", data).unwrap();
    let tree = Hasher::hash_object(HashAlgorithm::Sha1, "tree", data).unwrap();
    let commit = Hasher::hash_object(HashAlgorithm::Sha1, "commit", data).unwrap();

    assert_ne!(blob, tree);
    assert_ne!(blob, commit);
    assert_ne!(tree, commit);
}

// ── ObjectId from hash result ───────────────────────────────────────

#[test]
fn hash_result_display_parse_roundtrip() {
    let oid = Hasher::hash_object(HashAlgorithm::Sha1, "blob", b"test content").unwrap();
    let hex = oid.to_string();
    let parsed: ObjectId = hex.parse().unwrap();
    assert_eq!(oid, parsed);
}
