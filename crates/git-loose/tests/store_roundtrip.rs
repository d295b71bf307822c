//! Integration tests: loose object store read/write/enumerate/stream behavior.

use git_hash::hasher::Hasher;
use git_hash::{HashAlgorithm, ObjectId};
use git_loose::LooseObjectStore;
use git_object::{Blob, Object, ObjectType};

fn setup_repo() -> (tempfile::TempDir, std::path::PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let objects_dir = dir.path().join("objects");
    std::fs::create_dir_all(&objects_dir).unwrap();
    (dir, objects_dir)
}

// ── US1: Reading objects ─────────────────────────────────────────────────────

#[test]
fn read_blob_roundtrip() {
    let (_dir, objects_dir) = setup_repo();
    let store = LooseObjectStore::open(&objects_dir, HashAlgorithm::Sha1);

    let content = b"hello, loose store!\n";
    let oid = store.write_raw(ObjectType::Blob, content).unwrap();

    let obj = store.read(&oid).unwrap().expect("object should exist");
    match &obj {
        Object::Blob(blob) => assert_eq!(blob.data, content),
        other => panic!("expected blob, got {:?}", other.object_type()),
    }
}

#[test]
fn read_empty_blob() {
    let (_dir, objects_dir) = setup_repo();
    let store = LooseObjectStore::open(&objects_dir, HashAlgorithm::Sha1);

    let oid = store.write_raw(ObjectType::Blob, b"").unwrap();

    let obj = store.read(&oid).unwrap().expect("object should exist");
    match &obj {
        Object::Blob(blob) => assert!(blob.data.is_empty()),
        other => panic!("expected blob, got {:?}", other.object_type()),
    }
}

#[test]
fn read_header_matches_written_type_and_size() {
    let (_dir, objects_dir) = setup_repo();
    let store = LooseObjectStore::open(&objects_dir, HashAlgorithm::Sha1);

    let content = b"some content here\n";
    let oid = store.write_raw(ObjectType::Blob, content).unwrap();

    let (obj_type, size) = store.read_header(&oid).unwrap().expect("header should exist");

    assert_eq!(obj_type, ObjectType::Blob);
    assert_eq!(obj_type.to_string(), "blob");
    assert_eq!(size, content.len());
}

#[test]
fn contains_returns_true_for_existing() {
    let (_dir, objects_dir) = setup_repo();
    let store = LooseObjectStore::open(&objects_dir, HashAlgorithm::Sha1);
    let oid = store.write_raw(ObjectType::Blob, b"test data").unwrap();

    assert!(store.contains(&oid));
}

#[test]
fn contains_returns_false_for_missing() {
    let (_dir, objects_dir) = setup_repo();
    let store = LooseObjectStore::open(&objects_dir, HashAlgorithm::Sha1);
    let oid = ObjectId::from_hex("0000000000000000000000000000000000000000").unwrap();
    assert!(!store.contains(&oid));
}

#[test]
fn read_returns_none_for_missing() {
    let (_dir, objects_dir) = setup_repo();
    let store = LooseObjectStore::open(&objects_dir, HashAlgorithm::Sha1);
    let oid = ObjectId::from_hex("0000000000000000000000000000000000000000").unwrap();
    assert!(store.read(&oid).unwrap().is_none());
}

#[test]
fn read_header_returns_none_for_missing() {
    let (_dir, objects_dir) = setup_repo();
    let store = LooseObjectStore::open(&objects_dir, HashAlgorithm::Sha1);
    let oid = ObjectId::from_hex("0000000000000000000000000000000000000000").unwrap();
    assert!(store.read_header(&oid).unwrap().is_none());
}

#[test]
fn read_large_blob() {
    let (_dir, objects_dir) = setup_repo();
    let content: Vec<u8> = (0..1_000_000).map(|i| (i % 256) as u8).collect();

    let store = LooseObjectStore::open(&objects_dir, HashAlgorithm::Sha1);
    let oid = store.write_raw(ObjectType::Blob, &content).unwrap();

    let obj = store.read(&oid).unwrap().expect("object should exist");
    match &obj {
        Object::Blob(blob) => assert_eq!(blob.data.len(), content.len()),
        other => panic!("expected blob, got {:?}", other.object_type()),
    }
}

#[test]
fn read_verified_detects_valid_object() {
    let (_dir, objects_dir) = setup_repo();
    let store = LooseObjectStore::open(&objects_dir, HashAlgorithm::Sha1);
    let oid = store.write_raw(ObjectType::Blob, b"verified content").unwrap();

    let obj = store.read_verified(&oid).unwrap().expect("object should exist");
    match &obj {
        Object::Blob(blob) => assert_eq!(blob.data, b"verified content"),
        other => panic!("expected blob, got {:?}", other.object_type()),
    }
}

// ── US2: Writing objects ─────────────────────────────────────────────────────

#[test]
fn write_blob_reads_back_identical() {
    let (_dir, objects_dir) = setup_repo();
    let store = LooseObjectStore::open(&objects_dir, HashAlgorithm::Sha1);

    let content = b"round-tripped through the store\n";
    let obj = Object::Blob(Blob {
        data: content.to_vec(),
    });
    let oid = store.write(&obj).unwrap();

    let read_back = store.read(&oid).unwrap().expect("should exist");
    assert_eq!(read_back, obj);
}

#[test]
fn write_empty_blob() {
    let (_dir, objects_dir) = setup_repo();
    let store = LooseObjectStore::open(&objects_dir, HashAlgorithm::Sha1);

    let obj = Object::Blob(Blob { data: vec![] });
    let oid = store.write(&obj).unwrap();

    let read_back = store.read(&oid).unwrap().expect("should exist");
    match read_back {
        Object::Blob(blob) => assert!(blob.data.is_empty()),
        other => panic!("expected blob, got {:?}", other.object_type()),
    }
}

#[test]
fn write_raw_matches_expected_hash() {
    let (_dir, objects_dir) = setup_repo();
    let store = LooseObjectStore::open(&objects_dir, HashAlgorithm::Sha1);

    let content = b"raw write test\n";
    let oid = store.write_raw(ObjectType::Blob, content).unwrap();

    let expected = Hasher::hash_object(HashAlgorithm::Sha1, "blob", content).unwrap();
    assert_eq!(oid, expected);
}

#[test]
fn write_is_idempotent() {
    let (_dir, objects_dir) = setup_repo();
    let store = LooseObjectStore::open(&objects_dir, HashAlgorithm::Sha1);

    let content = b"idempotent test";
    let oid1 = store.write_raw(ObjectType::Blob, content).unwrap();
    let oid2 = store.write_raw(ObjectType::Blob, content).unwrap();
    assert_eq!(oid1, oid2);
}

#[test]
fn write_creates_fanout_directory() {
    let (_dir, objects_dir) = setup_repo();
    let store = LooseObjectStore::open(&objects_dir, HashAlgorithm::Sha1);

    let content = b"fanout directory test";
    let oid = store.write_raw(ObjectType::Blob, content).unwrap();

    let path = store.object_path(&oid);
    assert!(path.exists());
    assert!(path.parent().unwrap().is_dir());
}

#[test]
fn write_stream_matches_write_raw() {
    let (_dir, objects_dir) = setup_repo();
    let store = LooseObjectStore::open(&objects_dir, HashAlgorithm::Sha1);

    let content = b"stream write test";
    let oid1 = store.write_raw(ObjectType::Blob, content).unwrap();

    let mut cursor = std::io::Cursor::new(content);
    let oid2 = store
        .write_stream(ObjectType::Blob, content.len(), &mut cursor)
        .unwrap();
    assert_eq!(oid1, oid2);
}

// ── Roundtrip ───────────────────────────────────────────────────────────────

#[test]
fn roundtrip_blob() {
    let (_dir, objects_dir) = setup_repo();
    let store = LooseObjectStore::open(&objects_dir, HashAlgorithm::Sha1);

    let content = b"roundtrip content\n";
    let obj = Object::Blob(Blob {
        data: content.to_vec(),
    });
    let oid = store.write(&obj).unwrap();

    let read_obj = store.read(&oid).unwrap().expect("should exist");
    assert_eq!(obj, read_obj);
}

// ── US3: Enumeration ────────────────────────────────────────────────────────

#[test]
fn enumerate_finds_all_objects() {
    let (_dir, objects_dir) = setup_repo();
    let store = LooseObjectStore::open(&objects_dir, HashAlgorithm::Sha1);

    let mut expected_oids = std::collections::HashSet::new();
    for i in 0..5 {
        let content = format!("object number {i}");
        let oid = store.write_raw(ObjectType::Blob, content.as_bytes()).unwrap();
        expected_oids.insert(oid.to_hex());
    }

    let found_oids: std::collections::HashSet<String> =
        store.iter().unwrap().map(|r| r.unwrap().to_hex()).collect();

    for expected in &expected_oids {
        assert!(found_oids.contains(expected), "missing OID: {expected}");
    }
}

#[test]
fn enumerate_empty_store() {
    let (_dir, objects_dir) = setup_repo();
    let store = LooseObjectStore::open(&objects_dir, HashAlgorithm::Sha1);
    let count = store.iter().unwrap().count();
    assert_eq!(count, 0);
}

// ── US4: Streaming ──────────────────────────────────────────────────────────

#[test]
fn stream_read_blob() {
    let (_dir, objects_dir) = setup_repo();
    let content = b"streaming test content\n";

    let store = LooseObjectStore::open(&objects_dir, HashAlgorithm::Sha1);
    let oid = store.write_raw(ObjectType::Blob, content).unwrap();

    let mut stream = store.stream(&oid).unwrap().expect("should exist");
    assert_eq!(stream.object_type(), ObjectType::Blob);
    assert_eq!(stream.size(), content.len());

    let mut buf = Vec::new();
    std::io::Read::read_to_end(&mut stream, &mut buf).unwrap();
    assert_eq!(buf, content);
    assert_eq!(stream.bytes_remaining(), 0);
}

#[test]
fn stream_returns_none_for_missing() {
    let (_dir, objects_dir) = setup_repo();
    let store = LooseObjectStore::open(&objects_dir, HashAlgorithm::Sha1);
    let oid = ObjectId::from_hex("0000000000000000000000000000000000000000").unwrap();
    assert!(store.stream(&oid).unwrap().is_none());
}

#[test]
fn stream_partial_read() {
    let (_dir, objects_dir) = setup_repo();
    let content = b"partial read content that is fairly long to test partial reads\n";

    let store = LooseObjectStore::open(&objects_dir, HashAlgorithm::Sha1);
    let oid = store.write_raw(ObjectType::Blob, content).unwrap();

    let mut stream = store.stream(&oid).unwrap().expect("should exist");

    let mut buf = [0u8; 10];
    let n = std::io::Read::read(&mut stream, &mut buf).unwrap();
    assert_eq!(n, 10);
    assert_eq!(&buf[..10], &content[..10]);
    assert_eq!(stream.bytes_remaining(), content.len() - 10);
}
