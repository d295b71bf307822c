//! Loose object storage.
//!
//! Every object git has ever created starts out here before (optionally)
//! being packed: `.git/objects/XX/YYYY…`, where `XX` is the OID's first hex
//! byte and the rest of the path is the remaining hex digits. On disk each
//! file is zlib-deflated `"<type> <size>\0<content>"` — the same bytes this
//! crate hashes to produce the OID in the first place.

mod enumerate;
mod read;
mod stream;
mod write;

pub use enumerate::LooseObjectIter;
pub use stream::LooseObjectStream;

use git_hash::{HashAlgorithm, ObjectId};
use std::path::{Path, PathBuf};

/// A handle onto one repository's `.git/objects/` directory.
pub struct LooseObjectStore {
    objects_dir: PathBuf,
    hash_algo: HashAlgorithm,
    compression_level: flate2::Compression,
}

impl LooseObjectStore {
    pub fn open(objects_dir: impl AsRef<Path>, hash_algo: HashAlgorithm) -> Self {
        Self {
            objects_dir: objects_dir.as_ref().to_path_buf(),
            hash_algo,
            compression_level: flate2::Compression::default(),
        }
    }

    /// Set the zlib level (0 = store, 9 = max) used by subsequent writes.
    pub fn set_compression_level(&mut self, level: u32) {
        self.compression_level = flate2::Compression::new(level);
    }

    pub fn hash_algo(&self) -> HashAlgorithm {
        self.hash_algo
    }

    pub fn object_path(&self, oid: &ObjectId) -> PathBuf {
        self.objects_dir.join(oid.loose_path())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum LooseError {
    #[error("corrupt loose object {oid}: {reason}")]
    Corrupt { oid: String, reason: String },

    #[error("decompression error for {oid}: {source}")]
    Decompress {
        oid: String,
        #[source]
        source: std::io::Error,
    },

    #[error("hash mismatch for {path}: expected {expected}, got {actual}")]
    HashMismatch {
        path: PathBuf,
        expected: String,
        actual: String,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("object parse error: {0}")]
    Object(#[from] git_object::ObjectError),

    #[error("hash error: {0}")]
    Hash(#[from] git_hash::HashError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn object_path_sha1() {
        let store = LooseObjectStore::open("/tmp/objects", HashAlgorithm::Sha1);
        let oid = ObjectId::from_hex("da39a3ee5e6b4b0d3255bfef95601890afd80709").unwrap();
        let path = store.object_path(&oid);
        assert_eq!(
            path,
            PathBuf::from("/tmp/objects/da/39a3ee5e6b4b0d3255bfef95601890afd80709")
        );
    }

    #[test]
    fn set_compression_level() {
        let mut store = LooseObjectStore::open("/tmp/objects", HashAlgorithm::Sha1);
        store.set_compression_level(9);
    }
}
