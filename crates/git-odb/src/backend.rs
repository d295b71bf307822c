//! Pluggable object storage backend trait.

use git_hash::ObjectId;
use git_object::{Object, ObjectType};

use crate::OdbError;

/// Trait for pluggable object storage backends.
///
/// Implementations provide access to objects in a specific storage format
/// (loose files, packfiles, etc.).
pub trait OdbBackend: Send + Sync {
    /// Read an object by OID.
    fn read(&self, oid: &ObjectId) -> Result<Option<Object>, OdbError>;

    /// Read just the header (type + size).
    fn read_header(&self, oid: &ObjectId) -> Result<Option<(ObjectType, usize)>, OdbError>;

    /// Check if an object exists.
    fn contains(&self, oid: &ObjectId) -> bool;

    /// Write an object, returning its OID.
    fn write(&self, obj: &Object) -> Result<ObjectId, OdbError>;

    /// Find all OIDs matching the given hex prefix.
    fn lookup_prefix(&self, prefix: &str) -> Result<Vec<ObjectId>, OdbError>;
}

/// OdbBackend implementation for loose object storage.
impl OdbBackend for git_loose::LooseObjectStore {
    fn read(&self, oid: &ObjectId) -> Result<Option<Object>, OdbError> {
        Ok(self.read(oid)?)
    }

    fn read_header(&self, oid: &ObjectId) -> Result<Option<(ObjectType, usize)>, OdbError> {
        Ok(self.read_header(oid)?)
    }

    fn contains(&self, oid: &ObjectId) -> bool {
        self.contains(oid)
    }

    fn write(&self, obj: &Object) -> Result<ObjectId, OdbError> {
        Ok(self.write(obj)?)
    }

    /// Loose storage has no prefix index, so every prefix length is
    /// answered by a full fan-out walk filtered by `starts_with_hex`.
    fn lookup_prefix(&self, prefix: &str) -> Result<Vec<ObjectId>, OdbError> {
        let Ok(iter) = self.iter() else {
            return Ok(Vec::new());
        };
        iter.filter_map(|result| match result {
            Ok(oid) if oid.starts_with_hex(prefix) => Some(Ok(oid)),
            Ok(_) => None,
            Err(e) => Some(Err(e.into())),
        })
        .collect()
    }
}

/// OdbBackend implementation for a single pack file.
impl OdbBackend for git_pack::pack::PackFile {
    fn read(&self, oid: &ObjectId) -> Result<Option<Object>, OdbError> {
        let Some(packed) = self.read_object(oid)? else {
            return Ok(None);
        };
        let obj = Object::parse_content(packed.obj_type, &packed.data).map_err(|e| {
            OdbError::Corrupt {
                oid: *oid,
                reason: e.to_string(),
            }
        })?;
        Ok(Some(obj))
    }

    /// Packs don't store type/size independently of the object body, so a
    /// header lookup here costs the same as a full read.
    fn read_header(&self, oid: &ObjectId) -> Result<Option<(ObjectType, usize)>, OdbError> {
        Ok(self
            .read_object(oid)?
            .map(|packed| (packed.obj_type, packed.data.len())))
    }

    fn contains(&self, oid: &ObjectId) -> bool {
        self.contains(oid)
    }

    fn write(&self, _obj: &Object) -> Result<ObjectId, OdbError> {
        Err(OdbError::Io(std::io::Error::new(
            std::io::ErrorKind::Unsupported,
            "cannot write to pack files directly",
        )))
    }

    fn lookup_prefix(&self, prefix: &str) -> Result<Vec<ObjectId>, OdbError> {
        let prefix_bytes = hex_prefix_to_bytes(prefix);
        Ok(self
            .index()
            .lookup_prefix(&prefix_bytes)
            .into_iter()
            .map(|(oid, _offset)| oid)
            .collect())
    }
}

/// Convert a hex prefix string to raw bytes for pack index prefix lookup.
///
/// For even-length prefixes, this is a straightforward hex decode.
/// For odd-length prefixes, the last nibble is padded with 0.
pub(crate) fn hex_prefix_to_bytes(hex: &str) -> Vec<u8> {
    fn nibble(b: u8) -> u8 {
        match b {
            b'0'..=b'9' => b - b'0',
            b'a'..=b'f' => b - b'a' + 10,
            b'A'..=b'F' => b - b'A' + 10,
            _ => 0,
        }
    }

    hex.as_bytes()
        .chunks(2)
        .map(|chunk| {
            let hi = nibble(chunk[0]);
            let lo = chunk.get(1).map(|&b| nibble(b)).unwrap_or(0);
            (hi << 4) | lo
        })
        .collect()
}
