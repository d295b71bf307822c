use std::fs;
use std::io::Read;

use flate2::read::ZlibDecoder;
use git_hash::hasher::Hasher;
use git_hash::ObjectId;
use git_object::header;
use git_object::{Object, ObjectType};

use crate::{LooseError, LooseObjectStore};

/// Read an object file's raw (still-compressed) bytes, translating a
/// missing file into `Ok(None)` rather than an error — callers distinguish
/// "doesn't exist" from "exists but broken" this way.
fn read_compressed(path: &std::path::Path) -> Result<Option<Vec<u8>>, LooseError> {
    match fs::read(path) {
        Ok(data) => Ok(Some(data)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(LooseError::Io(e)),
    }
}

/// Fill `buf` from `decoder` until the header's null terminator shows up,
/// returning the number of bytes filled. Shared by the full-header read
/// path here and [`crate::stream`]'s header-then-content path — headers
/// run well under the buffer's size in practice.
pub(crate) fn fill_header_buf<R: Read>(
    decoder: &mut R,
    oid: &ObjectId,
    buf: &mut [u8],
) -> Result<usize, LooseError> {
    let mut filled = 0;
    loop {
        if filled >= buf.len() {
            return Err(LooseError::Corrupt {
                oid: oid.to_hex(),
                reason: "header exceeds 64 bytes".into(),
            });
        }
        let n = decoder
            .read(&mut buf[filled..])
            .map_err(|e| LooseError::Decompress { oid: oid.to_hex(), source: e })?;
        if n == 0 {
            return Err(LooseError::Corrupt {
                oid: oid.to_hex(),
                reason: "unexpected EOF before header null terminator".into(),
            });
        }
        filled += n;
        if buf[..filled].contains(&0) {
            return Ok(filled);
        }
    }
}

impl LooseObjectStore {
    pub fn contains(&self, oid: &ObjectId) -> bool {
        self.object_path(oid).is_file()
    }

    /// Read and fully decode an object. `Ok(None)` means no such object.
    pub fn read(&self, oid: &ObjectId) -> Result<Option<Object>, LooseError> {
        let Some(compressed) = read_compressed(&self.object_path(oid))? else {
            return Ok(None);
        };
        let decompressed = decompress_all(&compressed, oid)?;
        Ok(Some(Object::parse(&decompressed)?))
    }

    /// Decode only enough of the stream to recover `(type, content_size)`,
    /// skipping the cost of inflating and parsing the whole object.
    pub fn read_header(&self, oid: &ObjectId) -> Result<Option<(ObjectType, usize)>, LooseError> {
        let Some(compressed) = read_compressed(&self.object_path(oid))? else {
            return Ok(None);
        };

        let mut decoder = ZlibDecoder::new(&compressed[..]);
        let mut buf = [0u8; 64];
        let filled = fill_header_buf(&mut decoder, oid, &mut buf)?;

        let (obj_type, content_size, _header_len) = header::parse_header(&buf[..filled])?;
        Ok(Some((obj_type, content_size)))
    }

    /// Like [`read`](Self::read), but also recomputes the hash of the
    /// decompressed bytes and rejects a file whose content doesn't match
    /// the OID it's stored under (on-disk corruption, wrong object, etc.).
    pub fn read_verified(&self, oid: &ObjectId) -> Result<Option<Object>, LooseError> {
        let path = self.object_path(oid);
        let Some(compressed) = read_compressed(&path)? else {
            return Ok(None);
        };
        let decompressed = decompress_all(&compressed, oid)?;

        let actual_oid = Hasher::digest(self.hash_algo, &decompressed)?;
        if actual_oid != *oid {
            return Err(LooseError::HashMismatch {
                path,
                expected: oid.to_hex(),
                actual: actual_oid.to_hex(),
            });
        }

        Ok(Some(Object::parse(&decompressed)?))
    }
}

fn decompress_all(compressed: &[u8], oid: &ObjectId) -> Result<Vec<u8>, LooseError> {
    let mut decoder = ZlibDecoder::new(compressed);
    let mut decompressed = Vec::new();
    decoder
        .read_to_end(&mut decompressed)
        .map_err(|e| LooseError::Decompress { oid: oid.to_hex(), source: e })?;
    Ok(decompressed)
}
