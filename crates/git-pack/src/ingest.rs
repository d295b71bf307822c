//! Fetch ingest: stream an incoming packfile to disk and build its index.
//!
//! Mirrors [`crate::pack::PackFile::read_object_with_resolver`]'s
//! resolver-callback pattern so this crate never depends on the composite
//! object store directly (that dependency runs the other way).

use std::collections::HashMap;
use std::fs;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use git_hash::hasher::Hasher;
use git_hash::{HashAlgorithm, ObjectId};
use git_object::ObjectType;
use git_utils::progress::{ProgressCallback, ProgressUpdate};
use git_utils::CancellationToken;

use crate::entry::parse_entry_header;
use crate::write::build_pack_index;
use crate::{
    PackEntryType, PackError, PACK_HEADER_SIZE, PACK_SIGNATURE, PACK_SUPPORTED_VERSIONS,
};

/// Result of successfully ingesting an incoming pack stream.
pub struct IngestedPack {
    pub pack_path: PathBuf,
    pub idx_path: PathBuf,
    pub checksum: ObjectId,
    pub num_objects: u32,
}

/// One object as recorded during the first (sequential) scan pass, before
/// delta chains are resolved.
struct ScannedEntry {
    offset: u64,
    kind: PackEntryType,
    /// Decompressed bytes: full object content for base types, delta
    /// instructions for ofs/ref delta entries.
    raw: Vec<u8>,
    crc32: u32,
}

/// Streams an incoming packfile to a temp file under `pack_dir`, verifies its
/// trailing checksum, resolves every object's id, and emits the final
/// `pack-<checksum>.pack` / `.idx` pair. Any failure removes the temp file
/// and leaves no other trace.
pub struct PackIndexer {
    pack_dir: PathBuf,
}

impl PackIndexer {
    /// `pack_dir` is typically `<repo>/objects/pack`.
    pub fn new(pack_dir: impl AsRef<Path>) -> Self {
        Self {
            pack_dir: pack_dir.as_ref().to_path_buf(),
        }
    }

    /// Ingest `input` as a complete packfile.
    ///
    /// `resolver` is consulted for ref-delta bases not present earlier in
    /// this same pack (typically backed by the caller's composite object
    /// store). `progress` is reported once per object indexed; `cancel` is
    /// checked at the same per-object boundary.
    pub fn run(
        &self,
        mut input: impl Read,
        resolver: impl Fn(&ObjectId) -> Option<(ObjectType, Vec<u8>)>,
        progress: Option<ProgressCallback<'_>>,
        cancel: Option<&CancellationToken>,
    ) -> Result<IngestedPack, PackError> {
        fs::create_dir_all(&self.pack_dir)?;
        let tmp_path = self.pack_dir.join(format!(
            "tmp_pack_{}",
            std::process::id()
                ^ std::time::SystemTime::now()
                    .duration_since(std::time::UNIX_EPOCH)
                    .unwrap_or_default()
                    .subsec_nanos()
        ));

        match self.ingest_into(&mut input, &tmp_path, resolver, progress, cancel) {
            Ok(ingested) => Ok(ingested),
            Err(e) => {
                let _ = fs::remove_file(&tmp_path);
                Err(e)
            }
        }
    }

    fn ingest_into(
        &self,
        input: &mut impl Read,
        tmp_path: &Path,
        resolver: impl Fn(&ObjectId) -> Option<(ObjectType, Vec<u8>)>,
        progress: Option<ProgressCallback<'_>>,
        cancel: Option<&CancellationToken>,
    ) -> Result<IngestedPack, PackError> {
        {
            let mut file = fs::File::create(tmp_path)?;
            let mut buf = [0u8; 64 * 1024];
            loop {
                if let Some(token) = cancel {
                    if token.is_cancelled() {
                        return Err(PackError::Cancelled);
                    }
                }
                let n = input.read(&mut buf)?;
                if n == 0 {
                    break;
                }
                file.write_all(&buf[..n])?;
            }
        }

        let data = fs::read(tmp_path)?;
        let hash_len = HashAlgorithm::Sha1.digest_len();
        if data.len() < PACK_HEADER_SIZE + hash_len {
            return Err(PackError::InvalidHeader("pack too small".into()));
        }
        if &data[0..4] != PACK_SIGNATURE {
            return Err(PackError::InvalidHeader("bad PACK signature".into()));
        }
        let version = u32::from_be_bytes([data[4], data[5], data[6], data[7]]);
        if !PACK_SUPPORTED_VERSIONS.contains(&version) {
            return Err(PackError::UnsupportedVersion(version));
        }
        let num_objects = u32::from_be_bytes([data[8], data[9], data[10], data[11]]);

        let content = &data[..data.len() - hash_len];
        let trailer = &data[data.len() - hash_len..];
        let stored = ObjectId::from_bytes(trailer)
            .map_err(|_| PackError::InvalidHeader("invalid checksum bytes".into()))?;

        let mut hasher = Hasher::new(HashAlgorithm::Sha1);
        hasher.update(content);
        let computed = hasher.finalize().map_err(PackError::Hash)?;
        if computed != stored {
            return Err(PackError::ChecksumMismatch {
                expected: stored,
                actual: computed,
            });
        }

        let scanned = scan_entries(&data, num_objects)?;
        let resolved = resolve_entries(&scanned, &resolver, progress, cancel)?;

        let pack_path = self.pack_dir.join(format!("pack-{computed}.pack"));
        let idx_path = self.pack_dir.join(format!("pack-{computed}.idx"));

        // Content-addressed: if another ingest already produced this exact
        // pack, treat the race as success rather than an error.
        match fs::rename(tmp_path, &pack_path) {
            Ok(()) => {}
            Err(_) if pack_path.exists() => {
                let _ = fs::remove_file(tmp_path);
            }
            Err(e) => return Err(PackError::Io(e)),
        }

        let mut entries: Vec<(ObjectId, u64, u32)> = resolved
            .iter()
            .zip(scanned.iter())
            .map(|((oid, offset, _, _), scanned)| (*oid, *offset, scanned.crc32))
            .collect();
        build_pack_index(&idx_path, &mut entries, &computed)?;

        Ok(IngestedPack {
            pack_path,
            idx_path,
            checksum: computed,
            num_objects,
        })
    }
}

/// Walk the pack sequentially, decompressing every entry once.
fn scan_entries(data: &[u8], num_objects: u32) -> Result<Vec<ScannedEntry>, PackError> {
    let mut entries = Vec::with_capacity(num_objects as usize);
    let mut offset = PACK_HEADER_SIZE as u64;

    for _ in 0..num_objects {
        let header = parse_entry_header(&data[offset as usize..], offset)?;
        let compressed = &data[header.data_offset as usize..];
        let (raw, consumed) = decompress_tracked(compressed, offset)?;

        let header_bytes = &data[offset as usize..offset as usize + header.header_size];
        let mut crc = crc32fast::Hasher::new();
        crc.update(header_bytes);
        crc.update(&compressed[..consumed]);
        let crc32 = crc.finalize();

        let next_offset = header.data_offset + consumed as u64;
        entries.push(ScannedEntry {
            offset,
            kind: header.entry_type,
            raw,
            crc32,
        });
        offset = next_offset;
    }

    Ok(entries)
}

/// Decompress a zlib stream, returning the decompressed bytes and how many
/// compressed input bytes it consumed (so the caller can find the next
/// entry's header without the pack declaring a length up front).
fn decompress_tracked(compressed: &[u8], offset: u64) -> Result<(Vec<u8>, usize), PackError> {
    use flate2::bufread::ZlibDecoder;
    let mut decoder = ZlibDecoder::new(compressed);
    let mut buf = Vec::new();
    decoder
        .read_to_end(&mut buf)
        .map_err(|_| PackError::CorruptEntry(offset))?;
    Ok((buf, decoder.total_in() as usize))
}

/// Resolve every scanned entry's final `(type, bytes)` and id, in pack order.
///
/// Ofs-delta bases are always at a strictly lower offset within this pack
/// (guaranteed by the format); ref-delta bases are looked up first among
/// already-resolved entries in this pack, then via `resolver`.
fn resolve_entries(
    entries: &[ScannedEntry],
    resolver: impl Fn(&ObjectId) -> Option<(ObjectType, Vec<u8>)>,
    mut progress: Option<ProgressCallback<'_>>,
    cancel: Option<&CancellationToken>,
) -> Result<Vec<(ObjectId, u64, ObjectType, Vec<u8>)>, PackError> {
    let mut resolved_by_offset: HashMap<u64, (ObjectType, Vec<u8>)> = HashMap::new();
    let mut offset_by_oid: HashMap<ObjectId, u64> = HashMap::new();
    let mut out = Vec::with_capacity(entries.len());

    for (i, entry) in entries.iter().enumerate() {
        if let Some(token) = cancel {
            if token.is_cancelled() {
                return Err(PackError::Cancelled);
            }
        }
        let (obj_type, data) = match entry.kind {
            PackEntryType::Commit | PackEntryType::Tree | PackEntryType::Blob | PackEntryType::Tag => {
                let obj_type = entry.kind.to_object_type().expect("non-delta type");
                (obj_type, entry.raw.clone())
            }
            PackEntryType::OfsDelta { base_offset } => {
                let (base_type, base_data) = resolved_by_offset
                    .get(&base_offset)
                    .ok_or(PackError::CorruptEntry(entry.offset))?;
                let data = crate::delta::apply::apply_delta(base_data, &entry.raw)?;
                (*base_type, data)
            }
            PackEntryType::RefDelta { base_oid } => {
                let (base_type, base_data) = if let Some(&off) = offset_by_oid.get(&base_oid) {
                    resolved_by_offset.get(&off).cloned().expect("indexed offset is resolved")
                } else if let Some(found) = resolver(&base_oid) {
                    found
                } else {
                    return Err(PackError::MissingBase(base_oid));
                };
                let data = crate::delta::apply::apply_delta(&base_data, &entry.raw)?;
                (base_type, data)
            }
        };

        let oid = Hasher::hash_object(
            HashAlgorithm::Sha1,
            std::str::from_utf8(obj_type.as_bytes()).unwrap(),
            &data,
        )
        .map_err(PackError::Hash)?;

        resolved_by_offset.insert(entry.offset, (obj_type, data.clone()));
        offset_by_oid.insert(oid, entry.offset);
        out.push((oid, entry.offset, obj_type, data));

        if let Some(cb) = progress.as_deref_mut() {
            cb(ProgressUpdate {
                stage: "indexing objects",
                done: (i + 1) as u64,
                total: Some(entries.len() as u64),
            });
        }
    }

    Ok(out)
}
