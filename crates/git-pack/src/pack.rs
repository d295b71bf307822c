//! PackFile: reading .pack files.
//!
//! A pack file contains a header, a sequence of compressed objects
//! (possibly deltified), and a trailing checksum.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use flate2::bufread::ZlibDecoder;
use git_hash::{HashAlgorithm, ObjectId};
use git_object::ObjectType;
use memmap2::Mmap;
use std::io::Read;

use crate::base_cache::{PackBaseCache, DEFAULT_BYTE_BUDGET};
use crate::entry::{parse_entry_header, PackEntry};
use crate::index::PackIndex;
use crate::{
    PackEntryType, PackError, PackedObject, PACK_HEADER_SIZE, PACK_SIGNATURE, PACK_SUPPORTED_VERSIONS,
    PACK_VERSION, MAX_DELTA_CHAIN_DEPTH, MAX_REF_DELTA_DEPTH,
};

/// A memory-mapped packfile with its index.
pub struct PackFile {
    data: Mmap,
    index: PackIndex,
    pack_path: PathBuf,
    num_objects: u32,
    hash_algo: HashAlgorithm,
    base_cache: Mutex<PackBaseCache>,
}

impl PackFile {
    /// Open a pack file and its associated index, with the default 64 MiB
    /// base cache budget.
    pub fn open(pack_path: impl AsRef<Path>) -> Result<Self, PackError> {
        Self::open_with_cache_budget(pack_path, DEFAULT_BYTE_BUDGET)
    }

    /// Open a pack file and its associated index, sizing the delta-base
    /// cache to the given byte budget.
    pub fn open_with_cache_budget(
        pack_path: impl AsRef<Path>,
        cache_byte_budget: usize,
    ) -> Result<Self, PackError> {
        let pack_path = pack_path.as_ref().to_path_buf();

        // Derive .idx path from .pack path
        let idx_path = pack_path.with_extension("idx");

        let file = std::fs::File::open(&pack_path)?;
        let data = unsafe { Mmap::map(&file)? };

        // Validate pack header
        if data.len() < PACK_HEADER_SIZE {
            return Err(PackError::InvalidHeader("file too small".into()));
        }
        if &data[0..4] != PACK_SIGNATURE {
            return Err(PackError::InvalidHeader("bad PACK signature".into()));
        }
        let version = u32::from_be_bytes([data[4], data[5], data[6], data[7]]);
        if !PACK_SUPPORTED_VERSIONS.contains(&version) {
            return Err(PackError::UnsupportedVersion(version));
        }
        let num_objects = u32::from_be_bytes([data[8], data[9], data[10], data[11]]);

        let index = PackIndex::open(&idx_path)?;

        // Validate object count matches between pack and index
        if index.num_objects() != num_objects {
            return Err(PackError::InvalidHeader(format!(
                "pack has {} objects but index has {}",
                num_objects,
                index.num_objects()
            )));
        }

        Ok(Self {
            data,
            index,
            pack_path,
            num_objects,
            hash_algo: HashAlgorithm::Sha1,
            base_cache: Mutex::new(PackBaseCache::new(cache_byte_budget)),
        })
    }

    /// Read an object by OID.
    ///
    /// Returns `None` if the OID is not in this pack.
    pub fn read_object(&self, oid: &ObjectId) -> Result<Option<PackedObject>, PackError> {
        match self.index.lookup(oid) {
            Some(offset) => self.read_at_offset(offset).map(Some),
            None => Ok(None),
        }
    }

    /// Read an object at a known offset in the pack.
    ///
    /// Resolves delta chains iteratively (not recursively) to handle
    /// arbitrary chain depths safely.
    pub fn read_at_offset(&self, offset: u64) -> Result<PackedObject, PackError> {
        self.read_at_offset_with_resolver(offset, |_| None)
    }

    /// Read an object by OID, with an external resolver for cross-pack REF_DELTA bases.
    ///
    /// The resolver is called when a REF_DELTA references a base OID not found in this pack.
    /// It should return the resolved base object's type and data if found externally.
    pub fn read_object_with_resolver(
        &self,
        oid: &ObjectId,
        resolver: impl Fn(&ObjectId) -> Option<(ObjectType, Vec<u8>)>,
    ) -> Result<Option<PackedObject>, PackError> {
        match self.index.lookup(oid) {
            Some(offset) => self.read_at_offset_with_resolver(offset, resolver).map(Some),
            None => Ok(None),
        }
    }

    /// Read an object at a known offset, with an external resolver for cross-pack REF_DELTA bases.
    ///
    /// Walks the delta chain backward (innermost delta first), consulting
    /// the base cache at every hop before decompressing, then applies the
    /// collected deltas forward over the resolved base. Iterative, so a
    /// pathologically long chain cannot overflow the call stack.
    fn read_at_offset_with_resolver(
        &self,
        offset: u64,
        resolver: impl Fn(&ObjectId) -> Option<(ObjectType, Vec<u8>)>,
    ) -> Result<PackedObject, PackError> {
        if let Some((obj_type, data)) = self.base_cache.lock().unwrap().get(offset) {
            return Ok(PackedObject { obj_type, data });
        }

        let mut chain: Vec<(PackEntry, Vec<u8>)> = Vec::new();
        let mut current_offset = offset;
        let mut ref_delta_depth = 0usize;

        for depth in 0..MAX_DELTA_CHAIN_DEPTH {
            if current_offset != offset {
                if let Some((obj_type, base_data)) =
                    self.base_cache.lock().unwrap().get(current_offset)
                {
                    let mut data = base_data;
                    for (_, delta_data) in chain.iter().rev() {
                        data = crate::delta::apply::apply_delta(&data, delta_data)?;
                    }
                    self.base_cache
                        .lock()
                        .unwrap()
                        .insert(offset, (obj_type, data.clone()));
                    return Ok(PackedObject { obj_type, data });
                }
            }

            let entry = parse_entry_header(
                &self.data[current_offset as usize..],
                current_offset,
            )?;

            // Decompress the data
            let compressed = &self.data[entry.data_offset as usize..];
            let decompressed = decompress(compressed, entry.uncompressed_size, current_offset)?;

            match entry.entry_type {
                PackEntryType::Commit
                | PackEntryType::Tree
                | PackEntryType::Blob
                | PackEntryType::Tag => {
                    // Base object — resolve chain
                    let obj_type = entry
                        .entry_type
                        .to_object_type()
                        .expect("non-delta type");

                    self.base_cache
                        .lock()
                        .unwrap()
                        .insert(current_offset, (obj_type, decompressed.clone()));

                    // Apply delta chain in reverse order
                    let mut data = decompressed;
                    for (_, delta_data) in chain.iter().rev() {
                        data = crate::delta::apply::apply_delta(&data, delta_data)?;
                    }

                    self.base_cache
                        .lock()
                        .unwrap()
                        .insert(offset, (obj_type, data.clone()));

                    return Ok(PackedObject {
                        obj_type,
                        data,
                    });
                }
                PackEntryType::OfsDelta { base_offset } => {
                    chain.push((entry, decompressed));
                    current_offset = base_offset;
                }
                PackEntryType::RefDelta { base_oid } => {
                    ref_delta_depth += 1;
                    if ref_delta_depth > MAX_REF_DELTA_DEPTH {
                        return Err(PackError::DeltaChainTooDeep {
                            offset,
                            max_depth: MAX_REF_DELTA_DEPTH,
                        });
                    }
                    chain.push((entry, decompressed));
                    // Try the index within this pack first
                    if let Some(base_offset) = self.index.lookup(&base_oid) {
                        current_offset = base_offset;
                    } else if let Some((obj_type, base_data)) = resolver(&base_oid) {
                        // External resolver found the base — apply delta chain
                        let mut data = base_data;
                        for (_, delta_data) in chain.iter().rev() {
                            data = crate::delta::apply::apply_delta(&data, delta_data)?;
                        }
                        self.base_cache
                            .lock()
                            .unwrap()
                            .insert(offset, (obj_type, data.clone()));
                        return Ok(PackedObject { obj_type, data });
                    } else {
                        return Err(PackError::MissingBase(base_oid));
                    }
                }
            }

            if depth + 1 >= MAX_DELTA_CHAIN_DEPTH {
                return Err(PackError::DeltaChainTooDeep {
                    offset,
                    max_depth: MAX_DELTA_CHAIN_DEPTH,
                });
            }
        }

        Err(PackError::DeltaChainTooDeep {
            offset,
            max_depth: MAX_DELTA_CHAIN_DEPTH,
        })
    }

    /// Check if this pack contains the given OID.
    pub fn contains(&self, oid: &ObjectId) -> bool {
        self.index.lookup(oid).is_some()
    }

    /// Get the number of objects in this pack.
    pub fn num_objects(&self) -> u32 {
        self.num_objects
    }

    /// Get the pack index.
    pub fn index(&self) -> &PackIndex {
        &self.index
    }

    /// Get the path to the .pack file.
    pub fn path(&self) -> &Path {
        &self.pack_path
    }

    /// Get the raw memory-mapped pack data.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Get the hash algorithm used by this pack.
    pub fn hash_algo(&self) -> HashAlgorithm {
        self.hash_algo
    }
}

/// Decompress zlib data with an expected uncompressed size.
fn decompress(compressed: &[u8], expected_size: usize, offset: u64) -> Result<Vec<u8>, PackError> {
    let mut decoder = ZlibDecoder::new(compressed);
    let mut buf = Vec::with_capacity(expected_size);
    decoder.read_to_end(&mut buf).map_err(|_| {
        PackError::CorruptEntry(offset)
    })?;
    Ok(buf)
}
