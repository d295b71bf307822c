use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use bstr::ByteSlice;
use git_hash::ObjectId;
use git_utils::lockfile::LockFile;

use crate::error::RefError;
use crate::name::RefName;

fn io_path<T>(path: &Path, result: std::io::Result<T>) -> Result<T, RefError> {
    result.map_err(|e| RefError::IoPath {
        path: path.to_path_buf(),
        source: e,
    })
}

/// A single entry in the packed-refs file.
#[derive(Debug, Clone)]
pub struct PackedRef {
    pub name: RefName,
    pub oid: ObjectId,
    pub peeled: Option<ObjectId>,
}

/// Parsed packed-refs file.
///
/// The packed-refs file contains refs that have been "packed" from loose files
/// into a single file for efficiency. Format:
/// ```text
/// # pack-refs with: peeled fully-peeled sorted
/// <hex-oid> <refname>
/// ^<hex-oid>   (peeled value of annotated tag above)
/// ```
#[derive(Debug, Clone)]
pub struct PackedRefs {
    pub(crate) refs: Vec<PackedRef>,
    pub(crate) sorted: bool,
}

impl PackedRefs {
    /// Parse a packed-refs file.
    pub fn parse(data: &[u8]) -> Result<Self, RefError> {
        let mut refs: Vec<PackedRef> = Vec::new();
        let mut sorted = false;

        for line in data.lines() {
            if line.is_empty() {
                continue;
            } else if line.starts_with(b"#") {
                sorted |= line.find(b"sorted").is_some();
            } else if let Some(peeled_hex) = line.strip_prefix(b"^") {
                let hex = std::str::from_utf8(peeled_hex)
                    .map_err(|_| RefError::Parse("invalid UTF-8 in peeled OID".into()))?;
                if let Some(pr) = refs.last_mut() {
                    pr.peeled = Some(ObjectId::from_hex(hex.trim())?);
                }
            } else {
                refs.push(parse_ref_line(line)?);
            }
        }

        Ok(Self { refs, sorted })
    }

    /// Load packed-refs from disk. Returns empty if file doesn't exist.
    pub fn load(git_dir: &Path) -> Result<Self, RefError> {
        let path = packed_refs_path(git_dir);
        if !path.exists() {
            return Ok(Self {
                refs: Vec::new(),
                sorted: true,
            });
        }
        Self::parse(&io_path(&path, fs::read(&path))?)
    }

    /// Look up a ref by name using binary search (if sorted) or linear scan.
    pub fn find(&self, name: &RefName) -> Option<&PackedRef> {
        if self.sorted {
            self.refs
                .binary_search_by(|pr| pr.name.cmp(name))
                .ok()
                .map(|idx| &self.refs[idx])
        } else {
            self.refs.iter().find(|pr| pr.name == *name)
        }
    }

    /// Write the packed-refs file atomically using a lock file.
    pub fn write(&self, git_dir: &Path) -> Result<(), RefError> {
        let path = packed_refs_path(git_dir);
        let mut lock = LockFile::acquire(&path)?;

        io_path(&path, lock.write_all(b"# pack-refs with: peeled fully-peeled sorted \n"))?;

        // Refs must stay sorted on disk so `find` can binary-search them.
        let mut sorted_refs = self.refs.clone();
        sorted_refs.sort_by(|a, b| a.name.cmp(&b.name));

        for pr in &sorted_refs {
            io_path(&path, lock.write_all(format!("{} {}\n", pr.oid.to_hex(), pr.name).as_bytes()))?;
            if let Some(peeled) = &pr.peeled {
                io_path(&path, lock.write_all(format!("^{}\n", peeled.to_hex()).as_bytes()))?;
            }
        }

        lock.commit()?;
        Ok(())
    }

    /// Add or update a ref in the packed-refs.
    pub fn upsert(&mut self, name: RefName, oid: ObjectId, peeled: Option<ObjectId>) {
        if let Some(existing) = self.refs.iter_mut().find(|pr| pr.name == name) {
            existing.oid = oid;
            existing.peeled = peeled;
        } else {
            self.refs.push(PackedRef {
                name,
                oid,
                peeled,
            });
            // Re-sort for binary search
            self.refs.sort_by(|a, b| a.name.cmp(&b.name));
            self.sorted = true;
        }
    }

    /// Remove a ref from packed-refs.
    pub fn remove(&mut self, name: &RefName) -> bool {
        let len_before = self.refs.len();
        self.refs.retain(|pr| pr.name != *name);
        self.refs.len() < len_before
    }

    /// Get all refs.
    pub fn refs(&self) -> &[PackedRef] {
        &self.refs
    }

    /// Check if empty.
    pub fn is_empty(&self) -> bool {
        self.refs.is_empty()
    }
}

/// Parse one non-comment, non-peeled packed-refs line: `<hex-oid> <refname>`.
fn parse_ref_line(line: &[u8]) -> Result<PackedRef, RefError> {
    let space_pos = line
        .find_byte(b' ')
        .ok_or_else(|| RefError::Parse("invalid packed-refs line".into()))?;

    let hex = std::str::from_utf8(&line[..space_pos])
        .map_err(|_| RefError::Parse("invalid UTF-8 in packed-refs OID".into()))?;
    let oid = ObjectId::from_hex(hex)?;

    let name_str = std::str::from_utf8(&line[space_pos + 1..])
        .map_err(|_| RefError::Parse("invalid UTF-8 in packed-refs name".into()))?;
    let name = RefName::new(name_str.trim())?;

    Ok(PackedRef {
        name,
        oid,
        peeled: None,
    })
}

/// Get the path to the packed-refs file.
fn packed_refs_path(git_dir: &Path) -> PathBuf {
    git_dir.join("packed-refs")
}
