use std::fs;
use std::path::{Path, PathBuf};

use git_hash::ObjectId;

use crate::{LooseError, LooseObjectStore};

fn is_hex_name(name: &std::ffi::OsStr) -> bool {
    name.to_string_lossy().chars().all(|c| c.is_ascii_hexdigit())
}

/// A two-hex-digit fan-out directory under `.git/objects/` together with
/// its lowercased name, which prefixes every OID found inside it.
struct FanoutDir {
    path: PathBuf,
    prefix: String,
}

fn list_fanout_dirs(objects_dir: &Path) -> Result<Vec<FanoutDir>, LooseError> {
    let mut dirs = Vec::new();
    if !objects_dir.is_dir() {
        return Ok(dirs);
    }

    for entry in fs::read_dir(objects_dir)? {
        let entry = entry?;
        let name = entry.file_name();
        if name.len() == 2 && is_hex_name(&name) && entry.file_type()?.is_dir() {
            dirs.push(FanoutDir {
                prefix: name.to_string_lossy().to_lowercase(),
                path: entry.path(),
            });
        }
    }
    dirs.sort_by(|a, b| a.path.cmp(&b.path));
    Ok(dirs)
}

fn list_object_files(dir: &Path) -> Result<Vec<fs::DirEntry>, LooseError> {
    let mut entries = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        if entry.file_type()?.is_file() {
            entries.push(entry);
        }
    }
    entries.sort_by_key(|e| e.file_name());
    Ok(entries)
}

/// Yields every OID found under `.git/objects/`'s fan-out directories, in
/// directory-then-filename sorted order.
pub struct LooseObjectIter {
    dirs: Vec<FanoutDir>,
    dir_index: usize,
    current_entries: Vec<fs::DirEntry>,
    entry_index: usize,
    current_prefix: String,
}

impl LooseObjectIter {
    fn new(objects_dir: &Path) -> Result<Self, LooseError> {
        Ok(Self {
            dirs: list_fanout_dirs(objects_dir)?,
            dir_index: 0,
            current_entries: Vec::new(),
            entry_index: 0,
            current_prefix: String::new(),
        })
    }

    /// Load the next non-empty fan-out directory's entries. `false` once
    /// every directory has been exhausted.
    fn advance_dir(&mut self) -> Result<bool, LooseError> {
        while self.dir_index < self.dirs.len() {
            let dir = &self.dirs[self.dir_index];
            self.dir_index += 1;

            let entries = list_object_files(&dir.path)?;
            if !entries.is_empty() {
                self.current_prefix = dir.prefix.clone();
                self.current_entries = entries;
                self.entry_index = 0;
                return Ok(true);
            }
        }
        Ok(false)
    }
}

impl Iterator for LooseObjectIter {
    type Item = Result<ObjectId, LooseError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if self.entry_index < self.current_entries.len() {
                let entry = &self.current_entries[self.entry_index];
                self.entry_index += 1;

                let filename = entry.file_name();
                if !is_hex_name(&filename) {
                    continue; // temp files and the like don't belong here
                }

                let hex = format!("{}{}", self.current_prefix, filename.to_string_lossy());
                match ObjectId::from_hex(&hex) {
                    Ok(oid) => return Some(Ok(oid)),
                    Err(_) => continue,
                }
            }

            match self.advance_dir() {
                Ok(true) => continue,
                Ok(false) => return None,
                Err(e) => return Some(Err(e)),
            }
        }
    }
}

impl LooseObjectStore {
    pub fn iter(&self) -> Result<LooseObjectIter, LooseError> {
        LooseObjectIter::new(&self.objects_dir)
    }
}
