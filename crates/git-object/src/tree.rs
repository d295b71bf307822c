use std::cmp::Ordering;

use bstr::{BStr, BString, ByteSlice};
use git_hash::ObjectId;

use crate::{ObjectError, Strictness};

/// File mode for tree entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileMode {
    /// Regular file (100644)
    Regular,
    /// Executable file (100755)
    Executable,
    /// Symbolic link (120000)
    Symlink,
    /// Git submodule link (160000)
    Gitlink,
    /// Subdirectory (040000)
    Tree,
    /// Unknown mode (preserved for round-trip)
    Unknown(u32),
}

impl FileMode {
    /// Parse from octal ASCII bytes (e.g., `b"100644"`), rejecting a leading zero.
    pub fn from_bytes(s: &[u8]) -> Result<Self, ObjectError> {
        Self::from_bytes_with_strictness(s, Strictness::Strict)
    }

    /// Parse from octal ASCII bytes. In non-strict mode, a single extra leading
    /// `0` is tolerated (some older tools zero-pad tree modes to a fixed width).
    pub fn from_bytes_with_strictness(
        s: &[u8],
        strictness: Strictness,
    ) -> Result<Self, ObjectError> {
        if strictness == Strictness::Strict && s.len() > 1 && s[0] == b'0' {
            return Err(ObjectError::InvalidFileMode(format!(
                "leading zero not allowed: {}",
                String::from_utf8_lossy(s)
            )));
        }
        let raw = parse_octal(s)
            .ok_or_else(|| ObjectError::InvalidFileMode(String::from_utf8_lossy(s).into()))?;
        Ok(Self::from_raw(raw))
    }

    /// Create from the raw numeric value.
    pub fn from_raw(raw: u32) -> Self {
        match raw {
            0o100644 => Self::Regular,
            0o100755 => Self::Executable,
            0o120000 => Self::Symlink,
            0o160000 => Self::Gitlink,
            0o040000 => Self::Tree,
            other => Self::Unknown(other),
        }
    }

    /// Serialize to octal ASCII bytes (git's canonical format, no leading zeros for trees).
    pub fn as_bytes(&self) -> BString {
        BString::from(format!("{:o}", self.raw()))
    }

    /// Get the raw numeric value.
    pub fn raw(&self) -> u32 {
        match self {
            Self::Regular => 0o100644,
            Self::Executable => 0o100755,
            Self::Symlink => 0o120000,
            Self::Gitlink => 0o160000,
            Self::Tree => 0o40000,
            Self::Unknown(v) => *v,
        }
    }

    /// Is this a tree (directory) entry?
    pub fn is_tree(&self) -> bool {
        matches!(self, Self::Tree)
    }

    /// Is this a blob (file) entry?
    pub fn is_blob(&self) -> bool {
        matches!(self, Self::Regular | Self::Executable)
    }

    /// Is this a symlink?
    pub fn is_symlink(&self) -> bool {
        matches!(self, Self::Symlink)
    }

    /// Is this a gitlink (submodule)?
    pub fn is_gitlink(&self) -> bool {
        matches!(self, Self::Gitlink)
    }
}

/// Parse an octal ASCII string to u32.
fn parse_octal(s: &[u8]) -> Option<u32> {
    if s.is_empty() {
        return None;
    }
    let mut val: u32 = 0;
    for &b in s {
        if !(b'0'..=b'7').contains(&b) {
            return None;
        }
        val = val.checked_mul(8)?.checked_add(u32::from(b - b'0'))?;
    }
    Some(val)
}

/// A single entry in a git tree object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeEntry {
    pub mode: FileMode,
    pub name: BString,
    pub oid: ObjectId,
}

impl TreeEntry {
    /// Compare entries using git's tree sorting rules.
    ///
    /// Directories sort as if they have a trailing '/'. This means
    /// "foo" (dir) sorts before "foo.c" but after "foo-bar".
    pub fn cmp_entries(a: &TreeEntry, b: &TreeEntry) -> Ordering {
        base_name_compare(
            a.name.as_ref(),
            a.mode.is_tree(),
            b.name.as_ref(),
            b.mode.is_tree(),
        )
    }
}

impl PartialOrd for TreeEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for TreeEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        Self::cmp_entries(self, other)
    }
}

/// Git's tree entry name comparison.
///
/// Faithfully implements C git's `base_name_compare`: after the common prefix,
/// directory names get an implicit trailing '/' for comparison.
fn base_name_compare(name1: &[u8], is_dir1: bool, name2: &[u8], is_dir2: bool) -> Ordering {
    let min_len = name1.len().min(name2.len());
    let cmp = name1[..min_len].cmp(&name2[..min_len]);
    if cmp != Ordering::Equal {
        return cmp;
    }
    // One name is a prefix of the other (or they're equal length).
    // Get the "next character" for each — null if at end, but '/' if it's a directory.
    let c1 = if name1.len() > min_len {
        name1[min_len]
    } else if is_dir1 {
        b'/'
    } else {
        0
    };
    let c2 = if name2.len() > min_len {
        name2[min_len]
    } else if is_dir2 {
        b'/'
    } else {
        0
    };
    c1.cmp(&c2)
}

/// A git tree object — a directory listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tree {
    pub entries: Vec<TreeEntry>,
}

impl Tree {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Parse tree content from binary format, enforcing canonical sort order.
    ///
    /// Each entry is: `<mode-ascii> <name>\0<oid-bytes>`
    pub fn parse(content: &[u8]) -> Result<Self, ObjectError> {
        Self::parse_with_strictness(content, Strictness::Strict)
    }

    /// Parse tree content, applying `strictness` to mode formatting and entry order.
    ///
    /// In strict mode a zero-padded mode or an entry out of canonical order (or
    /// duplicated) is rejected. Non-strict mode accepts a single leading zero on
    /// the mode and does not require entries to already be sorted, for reading
    /// trees written by older tooling; it still rejects duplicate names and any
    /// structurally malformed entry.
    pub fn parse_with_strictness(
        content: &[u8],
        strictness: Strictness,
    ) -> Result<Self, ObjectError> {
        let mut entries = Vec::new();
        let mut seen_names = std::collections::HashSet::new();
        let mut pos = 0;

        while pos < content.len() {
            let space_pos = content[pos..]
                .iter()
                .position(|&b| b == b' ')
                .ok_or_else(|| ObjectError::InvalidTreeEntry {
                    offset: pos,
                    reason: "missing space after mode".into(),
                })?
                + pos;

            let mode = FileMode::from_bytes_with_strictness(&content[pos..space_pos], strictness)
                .map_err(|_| ObjectError::InvalidTreeEntry {
                    offset: pos,
                    reason: "invalid mode".into(),
                })?;

            let name_start = space_pos + 1;
            let null_pos = content[name_start..]
                .iter()
                .position(|&b| b == 0)
                .ok_or_else(|| ObjectError::InvalidTreeEntry {
                    offset: name_start,
                    reason: "missing null after name".into(),
                })?
                + name_start;

            let name = BString::from(&content[name_start..null_pos]);
            if name.is_empty() {
                return Err(ObjectError::InvalidTreeEntry {
                    offset: name_start,
                    reason: "empty entry name".into(),
                });
            }

            let oid_start = null_pos + 1;
            let oid_len = git_hash::OID_LEN;
            if oid_start + oid_len > content.len() {
                return Err(ObjectError::InvalidTreeEntry {
                    offset: oid_start,
                    reason: "truncated OID".into(),
                });
            }

            let oid = ObjectId::from_bytes(&content[oid_start..oid_start + oid_len])?;

            if !seen_names.insert(name.clone()) {
                return Err(ObjectError::InvalidTreeEntry {
                    offset: pos,
                    reason: "duplicate entry name".into(),
                });
            }
            if strictness == Strictness::Strict {
                if let Some(prev) = entries.last() {
                    let candidate = TreeEntry {
                        mode,
                        name: name.clone(),
                        oid,
                    };
                    if TreeEntry::cmp_entries(prev, &candidate) != Ordering::Less {
                        return Err(ObjectError::InvalidTreeEntry {
                            offset: pos,
                            reason: "entries out of canonical order".into(),
                        });
                    }
                }
            }

            entries.push(TreeEntry { mode, name, oid });
            pos = oid_start + oid_len;
        }

        Ok(Self { entries })
    }

    /// Serialize tree content to binary format.
    ///
    /// Entries are written in git canonical sort order.
    pub fn serialize_content(&self) -> Vec<u8> {
        let mut sorted = self.entries.clone();
        sorted.sort();

        let mut out = Vec::new();
        for entry in &sorted {
            out.extend_from_slice(&entry.mode.as_bytes());
            out.push(b' ');
            out.extend_from_slice(&entry.name);
            out.push(0);
            out.extend_from_slice(entry.oid.as_bytes());
        }
        out
    }

    /// Sort entries in git canonical order.
    pub fn sort(&mut self) {
        self.entries.sort();
    }

    /// Lookup an entry by name.
    pub fn find(&self, name: &BStr) -> Option<&TreeEntry> {
        self.entries.iter().find(|e| e.name.as_bstr() == name)
    }

    /// Iterate entries.
    pub fn iter(&self) -> impl Iterator<Item = &TreeEntry> {
        self.entries.iter()
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the tree is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for Tree {
    fn default() -> Self {
        Self::new()
    }
}
