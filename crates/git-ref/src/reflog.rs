use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use bstr::{BStr, BString, ByteSlice, ByteVec};
use git_hash::ObjectId;
use git_utils::date::Signature;

use crate::error::RefError;
use crate::name::RefName;

/// Wrap an I/O result with the path that caused it.
fn io_path<T>(path: &Path, result: std::io::Result<T>) -> Result<T, RefError> {
    result.map_err(|e| RefError::IoPath {
        path: path.to_path_buf(),
        source: e,
    })
}

/// Read every non-empty line of a reflog file, oldest first. Empty vec if
/// the file doesn't exist.
fn read_entries(path: &Path) -> Result<Vec<ReflogEntry>, RefError> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    let contents = io_path(path, fs::read(path))?;
    contents
        .lines()
        .filter(|line| !line.is_empty())
        .map(|line| ReflogEntry::parse(line.as_bstr()))
        .collect()
}

/// Rewrite a reflog file from a full set of entries, oldest first.
fn write_entries(path: &Path, entries: &[ReflogEntry]) -> Result<(), RefError> {
    let mut output = Vec::new();
    for entry in entries {
        output.extend_from_slice(&entry.to_bytes());
        output.push(b'\n');
    }
    io_path(path, fs::write(path, &output))
}

/// A single reflog entry recording a ref value change.
///
/// Format: `<old-oid> <new-oid> <name> <<email>> <timestamp> <tz>\t<message>\n`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReflogEntry {
    pub old_oid: ObjectId,
    pub new_oid: ObjectId,
    pub identity: Signature,
    pub message: BString,
}

impl ReflogEntry {
    /// Parse a reflog entry from a single line.
    ///
    /// Format: `<old-hex> <new-hex> <identity> <timestamp> <tz>\t<message>`
    pub fn parse(line: &BStr) -> Result<Self, RefError> {
        let line = line.as_bytes();

        // 40+1+40+1 = 82 bytes minimum for two SHA-1 hex OIDs and their
        // separating spaces.
        if line.len() < 82 {
            return Err(RefError::Parse(format!(
                "reflog line too short: {} bytes",
                line.len()
            )));
        }

        let parse_oid_field = |bytes: &[u8], which: &str| -> Result<ObjectId, RefError> {
            let hex = std::str::from_utf8(bytes)
                .map_err(|_| RefError::Parse(format!("invalid UTF-8 in {} OID", which)))?;
            Ok(ObjectId::from_hex(hex)?)
        };

        let old_oid = parse_oid_field(&line[..40], "old")?;
        if line[40] != b' ' {
            return Err(RefError::Parse("expected space after old OID".into()));
        }

        let new_oid = parse_oid_field(&line[41..81], "new")?;
        if line[81] != b' ' {
            return Err(RefError::Parse("expected space after new OID".into()));
        }

        // Rest is: identity \t message
        let rest = &line[82..];

        // Split on tab to separate identity from message
        let (identity_part, message) = if let Some(tab_pos) = rest.find_byte(b'\t') {
            (&rest[..tab_pos], &rest[tab_pos + 1..])
        } else {
            (rest, &b""[..])
        };

        // Parse identity (name <email> timestamp tz)
        let identity = Signature::parse(identity_part.as_bstr()).map_err(|e| {
            RefError::Parse(format!("invalid identity in reflog: {}", e))
        })?;

        // Trim trailing newline from message if present
        let message = if message.ends_with(b"\n") {
            &message[..message.len() - 1]
        } else {
            message
        };

        Ok(Self {
            old_oid,
            new_oid,
            identity,
            message: BString::from(message),
        })
    }

    /// Serialize to reflog line format (without trailing newline).
    pub fn to_bytes(&self) -> BString {
        let mut out = BString::new(Vec::with_capacity(256));
        out.push_str(self.old_oid.to_hex().as_bytes());
        out.push(b' ');
        out.push_str(self.new_oid.to_hex().as_bytes());
        out.push(b' ');
        out.push_str(self.identity.to_bytes());
        out.push(b'\t');
        out.push_str(&self.message);
        out
    }
}

/// Get the reflog file path for a given ref name.
pub fn reflog_path(git_dir: &Path, name: &RefName) -> PathBuf {
    git_dir.join("logs").join(name.as_str())
}

/// Read all reflog entries for a ref, newest first.
pub fn read_reflog(git_dir: &Path, name: &RefName) -> Result<Vec<ReflogEntry>, RefError> {
    let mut entries = read_entries(&reflog_path(git_dir, name))?;
    entries.reverse();
    Ok(entries)
}

/// Append a reflog entry for a ref.
pub fn append_reflog_entry(
    git_dir: &Path,
    name: &RefName,
    entry: &ReflogEntry,
) -> Result<(), RefError> {
    let path = reflog_path(git_dir, name);

    if let Some(parent) = path.parent() {
        io_path(parent, fs::create_dir_all(parent))?;
    }

    let mut line = entry.to_bytes();
    line.push(b'\n');

    let mut file = io_path(
        &path,
        fs::OpenOptions::new().create(true).append(true).open(&path),
    )?;
    io_path(&path, file.write_all(&line))
}

/// Resolve `@{N}` — get the Nth previous value from the reflog.
/// N=0 is the current value, N=1 is the previous value, etc.
pub fn resolve_at_n(
    git_dir: &Path,
    name: &RefName,
    n: usize,
) -> Result<Option<ObjectId>, RefError> {
    let entries = read_reflog(git_dir, name)?;
    // entries is newest-first, so index 0 = most recent
    if n < entries.len() {
        Ok(Some(entries[n].new_oid))
    } else {
        Ok(None)
    }
}

/// Resolve `@{date}` — find the ref value at a given timestamp.
pub fn resolve_at_date(
    git_dir: &Path,
    name: &RefName,
    timestamp: i64,
) -> Result<Option<ObjectId>, RefError> {
    let entries = read_entries(&reflog_path(git_dir, name))?;

    // Entries are oldest-first; take the last one at or before the target.
    let mut result = None;
    for entry in &entries {
        if entry.identity.date.timestamp > timestamp {
            break;
        }
        result = Some(entry.new_oid);
    }
    Ok(result)
}

/// Expire old reflog entries for a ref.
/// Removes entries whose timestamp is older than `expire_time`.
/// Always keeps the most recent (tip) entry.
pub fn expire_reflog(
    git_dir: &Path,
    name: &RefName,
    expire_timestamp: i64,
) -> Result<usize, RefError> {
    let path = reflog_path(git_dir, name);
    let entries = read_entries(&path)?;
    if entries.is_empty() {
        return Ok(0);
    }

    let total = entries.len();
    let mut removed = 0usize;
    let kept: Vec<ReflogEntry> = entries
        .into_iter()
        .enumerate()
        .filter(|(i, entry)| {
            // Always keep the most recent entry (last in file = newest).
            let keep = *i == total - 1 || entry.identity.date.timestamp >= expire_timestamp;
            if !keep {
                removed += 1;
            }
            keep
        })
        .map(|(_, entry)| entry)
        .collect();

    write_entries(&path, &kept)?;
    Ok(removed)
}

/// Delete a specific reflog entry by index (0 = most recent).
pub fn delete_reflog_entry(
    git_dir: &Path,
    name: &RefName,
    index: usize,
) -> Result<(), RefError> {
    let path = reflog_path(git_dir, name);
    if !path.exists() {
        return Err(RefError::NotFound(name.as_str().to_string()));
    }

    let not_found = || RefError::NotFound(format!("{}@{{{}}}", name.as_str(), index));

    let mut entries = read_entries(&path)?;
    if entries.is_empty() {
        return Err(not_found());
    }

    // Index 0 = most recent = last in file.
    let file_index = entries.len().checked_sub(1 + index).ok_or_else(not_found)?;
    entries.remove(file_index);

    write_entries(&path, &entries)
}
