//! Tree diff engine: two-tree recursive merge and similarity-based rename/copy
//! detection.
//!
//! Given two tree ids, [`tree::tree_changes`] walks both trees in canonical
//! order and yields a flat [`Change`] list. [`rename::rename_detector`] then
//! transforms that list, pairing deletes with adds that carry similar content.

pub mod rename;
pub mod tree;

use bstr::BString;
use git_hash::ObjectId;
use git_object::FileMode;

/// A path, mode, and object id triple as it appears in a tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub path: BString,
    pub mode: FileMode,
    pub id: ObjectId,
}

/// The kind of change a [`Change`] represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Add,
    Delete,
    Modify,
    Unchanged,
    Rename,
    Copy,
}

/// A single tree-level change between an old and a new tree.
///
/// `old_entry` is `None` for `Add`; `new_entry` is `None` for `Delete`.
/// `Rename` and `Copy` carry both, with `similarity` set.
#[derive(Debug, Clone)]
pub struct Change {
    pub kind: ChangeKind,
    pub old_entry: Option<Entry>,
    pub new_entry: Option<Entry>,
    /// Content similarity in `[0.0, 1.0]`, set for `Rename` and `Copy`.
    pub similarity: Option<f64>,
}

impl Change {
    pub fn path(&self) -> &BString {
        self.new_entry
            .as_ref()
            .or(self.old_entry.as_ref())
            .map(|e| &e.path)
            .expect("Change must have at least one entry")
    }
}

/// Errors from tree diffing and rename detection.
#[derive(Debug, thiserror::Error)]
pub enum DiffError {
    #[error("failed to read object {oid}: {source}")]
    ObjectRead {
        oid: ObjectId,
        #[source]
        source: git_odb::OdbError,
    },

    #[error("object not found: {0}")]
    ObjectNotFound(ObjectId),

    #[error("expected {expected} object, got {actual} for {oid}")]
    UnexpectedObjectType {
        oid: ObjectId,
        expected: &'static str,
        actual: String,
    },

    #[error("operation cancelled")]
    Cancelled,
}
