//! Tree-to-tree diff.
//!
//! Walks two tree objects in parallel (sorted by git's tree entry order),
//! yielding a flat [`Change`] list. Recurses into nested trees; a directory
//! that disappears or appears on one side is expanded leaf-by-leaf so that
//! every emitted change refers to a blob or a gitlink, never a tree.

use bstr::BString;
use git_hash::ObjectId;
use git_object::{Object, Tree, TreeEntry};
use git_odb::ObjectDatabase;

use crate::{Change, ChangeKind, DiffError, Entry};

/// Diff two trees, producing a flat list of changes in canonical path order.
///
/// Either tree id may be `None` to represent an empty tree (e.g. the first
/// commit in a history). When `include_unchanged` is false (the common case),
/// entries identical on both sides are suppressed.
pub fn tree_changes(
    odb: &ObjectDatabase,
    old_id: Option<&ObjectId>,
    new_id: Option<&ObjectId>,
    include_unchanged: bool,
) -> Result<Vec<Change>, DiffError> {
    let old = match old_id {
        Some(id) => Some(read_tree(odb, id)?),
        None => None,
    };
    let new = match new_id {
        Some(id) => Some(read_tree(odb, id)?),
        None => None,
    };

    let old_entries = old.as_ref().map_or(&[][..], |t| &t.entries);
    let new_entries = new.as_ref().map_or(&[][..], |t| &t.entries);

    let mut changes = Vec::new();
    let prefix = BString::from("");
    merge_entries(
        odb,
        old_entries,
        new_entries,
        &prefix,
        include_unchanged,
        &mut changes,
    )?;
    Ok(changes)
}

fn read_tree(odb: &ObjectDatabase, id: &ObjectId) -> Result<Tree, DiffError> {
    let obj = odb
        .read(id)
        .map_err(|e| DiffError::ObjectRead { oid: *id, source: e })?
        .ok_or(DiffError::ObjectNotFound(*id))?;

    match obj {
        Object::Tree(tree) => Ok(tree),
        other => Err(DiffError::UnexpectedObjectType {
            oid: *id,
            expected: "tree",
            actual: other.object_type().to_string(),
        }),
    }
}

fn full_path(prefix: &BString, name: &BString) -> BString {
    if prefix.is_empty() {
        name.clone()
    } else {
        let mut p = prefix.clone();
        p.push(b'/');
        p.extend_from_slice(name);
        p
    }
}

fn to_entry(prefix: &BString, te: &TreeEntry) -> Entry {
    Entry {
        path: full_path(prefix, &te.name),
        mode: te.mode,
        id: te.oid,
    }
}

fn merge_entries(
    odb: &ObjectDatabase,
    old_entries: &[TreeEntry],
    new_entries: &[TreeEntry],
    prefix: &BString,
    include_unchanged: bool,
    changes: &mut Vec<Change>,
) -> Result<(), DiffError> {
    let mut oi = 0;
    let mut ni = 0;

    while oi < old_entries.len() || ni < new_entries.len() {
        match (old_entries.get(oi), new_entries.get(ni)) {
            (Some(old_entry), Some(new_entry)) => {
                match TreeEntry::cmp_entries(old_entry, new_entry) {
                    std::cmp::Ordering::Less => {
                        expand_delete(odb, old_entry, prefix, changes)?;
                        oi += 1;
                    }
                    std::cmp::Ordering::Greater => {
                        expand_add(odb, new_entry, prefix, changes)?;
                        ni += 1;
                    }
                    std::cmp::Ordering::Equal => {
                        merge_matched(
                            odb,
                            old_entry,
                            new_entry,
                            prefix,
                            include_unchanged,
                            changes,
                        )?;
                        oi += 1;
                        ni += 1;
                    }
                }
            }
            (Some(old_entry), None) => {
                expand_delete(odb, old_entry, prefix, changes)?;
                oi += 1;
            }
            (None, Some(new_entry)) => {
                expand_add(odb, new_entry, prefix, changes)?;
                ni += 1;
            }
            (None, None) => break,
        }
    }

    Ok(())
}

/// Expand a deleted tree entry, recursing into subtrees so every emitted
/// change is a leaf (blob or gitlink).
fn expand_delete(
    odb: &ObjectDatabase,
    entry: &TreeEntry,
    prefix: &BString,
    changes: &mut Vec<Change>,
) -> Result<(), DiffError> {
    if entry.mode.is_tree() {
        let tree = read_tree(odb, &entry.oid)?;
        let path = full_path(prefix, &entry.name);
        merge_entries(odb, &tree.entries, &[], &path, false, changes)?;
    } else {
        changes.push(Change {
            kind: ChangeKind::Delete,
            old_entry: Some(to_entry(prefix, entry)),
            new_entry: None,
            similarity: None,
        });
    }
    Ok(())
}

fn expand_add(
    odb: &ObjectDatabase,
    entry: &TreeEntry,
    prefix: &BString,
    changes: &mut Vec<Change>,
) -> Result<(), DiffError> {
    if entry.mode.is_tree() {
        let tree = read_tree(odb, &entry.oid)?;
        let path = full_path(prefix, &entry.name);
        merge_entries(odb, &[], &tree.entries, &path, false, changes)?;
    } else {
        changes.push(Change {
            kind: ChangeKind::Add,
            old_entry: None,
            new_entry: Some(to_entry(prefix, entry)),
            similarity: None,
        });
    }
    Ok(())
}

fn merge_matched(
    odb: &ObjectDatabase,
    old_entry: &TreeEntry,
    new_entry: &TreeEntry,
    prefix: &BString,
    include_unchanged: bool,
    changes: &mut Vec<Change>,
) -> Result<(), DiffError> {
    let old_is_tree = old_entry.mode.is_tree();
    let new_is_tree = new_entry.mode.is_tree();
    let path = full_path(prefix, &old_entry.name);

    match (old_is_tree, new_is_tree) {
        (true, true) => {
            if old_entry.oid == new_entry.oid {
                return Ok(());
            }
            let old_tree = read_tree(odb, &old_entry.oid)?;
            let new_tree = read_tree(odb, &new_entry.oid)?;
            merge_entries(
                odb,
                &old_tree.entries,
                &new_tree.entries,
                &path,
                include_unchanged,
                changes,
            )
        }
        (true, false) => {
            let old_tree = read_tree(odb, &old_entry.oid)?;
            merge_entries(odb, &old_tree.entries, &[], &path, false, changes)?;
            changes.push(Change {
                kind: ChangeKind::Add,
                old_entry: None,
                new_entry: Some(to_entry(prefix, new_entry)),
                similarity: None,
            });
            Ok(())
        }
        (false, true) => {
            changes.push(Change {
                kind: ChangeKind::Delete,
                old_entry: Some(to_entry(prefix, old_entry)),
                new_entry: None,
                similarity: None,
            });
            let new_tree = read_tree(odb, &new_entry.oid)?;
            merge_entries(odb, &[], &new_tree.entries, &path, false, changes)
        }
        (false, false) => {
            if old_entry.oid == new_entry.oid && old_entry.mode == new_entry.mode {
                if include_unchanged {
                    changes.push(Change {
                        kind: ChangeKind::Unchanged,
                        old_entry: Some(to_entry(prefix, old_entry)),
                        new_entry: Some(to_entry(prefix, new_entry)),
                        similarity: None,
                    });
                }
            } else {
                changes.push(Change {
                    kind: ChangeKind::Modify,
                    old_entry: Some(to_entry(prefix, old_entry)),
                    new_entry: Some(to_entry(prefix, new_entry)),
                    similarity: None,
                });
            }
            Ok(())
        }
    }
}

/// Read blob data from the ODB. Used by rename detection for similarity
/// scoring.
pub(crate) fn read_blob(odb: &ObjectDatabase, oid: &ObjectId) -> Result<Vec<u8>, DiffError> {
    let obj = odb
        .read(oid)
        .map_err(|e| DiffError::ObjectRead { oid: *oid, source: e })?
        .ok_or(DiffError::ObjectNotFound(*oid))?;

    match obj {
        Object::Blob(blob) => Ok(blob.data.to_vec()),
        other => Err(DiffError::UnexpectedObjectType {
            oid: *oid,
            expected: "blob",
            actual: other.object_type().to_string(),
        }),
    }
}
