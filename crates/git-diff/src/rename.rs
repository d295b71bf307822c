//! Similarity-based rename and copy detection.
//!
//! A post-pass over a [`Change`] list: pairs `Delete`s with `Add`s whose
//! content is similar enough, turning them into `Rename`s, and optionally
//! matches remaining `Add`s against `Unchanged` files to produce `Copy`s.

use std::collections::HashMap;

use git_odb::ObjectDatabase;
use git_utils::progress::{ProgressCallback, ProgressUpdate};
use git_utils::CancellationToken;

use crate::tree::read_blob;
use crate::{Change, ChangeKind, DiffError};

/// Block size used for content chunking (bytes).
const BLOCK_SIZE: usize = 64;

/// Default cap on the Delete x Add candidate matrix, guarding against
/// quadratic blowup on very large diffs.
const DEFAULT_MAX_FILES: usize = 1000;

/// Chunk `data` into blocks, flushing on `BLOCK_SIZE` bytes or a line feed,
/// and accumulate a multiset of block-hash -> total byte length.
fn block_hash_counts(data: &[u8]) -> HashMap<u32, usize> {
    let mut counts = HashMap::new();
    let mut block = Vec::with_capacity(BLOCK_SIZE);

    for &byte in data {
        block.push(byte);
        if block.len() == BLOCK_SIZE || byte == b'\n' {
            *counts.entry(crc32fast::hash(&block)).or_insert(0) += block.len();
            block.clear();
        }
    }
    if !block.is_empty() {
        *counts.entry(crc32fast::hash(&block)).or_insert(0) += block.len();
    }

    counts
}

/// Dice-coefficient content similarity in `[0.0, 1.0]`.
///
/// Two empty inputs are maximally similar; one empty and one non-empty are
/// maximally dissimilar.
pub fn similarity(old: &[u8], new: &[u8]) -> f64 {
    if old.is_empty() && new.is_empty() {
        return 1.0;
    }
    if old.is_empty() || new.is_empty() {
        return 0.0;
    }

    let old_counts = block_hash_counts(old);
    let new_counts = block_hash_counts(new);

    let shared: usize = old_counts
        .iter()
        .filter_map(|(hash, &count)| new_counts.get(hash).map(|&other| count.min(other)))
        .sum();

    2.0 * shared as f64 / (old.len() + new.len()) as f64
}

/// Transform a change list by matching `Delete`s with `Add`s.
///
/// `threshold` is a similarity fraction in `[0.0, 1.0]` (git's traditional
/// default is 0.50). When `find_copies` is set, remaining `Add`s are also
/// matched against `Unchanged` entries to detect copies; the copy source is
/// left untouched. `max_files` bounds the Delete x Add candidate matrix; if
/// exceeded, rename detection is skipped entirely and the list is returned
/// unmodified.
pub fn rename_detector(
    odb: &ObjectDatabase,
    changes: Vec<Change>,
    threshold: f64,
    find_copies: bool,
    max_files: Option<usize>,
) -> Result<Vec<Change>, DiffError> {
    rename_detector_with_progress(odb, changes, threshold, find_copies, max_files, None, None)
}

/// Full form of [`rename_detector`] accepting an optional progress callback
/// (reported per candidate pair during the fuzzy-matching phase) and an
/// optional cancellation token (checked at the same boundary).
pub fn rename_detector_with_progress(
    odb: &ObjectDatabase,
    changes: Vec<Change>,
    threshold: f64,
    find_copies: bool,
    max_files: Option<usize>,
    mut progress: Option<ProgressCallback<'_>>,
    cancel: Option<&CancellationToken>,
) -> Result<Vec<Change>, DiffError> {
    let max_files = max_files.unwrap_or(DEFAULT_MAX_FILES);

    let delete_idx: Vec<usize> = changes
        .iter()
        .enumerate()
        .filter(|(_, c)| c.kind == ChangeKind::Delete)
        .map(|(i, _)| i)
        .collect();
    let add_idx: Vec<usize> = changes
        .iter()
        .enumerate()
        .filter(|(_, c)| c.kind == ChangeKind::Add)
        .map(|(i, _)| i)
        .collect();

    if delete_idx.is_empty() || add_idx.is_empty() {
        return Ok(if find_copies {
            detect_copies(odb, changes, threshold)?
        } else {
            changes
        });
    }

    if delete_idx.len() * add_idx.len() > max_files * max_files {
        return Ok(changes);
    }

    let mut changes = changes;
    let mut matched_delete = vec![false; delete_idx.len()];
    let mut matched_add = vec![false; add_idx.len()];
    let mut pairs: Vec<(usize, usize, f64)> = Vec::new();

    // Phase 1: exact content matches (similarity 1.0), consumed first.
    for (di, &d) in delete_idx.iter().enumerate() {
        let del_id = changes[d].old_entry.as_ref().unwrap().id;
        for (ai, &a) in add_idx.iter().enumerate() {
            if matched_add[ai] {
                continue;
            }
            if changes[a].new_entry.as_ref().unwrap().id == del_id {
                matched_delete[di] = true;
                matched_add[ai] = true;
                pairs.push((d, a, 1.0));
                break;
            }
        }
    }

    // Phase 2: fuzzy candidates at or above threshold, greedily assigned by
    // descending score, then ascending old path.
    let total_pairs = (delete_idx.len() * add_idx.len()) as u64;
    let mut pairs_examined = 0u64;
    let mut candidates: Vec<(usize, usize, f64)> = Vec::new();
    for (di, &d) in delete_idx.iter().enumerate() {
        if matched_delete[di] {
            continue;
        }
        let del_id = changes[d].old_entry.as_ref().unwrap().id;
        let old_data = read_blob(odb, &del_id)?;

        for (ai, &a) in add_idx.iter().enumerate() {
            if matched_add[ai] {
                continue;
            }
            if let Some(token) = cancel {
                if token.is_cancelled() {
                    return Err(DiffError::Cancelled);
                }
            }
            pairs_examined += 1;
            if let Some(cb) = progress.as_deref_mut() {
                cb(ProgressUpdate {
                    stage: "matching rename candidates",
                    done: pairs_examined,
                    total: Some(total_pairs),
                });
            }
            let new_id = changes[a].new_entry.as_ref().unwrap().id;
            let new_data = read_blob(odb, &new_id)?;
            let score = similarity(&old_data, &new_data);
            if score >= threshold {
                candidates.push((d, a, score));
            }
        }
    }

    candidates.sort_by(|a, b| {
        b.2.partial_cmp(&a.2)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| {
                changes[a.0]
                    .old_entry
                    .as_ref()
                    .unwrap()
                    .path
                    .cmp(&changes[b.0].old_entry.as_ref().unwrap().path)
            })
    });

    let mut add_taken = vec![false; changes.len()];
    let mut delete_taken = vec![false; changes.len()];
    for (d, a, score) in candidates {
        if delete_taken[d] || add_taken[a] {
            continue;
        }
        delete_taken[d] = true;
        add_taken[a] = true;
        pairs.push((d, a, score));
    }

    let mut consumed_deletes = vec![false; changes.len()];
    for (d, a, score) in &pairs {
        let old_entry = changes[*d].old_entry.clone();
        let new_entry = changes[*a].new_entry.clone();
        changes[*a] = Change {
            kind: ChangeKind::Rename,
            old_entry,
            new_entry,
            similarity: Some(*score),
        };
        consumed_deletes[*d] = true;
    }

    let mut idx = 0;
    changes.retain(|_| {
        let keep = !consumed_deletes[idx];
        idx += 1;
        keep
    });

    if find_copies {
        changes = detect_copies(odb, changes, threshold)?;
    }

    Ok(changes)
}

/// Match remaining `Add`s against `Unchanged` entries, converting matches to
/// `Copy`. The matched `Unchanged` source is left in the list untouched.
fn detect_copies(
    odb: &ObjectDatabase,
    mut changes: Vec<Change>,
    threshold: f64,
) -> Result<Vec<Change>, DiffError> {
    let source_idx: Vec<usize> = changes
        .iter()
        .enumerate()
        .filter(|(_, c)| c.kind == ChangeKind::Unchanged)
        .map(|(i, _)| i)
        .collect();
    if source_idx.is_empty() {
        return Ok(changes);
    }

    let add_idx: Vec<usize> = changes
        .iter()
        .enumerate()
        .filter(|(_, c)| c.kind == ChangeKind::Add)
        .map(|(i, _)| i)
        .collect();

    for a in add_idx {
        let new_id = changes[a].new_entry.as_ref().unwrap().id;
        let new_data = read_blob(odb, &new_id)?;

        let mut best: Option<(usize, f64)> = None;
        for &s in &source_idx {
            let src_id = changes[s].new_entry.as_ref().unwrap().id;
            let score = if src_id == new_id {
                1.0
            } else {
                let src_data = read_blob(odb, &src_id)?;
                similarity(&src_data, &new_data)
            };
            if score >= threshold && best.map_or(true, |(_, b)| score > b) {
                best = Some((s, score));
            }
        }

        if let Some((s, score)) = best {
            let source_entry = changes[s].new_entry.clone();
            changes[a] = Change {
                kind: ChangeKind::Copy,
                old_entry: source_entry,
                new_entry: changes[a].new_entry.clone(),
                similarity: Some(score),
            };
        }
    }

    Ok(changes)
}
