//! Build a delta that transforms one object into another.
//!
//! A simplified diff-delta: index fixed-size, non-overlapping blocks of the
//! source, then slide through the target looking for a block that starts a
//! known source offset. A hit becomes a copy instruction extended as far as
//! the two buffers keep agreeing; everything else accumulates into insert
//! instructions.

use std::collections::HashMap;

use super::{encode_copy, encode_insert, write_varint};

const BLOCK_SIZE: usize = 16;
const MAX_COPY_SIZE: usize = 0x00ff_ffff;
const MAX_INSERT_SIZE: usize = 127;

/// Non-overlapping `BLOCK_SIZE`-byte windows of a source buffer, keyed by
/// content so a target window can be looked up in O(1).
struct BlockIndex<'a> {
    offsets: HashMap<&'a [u8], usize>,
}

impl<'a> BlockIndex<'a> {
    fn build(source: &'a [u8]) -> Self {
        let mut offsets = HashMap::new();
        if source.len() >= BLOCK_SIZE {
            for offset in (0..=source.len() - BLOCK_SIZE).step_by(BLOCK_SIZE) {
                offsets.entry(&source[offset..offset + BLOCK_SIZE]).or_insert(offset);
            }
        }
        Self { offsets }
    }

    fn find(&self, block: &[u8]) -> Option<usize> {
        self.offsets.get(block).copied()
    }
}

pub fn compute_delta(source: &[u8], target: &[u8]) -> Vec<u8> {
    let mut delta = Vec::new();
    delta.extend_from_slice(&write_varint(source.len()));
    delta.extend_from_slice(&write_varint(target.len()));

    if target.is_empty() {
        return delta;
    }

    let index = BlockIndex::build(source);
    let mut pending_insert = Vec::new();
    let mut tpos = 0;

    while tpos < target.len() {
        let can_match = target.len() - tpos >= BLOCK_SIZE;
        let hit = can_match.then(|| index.find(&target[tpos..tpos + BLOCK_SIZE])).flatten();

        match hit {
            Some(src_offset) => {
                let match_len = extend_match(source, src_offset, target, tpos);
                flush_insert(&mut delta, &mut pending_insert);
                emit_copy(&mut delta, src_offset, match_len);
                tpos += match_len;
            }
            None => {
                pending_insert.push(target[tpos]);
                tpos += 1;
                if pending_insert.len() == MAX_INSERT_SIZE {
                    flush_insert(&mut delta, &mut pending_insert);
                }
            }
        }
    }

    flush_insert(&mut delta, &mut pending_insert);
    delta
}

/// Grow a `BLOCK_SIZE`-byte match starting at `(src_off, tgt_off)` one byte
/// at a time while both buffers still agree.
fn extend_match(source: &[u8], src_off: usize, target: &[u8], tgt_off: usize) -> usize {
    let max_len = std::cmp::min(source.len() - src_off, target.len() - tgt_off);
    let mut len = BLOCK_SIZE;
    while len < max_len && source[src_off + len] == target[tgt_off + len] {
        len += 1;
    }
    len
}

fn flush_insert(delta: &mut Vec<u8>, pending: &mut Vec<u8>) {
    while !pending.is_empty() {
        let chunk_len = std::cmp::min(pending.len(), MAX_INSERT_SIZE);
        let chunk: Vec<u8> = pending.drain(..chunk_len).collect();
        delta.extend_from_slice(&encode_insert(&chunk));
    }
}

/// A copy instruction's size field is at most 24 bits; split a longer match
/// into consecutive copies.
fn emit_copy(delta: &mut Vec<u8>, offset: usize, mut size: usize) {
    let mut off = offset;
    while size > 0 {
        let chunk = std::cmp::min(size, MAX_COPY_SIZE);
        delta.extend_from_slice(&encode_copy(off as u64, chunk));
        off += chunk;
        size -= chunk;
    }
}
