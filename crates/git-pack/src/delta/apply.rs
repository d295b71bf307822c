//! Reconstruct an object from a base and a delta instruction stream.

use super::{read_copy_fields, read_varint};
use crate::PackError;

/// Replay `delta` against `base`, producing the target object bytes.
///
/// Every copy is bounds-checked against `base` before the slice is taken,
/// and the final output length is checked against the delta's own claimed
/// target size — both guard against a corrupt or adversarial delta driving
/// an out-of-bounds read.
pub fn apply_delta(base: &[u8], delta: &[u8]) -> Result<Vec<u8>, PackError> {
    let (source_size, mut pos) = read_varint(delta).ok_or_else(|| PackError::InvalidDelta {
        offset: 0,
        reason: "truncated source size".into(),
    })?;
    let (target_size, consumed) = read_varint(&delta[pos..]).ok_or_else(|| PackError::InvalidDelta {
        offset: pos as u64,
        reason: "truncated target size".into(),
    })?;
    pos += consumed;

    if source_size != base.len() {
        return Err(PackError::InvalidDelta {
            offset: 0,
            reason: format!(
                "source size mismatch: delta says {source_size}, base is {}",
                base.len()
            ),
        });
    }

    let mut output = Vec::with_capacity(target_size);
    while pos < delta.len() {
        let cmd = delta[pos];
        pos += 1;

        if cmd & 0x80 != 0 {
            let (offset, size, new_pos) = read_copy_fields(delta, pos, cmd)?;
            pos = new_pos;
            let offset = offset as usize;
            let end = offset.checked_add(size).filter(|&e| e <= base.len()).ok_or_else(|| {
                PackError::InvalidDelta {
                    offset: pos as u64,
                    reason: format!(
                        "copy out of bounds: offset={offset}, size={size}, base_len={}",
                        base.len()
                    ),
                }
            })?;
            output.extend_from_slice(&base[offset..end]);
        } else if cmd != 0 {
            let n = cmd as usize;
            let end = pos.checked_add(n).filter(|&e| e <= delta.len()).ok_or_else(|| {
                PackError::InvalidDelta {
                    offset: pos as u64,
                    reason: "truncated insert data".into(),
                }
            })?;
            output.extend_from_slice(&delta[pos..end]);
            pos = end;
        } else {
            return Err(PackError::InvalidDelta {
                offset: (pos - 1) as u64,
                reason: "unexpected delta opcode 0".into(),
            });
        }
    }

    if output.len() != target_size {
        return Err(PackError::InvalidDelta {
            offset: 0,
            reason: format!(
                "target size mismatch: delta says {target_size}, got {}",
                output.len()
            ),
        });
    }

    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::delta::{encode_copy, encode_insert, write_varint};

    fn build_delta(source_size: usize, target_size: usize, instructions: &[u8]) -> Vec<u8> {
        let mut delta = Vec::new();
        delta.extend_from_slice(&write_varint(source_size));
        delta.extend_from_slice(&write_varint(target_size));
        delta.extend_from_slice(instructions);
        delta
    }

    #[test]
    fn apply_copy_only() {
        let base = b"Hello, World!";
        let mut instructions = Vec::new();
        instructions.extend_from_slice(&encode_copy(0, 5));
        instructions.extend_from_slice(&encode_copy(7, 5));

        let delta = build_delta(base.len(), 10, &instructions);
        let result = apply_delta(base, &delta).unwrap();
        assert_eq!(result, b"HelloWorld");
    }

    #[test]
    fn apply_insert_only() {
        let base = b"unused base";
        let mut instructions = Vec::new();
        instructions.extend_from_slice(&encode_insert(b"NEW"));

        let delta = build_delta(base.len(), 3, &instructions);
        let result = apply_delta(base, &delta).unwrap();
        assert_eq!(result, b"NEW");
    }

    #[test]
    fn apply_mixed_instructions() {
        let base = b"ABCDEFGHIJ";
        let mut instructions = Vec::new();
        instructions.extend_from_slice(&encode_copy(0, 3));
        instructions.extend_from_slice(&encode_insert(b"xyz"));
        instructions.extend_from_slice(&encode_copy(7, 3));

        let delta = build_delta(base.len(), 9, &instructions);
        let result = apply_delta(base, &delta).unwrap();
        assert_eq!(result, b"ABCxyzHIJ");
    }

    #[test]
    fn copy_out_of_bounds_fails() {
        let base = b"short";
        let mut instructions = Vec::new();
        instructions.extend_from_slice(&encode_copy(0, 100));

        let delta = build_delta(base.len(), 100, &instructions);
        let result = apply_delta(base, &delta);
        assert!(result.is_err());
    }

    #[test]
    fn target_size_mismatch_fails() {
        let base = b"Hello";
        let mut instructions = Vec::new();
        instructions.extend_from_slice(&encode_copy(0, 5));

        let delta = build_delta(base.len(), 10, &instructions);
        let result = apply_delta(base, &delta);
        assert!(result.is_err());
    }

    #[test]
    fn source_size_mismatch_fails() {
        let base = b"Hello";
        let mut instructions = Vec::new();
        instructions.extend_from_slice(&encode_copy(0, 5));

        let delta = build_delta(100, 5, &instructions);
        let result = apply_delta(base, &delta);
        assert!(result.is_err());
    }

    #[test]
    fn empty_delta_produces_empty_output() {
        let base = b"anything";
        let delta = build_delta(base.len(), 0, &[]);
        let result = apply_delta(base, &delta).unwrap();
        assert!(result.is_empty());
    }
}
