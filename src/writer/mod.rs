//! In-Place Writer: the hardest correctness property in the whole crate.
//! Structured as a pure function
//! `(new_bytes, capacity) -> Result<frame_bytes_of_length_capacity>`
//! ([`fit_to_capacity`]) composed with a thin file-mutation wrapper
//! ([`write_in_place`]) that owns backup/fsync/validate/restore.

use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::Path;

use crate::cli::constants::{COMPRESSION_LEVELS, ELF_MAGIC, PADDING_SKIPPABLE_VARIANT};
use crate::decode::decode_candidate_default;
use crate::displaylevel;
use crate::error::PatchError;

/// Build one skippable frame of total length `slack`: a 4-byte magic
/// (`50 2A 4D 18`), a 4-byte little-endian payload length (`slack - 8`), and
/// that many zero bytes.
pub fn build_skippable_padding(slack: usize) -> Vec<u8> {
    assert!(slack >= 8, "padding-too-small must be rejected before calling this");
    let payload_len = (slack - 8) as u32;
    let mut frame = Vec::with_capacity(slack);
    frame.push(0x50 + PADDING_SKIPPABLE_VARIANT);
    frame.extend_from_slice(&[0x2A, 0x4D, 0x18]);
    frame.extend_from_slice(&payload_len.to_le_bytes());
    frame.extend(std::iter::repeat(0u8).take(payload_len as usize));
    frame
}

/// Pure compression-budget search. Tries `levels` in order; accepts
/// the first whose compressed length fits `capacity`, then pads the
/// remainder with a single skippable frame. The returned buffer is always
/// exactly `capacity` bytes long, or an error is returned without producing
/// any output.
pub fn fit_to_capacity(
    new_uncompressed: &[u8],
    capacity: usize,
    levels: &[i32],
) -> Result<Vec<u8>, PatchError> {
    for &level in levels {
        let compressed = zstd::bulk::compress(new_uncompressed, level)
            .map_err(|e| PatchError::io(Path::new("<compress>"), e))?;
        let len = compressed.len();
        if len > capacity {
            displaylevel!(3, "level {level}: {len} bytes exceeds capacity {capacity}, stepping down");
            continue;
        }

        let slack = capacity - len;
        displaylevel!(3, "level {level} accepted: {len} bytes, slack {slack}");
        if slack == 0 {
            return Ok(compressed);
        }
        if slack < 8 {
            return Err(PatchError::PaddingTooSmall { slack });
        }

        let mut out = compressed;
        out.extend(build_skippable_padding(slack));
        return Ok(out);
    }

    let smallest = zstd::bulk::compress(new_uncompressed, *levels.last().unwrap_or(&3))
        .map(|c| c.len())
        .unwrap_or(usize::MAX);
    Err(PatchError::CapacityExceeded { new_len: smallest, capacity })
}

/// Write `frame_bytes` (already exactly `capacity` bytes, from
/// [`fit_to_capacity`]) into `target_path` at `offset`, with backup, fsync,
/// and post-write validation, in strict order: backup → write → fsync →
/// validate → on-failure-restore.
pub fn write_in_place(
    target_path: &Path,
    offset: usize,
    capacity: usize,
    new_uncompressed: &[u8],
    frame_bytes: &[u8],
    backup_path: &Path,
) -> Result<(), PatchError> {
    debug_assert_eq!(frame_bytes.len(), capacity);

    let original_len = target_path
        .metadata()
        .map_err(|e| PatchError::io(target_path, e))?
        .len();

    if !backup_path.exists() {
        std::fs::copy(target_path, backup_path).map_err(|e| PatchError::io(backup_path, e))?;
    }

    let result = (|| -> Result<(), PatchError> {
        let mut file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(target_path)
            .map_err(|e| PatchError::io(target_path, e))?;

        file.seek(SeekFrom::Start(offset as u64)).map_err(|e| PatchError::io(target_path, e))?;
        file.write_all(frame_bytes).map_err(|e| PatchError::io(target_path, e))?;
        file.flush().map_err(|e| PatchError::io(target_path, e))?;
        file.sync_all().map_err(|e| PatchError::io(target_path, e))?;
        drop(file);

        validate_post_write(target_path, offset, capacity, new_uncompressed, original_len)
    })();

    if let Err(err) = result {
        restore_backup(target_path, backup_path)?;
        return Err(err);
    }

    displaylevel!(3, "wrote {capacity} bytes at offset {offset}");
    Ok(())
}

fn validate_post_write(
    target_path: &Path,
    offset: usize,
    capacity: usize,
    expected_uncompressed: &[u8],
    original_len: u64,
) -> Result<(), PatchError> {
    let mut file = File::open(target_path).map_err(|e| PatchError::io(target_path, e))?;

    let new_len = file.metadata().map_err(|e| PatchError::io(target_path, e))?.len();
    if new_len != original_len {
        return Err(PatchError::PostWriteValidation {
            reason: format!("file length changed from {original_len} to {new_len}"),
        });
    }

    let mut header = [0u8; 4];
    file.read_exact(&mut header).map_err(|e| PatchError::io(target_path, e))?;
    if header != ELF_MAGIC {
        return Err(PatchError::PostWriteValidation {
            reason: "first four bytes are no longer the ELF magic".to_string(),
        });
    }

    let mut region = vec![0u8; capacity];
    file.seek(SeekFrom::Start(offset as u64)).map_err(|e| PatchError::io(target_path, e))?;
    file.read_exact(&mut region).map_err(|e| PatchError::io(target_path, e))?;

    let decoded = decode_candidate_default(&region, 0).map_err(|reason| PatchError::PostWriteValidation {
        reason: format!("decoding the patched frame failed: {reason:?}"),
    })?;

    let expected_json: serde_json::Value =
        serde_json::from_slice(expected_uncompressed).map_err(|e| PatchError::PostWriteValidation {
            reason: format!("expected uncompressed bytes were not valid JSON: {e}"),
        })?;
    if decoded.json != expected_json {
        return Err(PatchError::PostWriteValidation {
            reason: "decompressed content does not match the transformed layout".to_string(),
        });
    }

    let trailing = capacity - decoded.compressed_len;
    if trailing > 0 {
        let padding = &region[decoded.compressed_len..capacity];
        validate_skippable_padding(padding, trailing)?;
    }

    Ok(())
}

fn validate_skippable_padding(padding: &[u8], expected_len: usize) -> Result<(), PatchError> {
    if padding.len() != expected_len || padding.len() < 8 {
        return Err(PatchError::PostWriteValidation {
            reason: "trailing padding is shorter than the skippable-frame minimum".to_string(),
        });
    }
    let lead = padding[0];
    if !(0x50..=0x5F).contains(&lead) || padding[1..4] != [0x2A, 0x4D, 0x18] {
        return Err(PatchError::PostWriteValidation {
            reason: "trailing bytes do not form a valid skippable frame".to_string(),
        });
    }
    let declared_len = u32::from_le_bytes([padding[4], padding[5], padding[6], padding[7]]) as usize;
    if declared_len != padding.len() - 8 {
        return Err(PatchError::PostWriteValidation {
            reason: "skippable frame's declared payload length does not match its actual size".to_string(),
        });
    }
    Ok(())
}

fn restore_backup(target_path: &Path, backup_path: &Path) -> Result<(), PatchError> {
    std::fs::copy(backup_path, target_path).map_err(|e| PatchError::io(target_path, e))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn padding_frame_has_correct_shape() {
        let frame = build_skippable_padding(16);
        assert_eq!(frame.len(), 16);
        assert_eq!(frame[0], 0x50);
        assert_eq!(&frame[1..4], &[0x2A, 0x4D, 0x18]);
        assert_eq!(u32::from_le_bytes([frame[4], frame[5], frame[6], frame[7]]), 8);
        assert!(frame[8..].iter().all(|&b| b == 0));
    }

    #[test]
    fn fit_to_capacity_accepts_at_max_level_when_it_fits() {
        let payload = br#"{"alphabetic":[],"special":[]}"#;
        let capacity = zstd::bulk::compress(payload, 22).unwrap().len() + 64;
        let frame = fit_to_capacity(payload, capacity, &COMPRESSION_LEVELS).unwrap();
        assert_eq!(frame.len(), capacity);
    }

    #[test]
    fn fit_to_capacity_steps_down_levels_until_it_fits() {
        // A payload compressible enough that only a much smaller capacity,
        // reachable at a lower level's slightly larger output... in practice
        // for tiny payloads all levels produce near-identical sizes, so we
        // assert the weaker, always-true property: the search never exceeds
        // capacity and never panics across the whole level ladder.
        let payload = b"aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa";
        let capacity = zstd::bulk::compress(payload, 3).unwrap().len();
        let frame = fit_to_capacity(payload, capacity, &COMPRESSION_LEVELS).unwrap();
        assert_eq!(frame.len(), capacity);
    }

    #[test]
    fn fit_to_capacity_fails_when_even_lowest_level_exceeds_capacity() {
        let payload = vec![b'z'; 4096];
        let err = fit_to_capacity(&payload, 4, &COMPRESSION_LEVELS).unwrap_err();
        assert!(matches!(err, PatchError::CapacityExceeded { .. }));
    }

    #[test]
    fn fit_to_capacity_fails_on_too_small_slack() {
        let payload = br#"{"a":1}"#;
        let exact = zstd::bulk::compress(payload, 22).unwrap().len();
        let err = fit_to_capacity(payload, exact + 3, &[22]).unwrap_err();
        assert!(matches!(err, PatchError::PaddingTooSmall { slack: 3 }));
    }

    #[test]
    fn validate_skippable_padding_rejects_bad_declared_length() {
        let mut padding = build_skippable_padding(16);
        padding[4] = 0xFF; // corrupt declared length
        let err = validate_skippable_padding(&padding, 16).unwrap_err();
        assert!(matches!(err, PatchError::PostWriteValidation { .. }));
    }
}
