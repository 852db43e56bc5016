//! Top-level modes: `check` and `apply`, both pure with respect to
//! everything outside the target file (plus the backup file).

use std::fs::File;
use std::path::Path;

use memmap2::Mmap;
use serde_json::Value;
use sha2::{Digest, Sha256};

use crate::cli::constants::{COMPRESSION_LEVELS, DECODE_SAFETY_CAP};
use crate::decode::decode_candidate;
use crate::displaylevel;
use crate::error::PatchError;
use crate::layout::{self, identify, ChosenFrame, Locale};
use crate::scan::{scan, MagicKind};
use crate::writer;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckOutcome {
    AlreadyPatched,
    NeedsPatch,
}

pub struct ApplyOutcome {
    pub offset: usize,
    pub compressed_len: usize,
    pub file_hash: String,
}

/// Locate the single best-scoring candidate frame for `locale` within
/// `data`, running the Scanner → Decoder → Identifier pipeline.
pub fn locate_layout(data: &[u8], locale: Locale) -> Result<ChosenFrame, PatchError> {
    locate_layout_at(data, locale, Path::new(""))
}

/// As [`locate_layout`], but `path` is carried into [`PatchError::NoCandidates`]
/// so the error message names the file that was scanned.
fn locate_layout_at(data: &[u8], locale: Locale, path: &Path) -> Result<ChosenFrame, PatchError> {
    let mut any_standard = false;
    let decoded = scan(data).filter_map(|candidate| {
        if candidate.magic_kind != MagicKind::Standard {
            return None;
        }
        any_standard = true;
        match decode_candidate(data, candidate.offset, DECODE_SAFETY_CAP) {
            Ok(frame) => {
                displaylevel!(3, "candidate at {}: decoded {} bytes", candidate.offset, frame.compressed_len);
                Some(frame)
            }
            Err(reason) => {
                displaylevel!(3, "candidate at {}: rejected ({:?})", candidate.offset, reason);
                None
            }
        }
    });

    let chosen = identify(decoded, locale);

    match chosen {
        Some(chosen) => {
            displaylevel!(3, "chosen frame at offset {} (capacity {} bytes)", chosen.offset, chosen.compressed_len);
            Ok(chosen)
        }
        None if any_standard => Err(PatchError::NoMatch { locale: locale.to_string() }),
        None => Err(PatchError::NoCandidates { path: path.to_path_buf() }),
    }
}

fn transformed_json(chosen: &ChosenFrame, override_layout: &Value) -> Value {
    let mapping = layout::build_mapping(&chosen.json, override_layout);
    layout::apply_mapping(&chosen.json, &mapping)
}

/// `check` mode: report whether `target` already matches the desired end
/// state for `locale` given `override_layout`.
pub fn check(target: &Path, locale: Locale, override_layout: &Value) -> Result<CheckOutcome, PatchError> {
    let mmap = map_readonly(target)?;
    let chosen = locate_layout_at(&mmap, locale, target)?;
    let target_json = transformed_json(&chosen, override_layout);

    if chosen.json == target_json {
        Ok(CheckOutcome::AlreadyPatched)
    } else {
        Ok(CheckOutcome::NeedsPatch)
    }
}

/// `apply` mode: identify, transform, and write the target in place.
pub fn apply(
    target: &Path,
    locale: Locale,
    override_layout: &Value,
    backup_path: &Path,
) -> Result<ApplyOutcome, PatchError> {
    let chosen = {
        let mmap = map_readonly(target)?;
        locate_layout_at(&mmap, locale, target)?
    }; // mmap dropped before the writer phase opens the file read-write

    let target_json = transformed_json(&chosen, override_layout);
    let new_uncompressed = serde_json::to_vec(&target_json).map_err(|e| {
        PatchError::InputError(format!("failed to serialise transformed layout: {e}"))
    })?;

    let frame_bytes = writer::fit_to_capacity(&new_uncompressed, chosen.compressed_len, &COMPRESSION_LEVELS)?;

    writer::write_in_place(
        target,
        chosen.offset,
        chosen.compressed_len,
        &new_uncompressed,
        &frame_bytes,
        backup_path,
    )?;

    let file_hash = hash_file(target)?;
    Ok(ApplyOutcome { offset: chosen.offset, compressed_len: chosen.compressed_len, file_hash })
}

fn map_readonly(target: &Path) -> Result<Mmap, PatchError> {
    let file = File::open(target).map_err(|source| PatchError::TargetMissing { path: target.to_path_buf(), source })?;
    // SAFETY: the target is a regular file the caller is expected to have
    // quiesced; this matches the scoped read-only-map-then-drop pattern the
    // Writer phase depends on.
    unsafe { Mmap::map(&file) }.map_err(|e| PatchError::io(target, e))
}

fn hash_file(target: &Path) -> Result<String, PatchError> {
    let bytes = std::fs::read(target).map_err(|e| PatchError::io(target, e))?;
    let mut hasher = Sha256::new();
    hasher.update(&bytes);
    Ok(format!("{:x}", hasher.finalize()))
}
