//! End-to-end fixtures against the library API directly (no process spawn —
//! see `cli_integration.rs` for the black-box variant).

use std::io::Write;
use std::path::PathBuf;

use kbdpatch::writer::build_skippable_padding;
use kbdpatch::{apply, check, locate_layout, CheckOutcome, Locale, PatchError};
use serde_json::{json, Value};

fn de_de_layout() -> Value {
    json!({
        "alphabetic": [
            ["q", "w", "e", "r", "t", "z", "u", "i", "o", "p", "ü"],
            ["a", "s", "d", "f", "g", "h", "j", "k", "l", "ö", "ä"],
            ["y", "x", "c", "v", "b", "n", "m"],
        ],
        "special": [{"special": "shift"}],
    })
}

fn override_layout() -> Value {
    json!({
        "alphabetic": [[], [{"default": ["נ"], "shifted": ["ן"]}], []],
        "special": [],
    })
}

/// Synthetic 4 KiB file = [prefix 256B] ++ [zstd frame of length 2048] ++ [suffix random 1792B].
fn build_fixture_file(layout: &Value) -> (tempfile::TempDir, PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let target = dir.path().join("xochitl");

    let json_bytes = serde_json::to_vec(layout).unwrap();
    let compressed = zstd::bulk::compress(&json_bytes, 19).unwrap();

    let mut prefix = vec![0x7Fu8, 0x45, 0x4C, 0x46];
    prefix.extend(vec![0u8; 252]);
    assert_eq!(prefix.len(), 256);

    let capacity = 2048usize;
    let mut frame_region = compressed.clone();
    let slack = capacity - frame_region.len();
    assert!(slack >= 8, "fixture payload too large for the 2048-byte frame budget");
    frame_region.extend(build_skippable_padding(slack));

    let suffix: Vec<u8> = (0..1792u32).map(|i| (i % 256) as u8).collect();

    let mut bytes = prefix;
    bytes.extend_from_slice(&frame_region);
    bytes.extend_from_slice(&suffix);
    assert_eq!(bytes.len(), 4096);

    let mut file = std::fs::File::create(&target).unwrap();
    file.write_all(&bytes).unwrap();

    (dir, target)
}

#[test]
fn apply_preserves_prefix_suffix_and_length() {
    let (dir, target) = build_fixture_file(&de_de_layout());
    let original = std::fs::read(&target).unwrap();
    let backup = dir.path().join("xochitl.bak");

    let outcome = apply(&target, Locale::DeDe, &override_layout(), &backup).unwrap();

    let patched = std::fs::read(&target).unwrap();
    assert_eq!(patched.len(), original.len());
    assert_eq!(&patched[..256], &original[..256]);
    assert_eq!(&patched[256 + outcome.compressed_len..], &original[256 + outcome.compressed_len..]);
    assert_eq!(outcome.offset, 256);
}

#[test]
fn second_apply_is_byte_identical_to_first() {
    let (dir, target) = build_fixture_file(&de_de_layout());
    let backup1 = dir.path().join("xochitl.bak");
    let backup2 = dir.path().join("xochitl.bak2");

    apply(&target, Locale::DeDe, &override_layout(), &backup1).unwrap();
    let first = std::fs::read(&target).unwrap();

    apply(&target, Locale::DeDe, &override_layout(), &backup2).unwrap();
    let second = std::fs::read(&target).unwrap();

    assert_eq!(first, second);
}

#[test]
fn missing_umlaut_key_is_no_match_and_file_untouched() {
    let mut layout = de_de_layout();
    layout["alphabetic"][1].as_array_mut().unwrap().retain(|k| k.as_str() != Some("ä"));
    let (dir, target) = build_fixture_file(&layout);
    let original = std::fs::read(&target).unwrap();
    let backup = dir.path().join("xochitl.bak");

    let err = apply(&target, Locale::DeDe, &override_layout(), &backup).unwrap_err();
    assert!(matches!(err, PatchError::NoMatch { .. }));
    assert_eq!(std::fs::read(&target).unwrap(), original);
}

#[test]
fn check_then_apply_then_check_again() {
    let (dir, target) = build_fixture_file(&de_de_layout());
    let backup = dir.path().join("xochitl.bak");

    assert_eq!(check(&target, Locale::DeDe, &override_layout()).unwrap(), CheckOutcome::NeedsPatch);
    apply(&target, Locale::DeDe, &override_layout(), &backup).unwrap();
    assert_eq!(check(&target, Locale::DeDe, &override_layout()).unwrap(), CheckOutcome::AlreadyPatched);
}

#[test]
fn locate_layout_rejects_a_frame_that_only_parses_as_non_object_json() {
    let dir = tempfile::tempdir().unwrap();
    let target = dir.path().join("xochitl");

    let array_frame = zstd::bulk::compress(b"[1,2,3]", 3).unwrap();
    let object_frame = zstd::bulk::compress(&serde_json::to_vec(&de_de_layout()).unwrap(), 3).unwrap();

    let mut bytes = vec![0x7Fu8, 0x45, 0x4C, 0x46];
    bytes.extend(vec![0u8; 12]);
    bytes.extend_from_slice(&array_frame);
    bytes.extend_from_slice(&object_frame);
    std::fs::write(&target, &bytes).unwrap();

    let data = std::fs::read(&target).unwrap();
    let chosen = locate_layout(&data, Locale::DeDe).unwrap();
    assert_eq!(chosen.offset, 16 + array_frame.len());
}
