//! Error-taxonomy coverage exercised end-to-end against the library.

use std::io::Write;

use kbdpatch::{apply, check, Locale, PatchError};
use serde_json::json;

fn override_layout() -> serde_json::Value {
    json!({
        "alphabetic": [[], [{"default": ["נ"], "shifted": ["ן"]}], []],
        "special": [],
    })
}

#[test]
fn target_missing_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let target = dir.path().join("does-not-exist");
    let backup = dir.path().join("does-not-exist.bak");

    let err = apply(&target, Locale::DeDe, &override_layout(), &backup).unwrap_err();
    assert!(matches!(err, PatchError::TargetMissing { .. }));
}

#[test]
fn no_candidates_when_file_has_no_zstd_frame_at_all() {
    let dir = tempfile::tempdir().unwrap();
    let target = dir.path().join("xochitl");
    std::fs::write(&target, vec![0u8; 512]).unwrap();

    let err = check(&target, Locale::DeDe, &override_layout()).unwrap_err();
    assert!(matches!(err, PatchError::NoCandidates { .. }));
}

#[test]
fn capacity_exceeded_when_the_frame_is_too_small_to_hold_any_recompression() {
    let dir = tempfile::tempdir().unwrap();
    let target = dir.path().join("xochitl");

    let layout = json!({
        "alphabetic": [
            ["q", "w", "e", "r", "t", "z", "u", "i", "o", "p", "ü"],
            ["a", "s", "d", "f", "g", "h", "j", "k", "l", "ö", "ä"],
            ["y", "x", "c", "v", "b", "n", "m"],
        ],
        "special": [{"special": "shift"}],
    });
    let json_bytes = serde_json::to_vec(&layout).unwrap();
    let compressed = zstd::bulk::compress(&json_bytes, 19).unwrap();

    let mut bytes = vec![0x7Fu8, 0x45, 0x4C, 0x46];
    bytes.extend(vec![0u8; 60]);
    bytes.extend_from_slice(&compressed);
    std::fs::write(&target, &bytes).unwrap();
    let original = std::fs::read(&target).unwrap();

    // An override whose substitutions make the JSON payload far larger than
    // the tightly-sized original frame (no slack at all was left: capacity
    // == compressed.len() exactly).
    let huge_override = json!({
        "alphabetic": [
            [],
            [{"default": ["נ".repeat(4000)], "shifted": ["ן".repeat(4000)]}],
            [],
        ],
        "special": [],
    });

    let backup = dir.path().join("xochitl.bak");
    let err = apply(&target, Locale::DeDe, &huge_override, &backup).unwrap_err();
    assert!(matches!(err, PatchError::CapacityExceeded { .. }));
    // File must be unchanged: the failure happened before any write began.
    assert_eq!(std::fs::read(&target).unwrap(), original);
}

#[test]
fn input_error_on_non_object_override_json_exits_nonzero_via_cli() {
    let dir = tempfile::tempdir().unwrap();
    let target = dir.path().join("xochitl");
    std::fs::write(&target, vec![0u8; 64]).unwrap();

    let override_path = dir.path().join("override.json");
    let mut file = std::fs::File::create(&override_path).unwrap();
    file.write_all(b"[1,2,3]").unwrap();

    let bin = if let Ok(p) = std::env::var("CARGO_BIN_EXE_rm-xochitl-kbdpatch") {
        std::path::PathBuf::from(p)
    } else {
        let mut p = std::env::current_exe().unwrap();
        p.pop();
        if p.ends_with("deps") {
            p.pop();
        }
        p.push("rm-xochitl-kbdpatch");
        p
    };

    let status = std::process::Command::new(bin)
        .args([
            "--locale",
            "de-de",
            "--json",
            override_path.to_str().unwrap(),
            "--target",
            target.to_str().unwrap(),
            "--check",
        ])
        .status()
        .unwrap();
    assert_eq!(status.code(), Some(1));
}
