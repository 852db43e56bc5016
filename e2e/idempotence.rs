//! Idempotence and key-preservation, run directly against the library so
//! the assertions can inspect the decoded JSON rather than only raw bytes.

use std::io::Write;

use kbdpatch::writer::build_skippable_padding;
use kbdpatch::{apply, Locale};
use serde_json::{json, Value};

fn de_de_layout() -> Value {
    json!({
        "alphabetic": [
            ["q", "w", "e", "r", "t", "z", "u", "i", "o", "p", "ü"],
            [
                "a", "s", {"default": ["d"], "shifted": ["D"], "alt": ["δ"]},
                "f", "g", "h", "j", "k", "l", "ö", "ä"
            ],
            ["y", "x", "c", "v", "b", "n", "m"],
        ],
        "special": [{"special": "shift"}],
    })
}

fn build_fixture(layout: &Value) -> (tempfile::TempDir, std::path::PathBuf, usize) {
    let dir = tempfile::tempdir().unwrap();
    let target = dir.path().join("xochitl");

    let json_bytes = serde_json::to_vec(layout).unwrap();
    let compressed = zstd::bulk::compress(&json_bytes, 19).unwrap();
    let capacity = compressed.len() + 128;
    let mut region = compressed;
    region.extend(build_skippable_padding(capacity - region.len()));

    let mut bytes = vec![0x7Fu8, 0x45, 0x4C, 0x46];
    bytes.extend(vec![0u8; 60]);
    bytes.extend_from_slice(&region);
    bytes.extend(vec![0u8; 64]);

    let mut file = std::fs::File::create(&target).unwrap();
    file.write_all(&bytes).unwrap();

    (dir, target, capacity)
}

fn decode_layout_at(target: &std::path::Path) -> Value {
    let data = std::fs::read(target).unwrap();
    let chosen = kbdpatch::locate_layout(&data, Locale::DeDe).unwrap();
    chosen.json
}

#[test]
fn applying_twice_yields_the_same_file() {
    let (dir, target, _capacity) = build_fixture(&de_de_layout());
    let override_layout = json!({
        "alphabetic": [[], [{"default": ["נ"], "shifted": ["ן"]}], []],
        "special": [],
    });
    let backup1 = dir.path().join("b1");
    let backup2 = dir.path().join("b2");

    apply(&target, Locale::DeDe, &override_layout, &backup1).unwrap();
    let once = std::fs::read(&target).unwrap();
    apply(&target, Locale::DeDe, &override_layout, &backup2).unwrap();
    let twice = std::fs::read(&target).unwrap();

    assert_eq!(once, twice);
}

#[test]
fn unmapped_keys_are_structurally_unchanged_after_patch() {
    let (dir, target, _capacity) = build_fixture(&de_de_layout());
    let before = decode_layout_at(&target);

    // Override only touches row 2, position 0 ('a'); every other key,
    // including the 'd' key with its extra `alt` field, must survive
    // byte-for-byte in structure.
    let override_layout = json!({
        "alphabetic": [[], [{"default": ["נ"], "shifted": ["ן"]}], []],
        "special": [],
    });
    let backup = dir.path().join("xochitl.bak");
    apply(&target, Locale::DeDe, &override_layout, &backup).unwrap();

    let after = decode_layout_at(&target);
    assert_eq!(after["alphabetic"][1][2], before["alphabetic"][1][2], "the 'd' key must be untouched");
    assert_eq!(after["alphabetic"][0], before["alphabetic"][0], "row 1 is entirely untouched");
    assert_eq!(after["special"], before["special"]);
}
