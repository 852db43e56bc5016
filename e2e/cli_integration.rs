//! Black-box tests driving the built `rm-xochitl-kbdpatch` binary via
//! `std::process::Command`.

use std::io::Write;
use std::path::PathBuf;
use std::process::Command;

use serde_json::json;
use tempfile::TempDir;

fn kbdpatch_bin() -> PathBuf {
    if let Ok(p) = std::env::var("CARGO_BIN_EXE_rm-xochitl-kbdpatch") {
        return PathBuf::from(p);
    }
    let mut p = std::env::current_exe().unwrap();
    p.pop();
    if p.ends_with("deps") {
        p.pop();
    }
    p.push("rm-xochitl-kbdpatch");
    p
}

fn de_de_layout() -> serde_json::Value {
    json!({
        "alphabetic": [
            ["q", "w", "e", "r", "t", "z", "u", "i", "o", "p", "ü"],
            ["a", "s", "d", "f", "g", "h", "j", "k", "l", "ö", "ä"],
            ["y", "x", "c", "v", "b", "n", "m"],
        ],
        "special": [{"special": "shift"}],
    })
}

fn write_fixture_binary(dir: &TempDir) -> PathBuf {
    let target = dir.path().join("xochitl");
    let json_bytes = serde_json::to_vec(&de_de_layout()).unwrap();
    let compressed = zstd::bulk::compress(&json_bytes, 19).unwrap();

    // Give the frame 64 bytes of slack so a same-size-ish transformed
    // payload comfortably fits the capacity budget.
    let capacity = compressed.len() + 64;
    let mut frame_region = compressed;
    let slack = capacity - frame_region.len();
    frame_region.extend(kbdpatch::writer::build_skippable_padding(slack));

    let mut bytes = vec![0x7Fu8, 0x45, 0x4C, 0x46];
    bytes.extend(vec![0u8; 60]);
    bytes.extend_from_slice(&frame_region);
    bytes.extend(vec![0xCDu8; 200]);

    std::fs::write(&target, &bytes).unwrap();
    target
}

fn write_override_json(dir: &TempDir) -> PathBuf {
    let path = dir.path().join("override.json");
    let override_layout = json!({
        "alphabetic": [[], [{"default": ["נ"], "shifted": ["ן"]}], []],
        "special": [],
    });
    let mut file = std::fs::File::create(&path).unwrap();
    file.write_all(serde_json::to_string(&override_layout).unwrap().as_bytes()).unwrap();
    path
}

#[test]
fn check_mode_exits_2_when_patch_is_needed() {
    let dir = TempDir::new().unwrap();
    let target = write_fixture_binary(&dir);
    let override_json = write_override_json(&dir);

    let output = Command::new(kbdpatch_bin())
        .args([
            "--locale",
            "de-de",
            "--json",
            override_json.to_str().unwrap(),
            "--target",
            target.to_str().unwrap(),
            "--check",
        ])
        .output()
        .expect("failed to run rm-xochitl-kbdpatch --check");

    assert_eq!(output.status.code(), Some(2), "stderr: {}", String::from_utf8_lossy(&output.stderr));
}

#[test]
fn apply_then_check_exits_0() {
    let dir = TempDir::new().unwrap();
    let target = write_fixture_binary(&dir);
    let override_json = write_override_json(&dir);

    let status = Command::new(kbdpatch_bin())
        .args([
            "--locale",
            "de-de",
            "--json",
            override_json.to_str().unwrap(),
            "--target",
            target.to_str().unwrap(),
        ])
        .status()
        .expect("failed to run rm-xochitl-kbdpatch apply");
    assert!(status.success());

    let output = Command::new(kbdpatch_bin())
        .args([
            "--locale",
            "de-de",
            "--json",
            override_json.to_str().unwrap(),
            "--target",
            target.to_str().unwrap(),
            "--check",
        ])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(0));
}

#[test]
fn help_flag_exits_zero_and_mentions_locale() {
    let output = Command::new(kbdpatch_bin()).arg("--help").output().unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("--locale"));
}

#[test]
fn missing_required_flag_exits_nonzero() {
    let status = Command::new(kbdpatch_bin()).arg("--check").status().unwrap();
    assert!(!status.success());
}
