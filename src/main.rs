//! Binary entry point for `rm-xochitl-kbdpatch`.
//!
//! Parses arguments, loads the override layout JSON, and dispatches to
//! [`kbdpatch::check`] or [`kbdpatch::apply`]. All resources are released
//! by Rust's RAII; there is no explicit cleanup path.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use serde_json::Value;

use kbdpatch::cli::args::Cli;
use kbdpatch::cli::constants::set_display_level;
use kbdpatch::{apply, check, CheckOutcome, PatchError};

fn load_override_layout(path: &std::path::Path) -> Result<Value, PatchError> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading override layout from {}", path.display()))
        .map_err(|e| PatchError::InputError(e.to_string()))?;
    let value: Value = serde_json::from_str(&text)
        .map_err(|e| PatchError::InputError(format!("{}: not valid JSON: {e}", path.display())))?;
    if !value.is_object() {
        return Err(PatchError::InputError(format!(
            "{}: override layout must be a JSON object",
            path.display()
        )));
    }
    Ok(value)
}

fn backup_path_for(target: &std::path::Path) -> PathBuf {
    let mut name = target.file_name().unwrap_or_default().to_os_string();
    name.push(".bak");
    target.with_file_name(name)
}

fn run(cli: Cli) -> Result<ExitCode, PatchError> {
    set_display_level(if cli.verbose { 3 } else { 1 });

    let override_layout = load_override_layout(&cli.override_json)?;

    if cli.check {
        return match check(&cli.target, cli.locale, &override_layout) {
            Ok(CheckOutcome::AlreadyPatched) => {
                println!("already patched");
                Ok(ExitCode::from(0))
            }
            Ok(CheckOutcome::NeedsPatch) => {
                println!("patch needed");
                Ok(ExitCode::from(2))
            }
            Err(e) => Err(e),
        };
    }

    let backup = backup_path_for(&cli.target);
    let outcome = apply(&cli.target, cli.locale, &override_layout, &backup)?;
    println!(
        "patched offset={} capacity={} sha256={}",
        outcome.offset, outcome.compressed_len, outcome.file_hash
    );
    Ok(ExitCode::from(0))
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("rm-xochitl-kbdpatch: error: {e}");
            ExitCode::from(e.exit_code() as u8)
        }
    }
}
