//! Command-line surface: `rm-xochitl-kbdpatch --locale <LOCALE> --json <PATH> [--target <PATH>] [--check] [--verbose]`.
//!
//! Five flags, so `clap`'s derive API is the right tool — there's no
//! bespoke argv quirk here that a derived parser can't express.

use std::path::PathBuf;

use clap::Parser;

use crate::layout::signature::Locale;

#[derive(Debug, Parser)]
#[command(
    name = "rm-xochitl-kbdpatch",
    about = "Patch the xochitl on-screen-keyboard layout in place",
    version
)]
pub struct Cli {
    /// Locale whose OSK layout frame should be located and patched.
    #[arg(long, value_enum)]
    pub locale: Locale,

    /// Override layout JSON: a positional content template.
    #[arg(long = "json", value_name = "PATH")]
    pub override_json: PathBuf,

    /// Binary to patch.
    #[arg(long, value_name = "PATH", default_value = "/usr/bin/xochitl")]
    pub target: PathBuf,

    /// Report whether the target is already in the desired state; exit 2 if
    /// a patch would change it, 1 on error, 0 if already patched.
    #[arg(long)]
    pub check: bool,

    /// Emit diagnostic lines: candidate offsets, scores, compression level
    /// chosen, byte counts.
    #[arg(long)]
    pub verbose: bool,
}
