//! The error taxonomy surfaced by every component of the patcher.
//!
//! Every component returns `Result<_, PatchError>` (or a narrower local enum
//! that gets folded into one on its way up). No component swallows an error;
//! the `Writer` is the sole component that performs local recovery
//! (backup restore) before re-raising.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PatchError {
    #[error("input error: {0}")]
    InputError(String),

    #[error("target binary not found or unreadable: {path}")]
    TargetMissing { path: PathBuf, source: std::io::Error },

    #[error("no standard Zstandard frame found in {path}")]
    NoCandidates { path: PathBuf },

    #[error("no decoded candidate matched the {locale} signature")]
    NoMatch { locale: String },

    #[error(
        "recompressed layout ({new_len} bytes) does not fit the original frame \
         ({capacity} bytes) at any attempted compression level"
    )]
    CapacityExceeded { new_len: usize, capacity: usize },

    #[error(
        "slack of {slack} bytes is below the 8-byte skippable-frame minimum"
    )]
    PaddingTooSmall { slack: usize },

    #[error("post-write validation failed ({reason}); backup has been restored")]
    PostWriteValidation { reason: String },

    #[error("I/O error on {path}: {source}")]
    Io { path: PathBuf, source: std::io::Error },
}

impl PatchError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        PatchError::Io { path: path.into(), source }
    }

    /// Maps a taxonomy tag onto a process exit code: every error is 1
    /// except the two distinguished check-mode signals, which `ops::check`
    /// returns directly and never as a `PatchError`.
    pub fn exit_code(&self) -> i32 {
        1
    }
}
