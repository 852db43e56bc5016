//! Magic byte constants and the verbosity global.
//!
//! The `DISPLAY_LEVEL` atomic plus the `displaylevel!` macro give `-v`/`-q`
//! handling with a crate-level `AtomicU32` gated by small integer
//! thresholds, with no external logging framework pulled in for what is, in
//! the end, a handful of diagnostic lines: candidate offsets, scores,
//! compression level chosen, byte counts.

use std::sync::atomic::{AtomicU32, Ordering};

/// Standard Zstandard frame magic, little-endian on the wire: `28 B5 2F FD`.
pub const STANDARD_MAGIC: [u8; 4] = [0x28, 0xB5, 0x2F, 0xFD];

/// Fixed suffix of every skippable-frame magic; the leading byte varies
/// across `0x50..=0x5F` (the low nibble is the "variant").
pub const SKIPPABLE_MAGIC_SUFFIX: [u8; 3] = [0x2A, 0x4D, 0x18];

/// Inclusive range of the skippable frame's variable leading byte.
pub const SKIPPABLE_MAGIC_LEAD: std::ops::RangeInclusive<u8> = 0x50..=0x5F;

/// Variant nibble this tool uses when emitting its own padding frames.
pub const PADDING_SKIPPABLE_VARIANT: u8 = 0;

/// Required first four bytes of the target binary, before and after a patch.
pub const ELF_MAGIC: [u8; 4] = [0x7F, 0x45, 0x4C, 0x46];

/// Default safety cap on a single decoded frame's uncompressed size.
pub const DECODE_SAFETY_CAP: usize = 8 * 1024 * 1024;

/// Compression levels tried, in order, by the budget search.
pub const COMPRESSION_LEVELS: [i32; 6] = [22, 19, 15, 11, 7, 3];

/// 0 = silent, 1 = errors only, 2 = normal, 3 = verbose (candidate offsets,
/// scores, compression level, byte counts).
pub static DISPLAY_LEVEL: AtomicU32 = AtomicU32::new(1);

#[inline]
pub fn display_level() -> u32 {
    DISPLAY_LEVEL.load(Ordering::Relaxed)
}

#[inline]
pub fn set_display_level(level: u32) {
    DISPLAY_LEVEL.store(level, Ordering::Relaxed);
}

/// Conditionally print to stderr at or above `level`.
#[macro_export]
macro_rules! displaylevel {
    ($level:expr, $($arg:tt)*) => {
        if $crate::cli::constants::display_level() >= $level {
            eprintln!($($arg)*);
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn magic_constants() {
        assert_eq!(STANDARD_MAGIC, [0x28, 0xB5, 0x2F, 0xFD]);
        assert_eq!(SKIPPABLE_MAGIC_SUFFIX, [0x2A, 0x4D, 0x18]);
        assert_eq!(ELF_MAGIC, [0x7F, 0x45, 0x4C, 0x46]);
    }

    #[test]
    fn display_level_roundtrip() {
        let prev = display_level();
        set_display_level(3);
        assert_eq!(display_level(), 3);
        set_display_level(prev);
    }
}
