//! In-place Zstandard/JSON patcher for the xochitl on-screen-keyboard layout.
//!
//! Five components do all the work: [`scan`] enumerates candidate frame
//! starts, [`decode`] turns a candidate into a JSON object (or rejects it),
//! [`layout::identify`] scores decoded objects against a locale signature,
//! [`layout::transform`] substitutes the override mapping, and [`writer`]
//! recompresses the result under the original frame's exact byte capacity.
//! [`ops`] wires the five together into the two top-level modes, `check` and
//! `apply`.

pub mod cli;
pub mod decode;
pub mod error;
pub mod json;
pub mod layout;
pub mod ops;
pub mod scan;
pub mod writer;

pub use error::PatchError;
pub use layout::Locale;
pub use ops::{apply, check, locate_layout, ApplyOutcome, CheckOutcome};
