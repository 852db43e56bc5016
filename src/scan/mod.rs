//! Frame Scanner: a lazy, ascending-offset sequence of candidate Zstandard
//! frame starts in a byte slice.
//!
//! No generators in safe stable Rust, so the lazy sequence is modelled as a
//! hand-written `Iterator` that the consumer (the Identifier) drives at its
//! own pace, never materialising the whole candidate list unless asked to.

use std::iter::Peekable;

use crate::cli::constants::{SKIPPABLE_MAGIC_LEAD, SKIPPABLE_MAGIC_SUFFIX, STANDARD_MAGIC};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MagicKind {
    Standard,
    Skippable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Candidate {
    pub offset: usize,
    pub magic_kind: MagicKind,
}

/// Byte-wise, overlap-permitting search for `needle` in `haystack`, yielding
/// match start offsets in ascending order. Advances by one byte per match
/// (not by `needle.len()`) so that adjacent/overlapping occurrences are
/// never skipped.
fn overlapping_matches(haystack: &[u8], needle: &'static [u8]) -> impl Iterator<Item = usize> + '_ {
    let finder = memchr::memmem::Finder::new(needle);
    let mut pos = 0usize;
    std::iter::from_fn(move || {
        if pos > haystack.len() {
            return None;
        }
        match finder.find(&haystack[pos..]) {
            Some(rel) => {
                let abs = pos + rel;
                pos = abs + 1;
                Some(abs)
            }
            None => {
                pos = haystack.len() + 1;
                None
            }
        }
    })
}

fn skippable_matches(haystack: &[u8]) -> impl Iterator<Item = usize> + '_ {
    overlapping_matches(haystack, &SKIPPABLE_MAGIC_SUFFIX).filter_map(move |suffix_off| {
        if suffix_off == 0 {
            return None;
        }
        let lead = haystack[suffix_off - 1];
        SKIPPABLE_MAGIC_LEAD.contains(&lead).then_some(suffix_off - 1)
    })
}

struct MergeAscending<A: Iterator<Item = Candidate>, B: Iterator<Item = Candidate>> {
    a: Peekable<A>,
    b: Peekable<B>,
}

impl<A: Iterator<Item = Candidate>, B: Iterator<Item = Candidate>> Iterator for MergeAscending<A, B> {
    type Item = Candidate;

    fn next(&mut self) -> Option<Candidate> {
        match (self.a.peek(), self.b.peek()) {
            (Some(x), Some(y)) => {
                if x.offset <= y.offset {
                    self.a.next()
                } else {
                    self.b.next()
                }
            }
            (Some(_), None) => self.a.next(),
            (None, Some(_)) => self.b.next(),
            (None, None) => None,
        }
    }
}

/// Enumerate every candidate Zstandard frame start in `data`, standard and
/// skippable, ordered by ascending offset. Never fails; an empty iterator is
/// a valid (if useless) result.
pub fn scan(data: &[u8]) -> impl Iterator<Item = Candidate> + '_ {
    let standard = overlapping_matches(data, &STANDARD_MAGIC).map(|offset| Candidate {
        offset,
        magic_kind: MagicKind::Standard,
    });
    let skippable = skippable_matches(data).map(|offset| Candidate {
        offset,
        magic_kind: MagicKind::Skippable,
    });
    MergeAscending { a: standard.peekable(), b: skippable.peekable() }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_input_yields_no_candidates() {
        assert_eq!(scan(&[]).count(), 0);
    }

    #[test]
    fn finds_a_single_standard_frame() {
        let mut data = vec![0u8; 8];
        data.extend_from_slice(&STANDARD_MAGIC);
        data.extend_from_slice(&[0u8; 8]);
        let found: Vec<_> = scan(&data).collect();
        assert_eq!(found, vec![Candidate { offset: 8, magic_kind: MagicKind::Standard }]);
    }

    #[test]
    fn finds_a_skippable_frame_with_variant_nibble() {
        let mut data = vec![0u8; 4];
        data.push(0x5A); // variant nibble 0xA
        data.extend_from_slice(&SKIPPABLE_MAGIC_SUFFIX);
        data.extend_from_slice(&[0u8; 4]);
        let found: Vec<_> = scan(&data).collect();
        assert_eq!(found, vec![Candidate { offset: 4, magic_kind: MagicKind::Skippable }]);
    }

    #[test]
    fn rejects_lead_byte_outside_skippable_range() {
        let mut data = vec![0u8; 4];
        data.push(0x49); // just below 0x50
        data.extend_from_slice(&SKIPPABLE_MAGIC_SUFFIX);
        assert_eq!(scan(&data).count(), 0);
    }

    #[test]
    fn candidates_are_ordered_by_ascending_offset() {
        let mut data = Vec::new();
        data.extend_from_slice(&STANDARD_MAGIC); // offset 0
        data.extend_from_slice(&[0u8; 3]);
        data.push(0x50);
        data.extend_from_slice(&SKIPPABLE_MAGIC_SUFFIX); // offset 7
        data.extend_from_slice(&STANDARD_MAGIC); // offset 11
        let offsets: Vec<_> = scan(&data).map(|c| c.offset).collect();
        assert_eq!(offsets, vec![0, 7, 11]);
    }

    #[test]
    fn overlapping_standard_matches_are_not_skipped() {
        // Craft a haystack where shifting by one byte produces another match
        // by constructing two overlapping copies of the magic.
        let data = [0x28, 0xB5, 0x2F, 0xFD, 0x28, 0xB5, 0x2F, 0xFD];
        let offsets: Vec<_> = scan(&data).map(|c| c.offset).collect();
        assert_eq!(offsets, vec![0, 4]);
    }
}
