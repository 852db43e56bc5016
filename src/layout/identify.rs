//! Layout Identifier: reduce a stream of decoded JSON objects down to the
//! single best-scoring candidate for a locale, or `None`.

use serde_json::Value;

use crate::decode::DecodedFrame;
use crate::layout::signature::{meets_acceptance_threshold, score_layout, Locale};

#[derive(Debug, Clone)]
pub struct ChosenFrame {
    pub offset: usize,
    pub compressed_len: usize,
    pub json: Value,
}

/// Consume `frames` (ascending by offset, as produced by the Scanner/Decoder
/// pipeline) and return the highest-scoring one that meets the locale's
/// acceptance threshold. Ties are broken by earliest offset: since frames
/// arrive in ascending order and a later candidate only replaces the
/// incumbent on a strictly higher score, the first-seen of equal scores
/// wins automatically.
pub fn identify(frames: impl Iterator<Item = DecodedFrame>, locale: Locale) -> Option<ChosenFrame> {
    let mut best: Option<(u32, ChosenFrame)> = None;

    for frame in frames {
        if !meets_acceptance_threshold(&frame.json, locale) {
            continue;
        }
        let Some(score) = score_layout(&frame.json, locale) else {
            continue;
        };
        let replace = match &best {
            None => true,
            Some((best_score, _)) => score > *best_score,
        };
        if replace {
            best = Some((
                score,
                ChosenFrame {
                    offset: frame.offset,
                    compressed_len: frame.compressed_len,
                    json: frame.json,
                },
            ));
        }
    }

    best.map(|(_, chosen)| chosen)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn frame(offset: usize, json: Value) -> DecodedFrame {
        DecodedFrame { offset, compressed_len: 100, json }
    }

    fn full_de_de() -> Value {
        json!({
            "alphabetic": [
                ["q", "w", "e", "r", "t", "z", "u", "i", "o", "p", "ü"],
                ["a", "s", "d", "f", "g", "h", "j", "k", "l", "ö", "ä"],
                ["y", "x", "c", "v", "b", "n", "m"],
            ],
            "special": [],
        })
    }

    #[test]
    fn no_candidates_yields_none() {
        assert!(identify(std::iter::empty(), Locale::DeDe).is_none());
    }

    #[test]
    fn ignores_non_json_shaped_candidate_and_picks_the_matching_one() {
        let frames = vec![
            frame(0, json!({"not": "a layout"})),
            frame(50, full_de_de()),
        ];
        let chosen = identify(frames.into_iter(), Locale::DeDe).expect("should find a match");
        assert_eq!(chosen.offset, 50);
    }

    #[test]
    fn picks_the_earliest_offset_on_a_score_tie() {
        let frames = vec![frame(10, full_de_de()), frame(99, full_de_de())];
        let chosen = identify(frames.into_iter(), Locale::DeDe).unwrap();
        assert_eq!(chosen.offset, 10);
    }

    #[test]
    fn prefers_strictly_higher_score_even_at_a_later_offset() {
        // Still passes the acceptance threshold (all extras present, every
        // row contributes) but scores lower than a full match: row 3 is
        // missing two letters (`v`, `b`).
        let partial = json!({
            "alphabetic": [
                ["q", "w", "e", "r", "t", "z", "u", "i", "o", "p", "ü"],
                ["a", "s", "d", "f", "g", "h", "j", "k", "l", "ö", "ä"],
                ["y", "x", "c", "n", "m"],
            ],
            "special": [],
        });
        let frames = vec![frame(10, partial), frame(99, full_de_de())];
        let chosen = identify(frames.into_iter(), Locale::DeDe).unwrap();
        assert_eq!(chosen.offset, 99);
    }
}
