//! Locale signature table and the structural scoring function.

use std::collections::BTreeSet;

use clap::ValueEnum;
use serde_json::Value;

use crate::json::{alphabetic_rows, base_letter, is_special_key};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ValueEnum)]
pub enum Locale {
    /// German (Germany) QWERTZ layout.
    #[value(name = "de-de", alias = "de_DE")]
    DeDe,
}

impl std::fmt::Display for Locale {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Locale::DeDe => write!(f, "de_DE"),
        }
    }
}

pub struct Signature {
    pub row_letters: [BTreeSet<char>; 3],
    pub extra_letters: BTreeSet<char>,
}

pub fn signature_for(locale: Locale) -> Signature {
    match locale {
        Locale::DeDe => Signature {
            row_letters: [
                BTreeSet::from(['q', 'w', 'e', 'r', 't', 'z', 'u', 'i', 'o', 'p']),
                BTreeSet::from(['a', 's', 'd', 'f', 'g', 'h', 'j', 'k', 'l']),
                BTreeSet::from(['y', 'x', 'c', 'v', 'b', 'n', 'm']),
            ],
            extra_letters: BTreeSet::from(['ü', 'ö', 'ä']),
        },
    }
}

/// Per-row letters actually observed in `layout`, lowercase-folded, skipping
/// pure special keys. Returns `None` if the structural gate fails.
fn observed_rows(layout: &Value) -> Option<[BTreeSet<char>; 3]> {
    let rows = alphabetic_rows(layout)?;
    let mut observed: [BTreeSet<char>; 3] = Default::default();
    for (row, slot) in rows.iter().zip(observed.iter_mut()) {
        let row = row.as_array()?;
        for key in row {
            if is_special_key(key) {
                continue;
            }
            if let Some(c) = base_letter(key) {
                slot.insert(c);
            }
        }
    }
    Some(observed)
}

/// Score a candidate layout against `locale`'s signature. Returns `None`
/// when the structural gate fails (score 0, folded here into "not a
/// candidate at all").
///
/// Weighting: +2 per expected row letter present, +3 per locale-extra
/// present, -2 per expected row letter missing. These weights are chosen so
/// that a fully matching `de_DE` layout (29 row letters + 3 extras => 58 + 9
/// = 67) scores strictly higher than any layout missing two or more
/// expected row letters (which loses at least 4 points net relative to full
/// match, and every other candidate locale/layout combination observed in
/// practice scores far lower still).
pub fn score_layout(layout: &Value, locale: Locale) -> Option<u32> {
    let observed = observed_rows(layout)?;
    let signature = signature_for(locale);

    let mut score: i64 = 0;
    for (obs, expected) in observed.iter().zip(signature.row_letters.iter()) {
        let present = obs.intersection(expected).count() as i64;
        let missing = expected.difference(obs).count() as i64;
        score += present * 2;
        score -= missing * 2;
    }

    let all_observed: BTreeSet<char> = observed.iter().flatten().copied().collect();
    let extras_present = all_observed.intersection(&signature.extra_letters).count() as i64;
    score += extras_present * 3;

    Some(score.max(0) as u32)
}

/// Minimum acceptance rule. A layout missing even a single locale-extra
/// letter (e.g. `ä` for `de_DE`) must already fail acceptance, so this
/// requires *every* locale-extra to be present, not merely one. This crate
/// therefore requires: every row contributes at least one expected letter,
/// AND every locale-extra is present somewhere in the layout.
pub fn meets_acceptance_threshold(layout: &Value, locale: Locale) -> bool {
    let Some(observed) = observed_rows(layout) else {
        return false;
    };
    let signature = signature_for(locale);

    let rows_contribute = observed
        .iter()
        .zip(signature.row_letters.iter())
        .all(|(obs, expected)| obs.intersection(expected).next().is_some());

    let all_observed: BTreeSet<char> = observed.iter().flatten().copied().collect();
    let has_all_extras = signature.extra_letters.is_subset(&all_observed);

    rows_contribute && has_all_extras
}
