//! Layout Transformer: build a letter mapping from base + override layouts,
//! then apply it while leaving every other field untouched.

use std::collections::HashMap;

use serde_json::Value;

use crate::json::{base_letter, is_special_key, override_alternates};

/// Base-letter identity → `(new_default, new_shifted)`.
pub type LetterMapping = HashMap<char, (String, String)>;

/// Walk `base`'s `alphabetic` rows and `override_layout`'s rows in
/// positional lockstep. A base key's letter identity is associated with
/// whatever sits at the *same row/column position* in the override — the
/// override is a positional template, never matched by
/// identity.
pub fn build_mapping(base: &Value, override_layout: &Value) -> LetterMapping {
    let mut mapping = LetterMapping::new();

    let Some(base_rows) = base.get("alphabetic").and_then(Value::as_array) else {
        return mapping;
    };
    let override_rows = override_layout.get("alphabetic").and_then(Value::as_array);

    for (row_idx, base_row) in base_rows.iter().enumerate() {
        let Some(base_row) = base_row.as_array() else { continue };
        let override_row = override_rows
            .and_then(|rows| rows.get(row_idx))
            .and_then(Value::as_array);

        for (col_idx, base_key) in base_row.iter().enumerate() {
            if is_special_key(base_key) {
                continue; // pure specials are never part of the mapping
            }
            let Some(letter) = base_letter(base_key) else { continue };

            let Some(override_key) = override_row.and_then(|row| row.get(col_idx)) else {
                continue; // override position missing: leave base key untouched
            };
            let Some((new_default, new_shifted)) = override_alternates(override_key) else {
                continue; // override key lacks default[0]: leave base key untouched
            };

            mapping.insert(letter, (new_default, new_shifted));
        }
    }

    mapping
}

/// Apply `mapping` to `base`, returning a transformed deep copy. Every field
/// outside matched alphabetic keys — the `special` array, every other
/// top-level field, and every non-default/shifted field of a matched key —
/// passes through unchanged.
pub fn apply_mapping(base: &Value, mapping: &LetterMapping) -> Value {
    let mut out = base.clone();

    let Some(rows) = out.get_mut("alphabetic").and_then(Value::as_array_mut) else {
        return out;
    };

    for row in rows.iter_mut() {
        let Some(row) = row.as_array_mut() else { continue };
        for key in row.iter_mut() {
            if is_special_key(key) {
                continue;
            }
            let Some(letter) = base_letter(key) else { continue };
            let Some((new_default, new_shifted)) = mapping.get(&letter) else { continue };
            apply_to_key(key, new_default, new_shifted);
        }
    }

    out
}

fn apply_to_key(key: &mut Value, new_default: &str, new_shifted: &str) {
    match key {
        Value::String(_) => {
            *key = serde_json::json!({
                "default": [new_default],
                "shifted": [new_shifted],
            });
        }
        Value::Object(map) => {
            set_first_alternate(map, "default", new_default);
            set_first_alternate(map, "shifted", new_shifted);
        }
        _ => {}
    }
}

fn set_first_alternate(map: &mut serde_json::Map<String, Value>, field: &str, value: &str) {
    match map.get_mut(field).and_then(Value::as_array_mut) {
        Some(arr) if !arr.is_empty() => {
            arr[0] = Value::String(value.to_string());
        }
        Some(arr) => {
            arr.push(Value::String(value.to_string()));
        }
        None => {
            map.insert(field.to_string(), Value::Array(vec![Value::String(value.to_string())]));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn transforms_bare_string_key_into_an_object() {
        let base = json!({
            "alphabetic": [["n"], [], []],
            "special": [],
        });
        let mut mapping = LetterMapping::new();
        mapping.insert('n', ("נ".to_string(), "ן".to_string()));
        let out = apply_mapping(&base, &mapping);
        assert_eq!(out["alphabetic"][0][0], json!({"default": ["נ"], "shifted": ["ן"]}));
    }

    #[test]
    fn preserves_extra_alternates_past_index_zero() {
        let base = json!({
            "alphabetic": [[{"default": ["n", "ñ"], "shifted": ["N", "Ñ"]}], [], []],
            "special": [],
        });
        let mut mapping = LetterMapping::new();
        mapping.insert('n', ("נ".to_string(), "ן".to_string()));
        let out = apply_mapping(&base, &mapping);
        assert_eq!(out["alphabetic"][0][0]["default"], json!(["נ", "ñ"]));
        assert_eq!(out["alphabetic"][0][0]["shifted"], json!(["ן", "Ñ"]));
    }

    #[test]
    fn preserves_other_fields_on_the_key_object() {
        let base = json!({
            "alphabetic": [[{"default": ["n"], "shifted": ["N"], "keyCode": 49}], [], []],
            "special": [],
        });
        let mut mapping = LetterMapping::new();
        mapping.insert('n', ("x".to_string(), "X".to_string()));
        let out = apply_mapping(&base, &mapping);
        assert_eq!(out["alphabetic"][0][0]["keyCode"], json!(49));
    }

    #[test]
    fn special_keys_are_never_touched() {
        let base = json!({
            "alphabetic": [[{"special": "shift"}], [], []],
            "special": [{"special": "enter"}],
        });
        let mut mapping = LetterMapping::new();
        mapping.insert('s', ("x".to_string(), "X".to_string()));
        let out = apply_mapping(&base, &mapping);
        assert_eq!(out, base);
    }

    #[test]
    fn build_mapping_skips_position_with_missing_override_row() {
        let base = json!({"alphabetic": [["n"], ["a"]], "special": []});
        let override_layout = json!({"alphabetic": [[{"default": ["x"], "shifted": ["X"]}]], "special": []});
        let mapping = build_mapping(&base, &override_layout);
        assert!(mapping.contains_key(&'n'));
        assert!(!mapping.contains_key(&'a'));
    }

    #[test]
    fn build_mapping_skips_override_key_without_default() {
        let base = json!({"alphabetic": [["n"]], "special": []});
        let override_layout = json!({"alphabetic": [[{"shifted": ["X"]}]], "special": []});
        let mapping = build_mapping(&base, &override_layout);
        assert!(mapping.is_empty());
    }

    #[test]
    fn idempotent_when_override_mapping_reapplied() {
        let base = json!({
            "alphabetic": [["n"], [], []],
            "special": [],
        });
        let override_layout = json!({
            "alphabetic": [[{"default": ["נ"], "shifted": ["ן"]}], [], []],
            "special": [],
        });
        let mapping = build_mapping(&base, &override_layout);
        let once = apply_mapping(&base, &mapping);

        // Re-deriving the mapping from the already-patched layout and
        // re-applying it must be a no-op.
        let mapping2 = build_mapping(&once, &override_layout);
        let twice = apply_mapping(&once, &mapping2);
        assert_eq!(once, twice);
    }
}
