//! Small set of structural helpers layered on top of [`serde_json::Value`].
//!
//! `Value` itself is already the tagged `{Str, Obj, Arr, Num, Bool, Null}`
//! variant the layout model needs; compiling `serde_json` with the
//! `preserve_order` feature makes its `Map` an `indexmap::IndexMap` under the
//! hood, so object field order survives a decode → mutate → encode round
//! trip without any extra bookkeeping here.

use serde_json::Value;

/// A key in an `alphabetic` row is either a bare string or an object. This
/// extracts the base-letter identity: `default[0]` when the key is an
/// object, the string itself when it is bare, lowercase-folded.
pub fn base_letter(key: &Value) -> Option<char> {
    let grapheme = match key {
        Value::String(s) => s.as_str(),
        Value::Object(map) => map
            .get("default")
            .and_then(Value::as_array)
            .and_then(|arr| arr.first())
            .and_then(Value::as_str)?,
        _ => return None,
    };
    grapheme.chars().next().map(|c| c.to_lowercase().next().unwrap_or(c))
}

/// True when a key object carries a `special` tag (a pure special key, never
/// part of the letter mapping regardless of what row it's found in).
pub fn is_special_key(key: &Value) -> bool {
    matches!(key, Value::Object(map) if map.contains_key("special"))
}

/// The first grapheme of `default`/`shifted` of an override key, if present.
pub fn override_alternates(key: &Value) -> Option<(String, String)> {
    let map = key.as_object()?;
    let default0 = map
        .get("default")
        .and_then(Value::as_array)
        .and_then(|a| a.first())
        .and_then(Value::as_str)?
        .to_string();
    let shifted0 = map
        .get("shifted")
        .and_then(Value::as_array)
        .and_then(|a| a.first())
        .and_then(Value::as_str)
        .map(str::to_string)
        // Override files that omit `shifted` entirely fall back to the
        // unshifted grapheme; see DESIGN.md Open Question #3.
        .unwrap_or_else(|| default0.clone());
    Some((default0, shifted0))
}

/// Borrow the `alphabetic` field as a slice of row arrays, or `None` if the
/// structural gate fails: `alphabetic` must be an array of three non-empty
/// arrays, and `special` must be present as an array (a layout object is
/// only a candidate once both required fields check out).
pub fn alphabetic_rows(layout: &Value) -> Option<&Vec<Value>> {
    special_array(layout)?;

    let rows = layout.get("alphabetic")?.as_array()?;
    if rows.len() != 3 {
        return None;
    }
    for row in rows {
        let row = row.as_array()?;
        if row.is_empty() {
            return None;
        }
    }
    Some(rows)
}

/// Borrow the `special` field as an array, or `None` if missing/wrong shape.
pub fn special_array(layout: &Value) -> Option<&Vec<Value>> {
    layout.get("special")?.as_array()
}
