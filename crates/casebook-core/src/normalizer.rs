//! Normalizer — maps human-readable field labels to canonical storage keys
//! and coerces raw values to a single textual form.
//!
//! Every column in the store is TEXT, so every value that reaches the store
//! goes through [`coerce_value`] first.

use serde_json::Value;

/// Canonical storage key for a field label.
///
/// Lowercases the label, replaces every maximal run of characters outside
/// `[a-z0-9_]` with a single `_`, then strips leading and trailing `_`.
///
/// ```
/// use casebook_core::normalizer::normalize_key;
///
/// assert_eq!(normalize_key("ARREST LOCATION"), "arrest_location");
/// assert_eq!(normalize_key("CHARGE 1 STATUTE"), "charge_1_statute");
/// ```
pub fn normalize_key(label: &str) -> String {
    let mut out = String::with_capacity(label.len());
    let mut in_run = false;
    for ch in label.chars().flat_map(char::to_lowercase) {
        if ch.is_ascii_lowercase() || ch.is_ascii_digit() || ch == '_' {
            out.push(ch);
            in_run = false;
        } else if !in_run {
            out.push('_');
            in_run = true;
        }
    }
    out.trim_matches('_').to_string()
}

/// Single scalar text form of a raw source value.
///
/// Absent and `null` become `""`. Strings pass through verbatim; numbers and
/// booleans use their JSON text; arrays and objects are written as compact
/// JSON. Nothing is truncated and no locale formatting is applied.
pub fn coerce_value(raw: Option<&Value>) -> String {
    match raw {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(Value::Bool(b)) => b.to_string(),
        Some(Value::Number(n)) => n.to_string(),
        Some(other) => other.to_string(),
    }
}

/// Whitespace cleanup for text scraped from detail pages.
///
/// Newlines and tabs are dropped outright, runs of two or more spaces
/// collapse to one, and the ends are trimmed.
pub fn clean_text(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut prev_space = false;
    for ch in s.chars() {
        match ch {
            '\n' | '\r' | '\t' => {}
            ' ' => {
                if !prev_space {
                    out.push(' ');
                }
                prev_space = true;
            }
            _ => {
                out.push(ch);
                prev_space = false;
            }
        }
    }
    out.trim().to_string()
}
