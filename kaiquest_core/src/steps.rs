//! Quest step normalization.
//!
//! Quest step payloads arrive in several historical shapes: a bare list of
//! strings, objects with varying field names, or a mix. This module
//! canonicalizes them into [`CanonicalStep`] values for the presentation
//! layer. Normalization runs on every read; the raw payload is what gets
//! persisted.

use crate::types::{CanonicalStep, StepKind};
use serde_json::Value;

// Recognized field aliases, oldest shapes last
const TITLE_ALIASES: &[&str] = &["title", "step_title", "label"];
const KIND_ALIASES: &[&str] = &["type", "step_type"];
const ROW_ALIASES: &[&str] = &["grid_rows", "rows", "row"];
const COL_ALIASES: &[&str] = &["grid_cols", "cols", "col"];
const OPTION_ALIASES: &[&str] = &["options", "choices", "choice"];

/// Normalize a raw steps payload into canonical steps.
///
/// Non-array input yields an empty list. Entries that are neither strings
/// nor objects are silently skipped.
pub fn normalize_steps(raw: &Value) -> Vec<CanonicalStep> {
    let Some(items) = raw.as_array() else {
        return Vec::new();
    };
    items.iter().filter_map(normalize_entry).collect()
}

fn normalize_entry(entry: &Value) -> Option<CanonicalStep> {
    // Legacy shape: a bare string is a text step
    if let Some(title) = entry.as_str() {
        return Some(CanonicalStep {
            title: title.to_string(),
            kind: StepKind::Text,
            grid_rows: 0,
            grid_cols: 0,
            options: Vec::new(),
        });
    }

    let obj = entry.as_object()?;

    let title = first_truthy(obj, TITLE_ALIASES)
        .and_then(Value::as_str)
        .unwrap_or("")
        .to_string();

    let declared = first_truthy(obj, KIND_ALIASES)
        .and_then(Value::as_str)
        .unwrap_or("text");

    let grid_rows = first_truthy(obj, ROW_ALIASES)
        .map(coerce_dimension)
        .unwrap_or(0);
    let grid_cols = first_truthy(obj, COL_ALIASES)
        .map(coerce_dimension)
        .unwrap_or(0);

    let options = first_truthy(obj, OPTION_ALIASES)
        .map(coerce_options)
        .unwrap_or_default();

    // Legacy/partial data often declares "text" while carrying richer
    // signals. Options win over grid dimensions when both are present.
    let mut kind_name = declared;
    if kind_name == "text" {
        if !options.is_empty() {
            kind_name = "choice";
        } else if grid_rows > 0 && grid_cols > 0 {
            kind_name = "grid";
        }
    }

    let kind = match kind_name {
        "grid" if grid_rows > 0 && grid_cols > 0 => StepKind::Grid,
        "choice" if !options.is_empty() => StepKind::Choice,
        // Unknown kinds, and grid/choice declarations missing their
        // payload, all collapse to text.
        _ => StepKind::Text,
    };

    Some(CanonicalStep {
        title,
        kind,
        grid_rows,
        grid_cols,
        options,
    })
}

/// First alias whose value is present and non-empty/non-zero.
///
/// Empty strings, zeros, empty lists, `false` and `null` fall through to
/// the next alias, matching how partially-filled legacy payloads behave.
fn first_truthy<'a>(
    obj: &'a serde_json::Map<String, Value>,
    aliases: &[&str],
) -> Option<&'a Value> {
    aliases
        .iter()
        .filter_map(|key| obj.get(*key))
        .find(|value| is_truthy(value))
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(true),
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}

/// Grid dimensions: non-negative integers; non-numeric means 0
fn coerce_dimension(value: &Value) -> u32 {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f.trunc() as i64))
            .map(|v| v.max(0) as u32)
            .unwrap_or(0),
        Value::String(s) => s.trim().parse::<i64>().map(|v| v.max(0) as u32).unwrap_or(0),
        _ => 0,
    }
}

/// Options: a newline-delimited string splits into trimmed non-empty
/// lines; a list keeps its non-empty string items; anything else is empty
fn coerce_options(value: &Value) -> Vec<String> {
    match value {
        Value::String(s) => s
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect(),
        Value::Array(items) => items
            .iter()
            .filter_map(Value::as_str)
            .map(str::trim)
            .filter(|item| !item.is_empty())
            .map(str::to_string)
            .collect(),
        _ => Vec::new(),
    }
}
