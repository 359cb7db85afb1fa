//! Preview field derivation from item content.
//!
//! # Responsibility
//! - Keep `expr`/`samples` in sync with the nested content payload of curves
//!   and surfaces.
//!
//! # Invariants
//! - Pure: no I/O, no clock, same input gives same output.
//! - A value the content does not provide never clears a previous value.
//! - Equations and arrays are returned untouched.

use crate::model::item::{ItemType, ParametricPreview};
use serde_json::{Map, Value};

const SURFACE_EXPR_KEYS: [&str; 3] = ["expr", "zExpr", "formula"];
const SURFACE_SAMPLE_KEYS: [&str; 2] = ["samples", "nx"];
const CURVE_SAMPLE_KEYS: [&str; 3] = ["samples", "nSamples", "n"];
const CURVE_COMPONENTS: [(&str, [&str; 2]); 3] = [
    ("x", ["xExpr", "x"]),
    ("y", ["yExpr", "y"]),
    ("z", ["zExpr", "z"]),
];

/// Re-derives preview fields of `kind` from `content`.
///
/// Rules:
/// - `surface3d`: `expr` from the first of `expr`, `zExpr`, `formula`;
///   `samples` from `samples`, then `nx`.
/// - `curve3d`: `samples` from `samples`, `nSamples`, `n`; `expr` synthesized
///   as `x(t)=.., y(t)=.., z(t)=..` from the components present.
/// - Non-object content derives nothing.
pub fn derive_preview(
    kind: ItemType,
    content: &Value,
    previous: &ParametricPreview,
) -> ParametricPreview {
    let Some(fields) = content.as_object() else {
        return previous.clone();
    };

    match kind {
        ItemType::Surface3d => ParametricPreview {
            expr: first_text(fields, &SURFACE_EXPR_KEYS).or_else(|| previous.expr.clone()),
            samples: first_count(fields, &SURFACE_SAMPLE_KEYS).or(previous.samples),
        },
        ItemType::Curve3d => ParametricPreview {
            expr: curve_expr(fields).or_else(|| previous.expr.clone()),
            samples: first_count(fields, &CURVE_SAMPLE_KEYS).or(previous.samples),
        },
        ItemType::Equation | ItemType::Array3d => previous.clone(),
    }
}

/// Joins the curve components present in `fields`.
///
/// A missing component is left out of the string rather than defaulted to
/// `0`. Returns `None` when no component is present.
pub fn curve_expr(fields: &Map<String, Value>) -> Option<String> {
    let parts = CURVE_COMPONENTS
        .iter()
        .filter_map(|(axis, keys)| first_text(fields, keys).map(|expr| format!("{axis}(t)={expr}")))
        .collect::<Vec<_>>();

    if parts.is_empty() {
        None
    } else {
        Some(parts.join(", "))
    }
}

fn first_text(fields: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| fields.get(*key).and_then(text_value))
}

fn first_count(fields: &Map<String, Value>, keys: &[&str]) -> Option<u32> {
    keys.iter().find_map(|key| fields.get(*key).and_then(count_value))
}

/// Trimmed non-blank string, or a number rendered as text.
fn text_value(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => {
            let trimmed = text.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }
        Value::Number(number) => Some(number.to_string()),
        _ => None,
    }
}

/// Non-negative integer (or integral float) that fits `u32`.
fn count_value(value: &Value) -> Option<u32> {
    if let Some(integer) = value.as_u64() {
        return u32::try_from(integer).ok();
    }
    let float = value.as_f64()?;
    let in_range = float >= 0.0 && float <= f64::from(u32::MAX);
    (in_range && float.fract() == 0.0).then_some(float as u32)
}
