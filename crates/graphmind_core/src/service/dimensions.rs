//! Array dimension inference.
//!
//! Array content is stored as `content[z][y][x]`: the outer sequence walks
//! depth, its first element walks rows, and that element's first element
//! walks columns.
//!
//! # Invariants
//! - Complete shapes are returned unchanged (idempotent).
//! - An inferred size of 0 carries no information and never replaces a
//!   known size.

use crate::model::item::{ArrayShape, ItemBody};
use serde_json::Value;

pub const DEFAULT_AXIS_ORDER: &str = "zyx";

/// Fills unknown sizes of `shape` from the nesting of `content`.
///
/// Does nothing unless some size is unknown and `content` is a non-empty
/// array. When inference runs, `axis_order` defaults to `zyx`.
pub fn infer_dimensions(shape: &ArrayShape, content: Option<&Value>) -> ArrayShape {
    if shape.is_complete() {
        return shape.clone();
    }
    let Some(Value::Array(planes)) = content else {
        return shape.clone();
    };
    if planes.is_empty() {
        return shape.clone();
    }

    let rows = planes.first().and_then(Value::as_array);
    let height = rows.map_or(0, Vec::len);
    let width = rows
        .and_then(|rows| rows.first())
        .and_then(Value::as_array)
        .map_or(0, Vec::len);

    ArrayShape {
        axis_order: shape
            .axis_order
            .clone()
            .or_else(|| Some(DEFAULT_AXIS_ORDER.to_string())),
        size_x: prefer_inferred(width, shape.size_x),
        size_y: prefer_inferred(height, shape.size_y),
        size_z: prefer_inferred(planes.len(), shape.size_z),
    }
}

/// Runs [`infer_dimensions`] on array bodies; other bodies pass through.
pub fn infer_body_dimensions(body: ItemBody, content: Option<&Value>) -> ItemBody {
    match body {
        ItemBody::Array3d(shape) => ItemBody::Array3d(infer_dimensions(&shape, content)),
        other => other,
    }
}

fn prefer_inferred(inferred: usize, known: Option<u32>) -> Option<u32> {
    if inferred == 0 {
        return known;
    }
    u32::try_from(inferred).ok().or(known)
}
