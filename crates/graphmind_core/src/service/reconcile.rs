//! Upsert reconciliation.
//!
//! # Responsibility
//! - Turn every inbound write shape (create, full replace, meta patch,
//!   content patch, item patch) into one normalized [`ItemChanges`].
//! - Merge the changes over the previous record, then re-derive preview
//!   fields and array dimensions, producing the next full record.
//!
//! # Invariants
//! - `id` and `owner_id` always come from the previous record.
//! - Omitted and explicit-null fields keep their previous values; blank
//!   strings count as omitted.
//! - `formula` is written only when the resulting type is `equation`.
//! - `updated_at` never moves backwards for a record.
//! - Pure: the caller supplies the clock reading and commits the result.

use crate::model::item::{normalize_tags, ItemBody, ItemId, ItemType, VaultItem};
use crate::model::patch::Patch;
use crate::model::request::{ContentPatch, VaultMetaPatch, VaultUpsert};
use crate::service::dimensions::infer_body_dimensions;
use crate::service::preview::derive_preview;
use serde_json::Value;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Payload rejections raised before anything is merged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconcileError {
    /// Create payload has no usable `type`.
    MissingType,
    /// `type` is outside the supported set.
    InvalidType(String),
}

impl Display for ReconcileError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingType => write!(f, "`type` is required"),
            Self::InvalidType(value) => write!(
                f,
                "unsupported type `{value}`; expected equation|curve3d|surface3d|array3d"
            ),
        }
    }
}

impl Error for ReconcileError {}

/// Normalized change set. `None` means "keep previous".
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ItemChanges {
    pub title: Option<String>,
    pub kind: Option<ItemType>,
    pub formula: Option<String>,
    pub expr: Option<String>,
    pub samples: Option<u32>,
    pub axis_order: Option<String>,
    pub size_x: Option<u32>,
    pub size_y: Option<u32>,
    pub size_z: Option<u32>,
    pub tags: Option<Vec<String>>,
    pub content: Option<Value>,
    pub links: Option<Vec<Value>>,
}

impl ItemChanges {
    /// Normalizes a create/replace/item-patch body.
    ///
    /// Fails when `type` is present but not a supported type.
    pub fn from_upsert(body: VaultUpsert) -> Result<Self, ReconcileError> {
        Ok(Self {
            title: text(body.title),
            kind: parse_kind(body.kind)?,
            formula: text(body.formula),
            expr: text(body.expr),
            samples: body.samples.into_set(),
            axis_order: text(body.axis_order),
            size_x: body.size_x.into_set(),
            size_y: body.size_y.into_set(),
            size_z: body.size_z.into_set(),
            tags: body.tags.into_set().map(tag_list),
            content: body.content.into_set().filter(|value| !value.is_null()),
            links: body.links.into_set(),
        })
    }

    pub fn from_meta(patch: VaultMetaPatch) -> Self {
        Self {
            title: text(patch.title),
            formula: text(patch.formula),
            tags: patch.tags.into_set().map(tag_list),
            ..Self::default()
        }
    }

    pub fn from_content(patch: ContentPatch) -> Self {
        Self {
            content: patch.content,
            ..Self::default()
        }
    }
}

/// Builds a new record from a create payload.
///
/// Missing fields take per-type defaults: the type's default title, empty
/// tags and links, no content.
pub fn reconcile_create(
    owner_id: &str,
    id: ItemId,
    body: VaultUpsert,
    now_ms: i64,
) -> Result<VaultItem, ReconcileError> {
    let changes = ItemChanges::from_upsert(body)?;
    let kind = changes.kind.ok_or(ReconcileError::MissingType)?;
    let blank = VaultItem {
        id,
        owner_id: owner_id.to_string(),
        title: kind.default_title().to_string(),
        body: ItemBody::empty(kind),
        tags: Vec::new(),
        content: None,
        links: Vec::new(),
        updated_at: now_ms,
    };
    Ok(merge(&blank, changes, now_ms))
}

/// Merges a full-replace or item-patch body over `previous`.
pub fn reconcile_upsert(
    previous: &VaultItem,
    body: VaultUpsert,
    now_ms: i64,
) -> Result<VaultItem, ReconcileError> {
    Ok(merge(previous, ItemChanges::from_upsert(body)?, now_ms))
}

/// Applies a title/tags/formula edit.
pub fn reconcile_meta(previous: &VaultItem, patch: VaultMetaPatch, now_ms: i64) -> VaultItem {
    merge(previous, ItemChanges::from_meta(patch), now_ms)
}

/// Replaces content and re-syncs preview fields for the existing type.
pub fn reconcile_content(previous: &VaultItem, patch: ContentPatch, now_ms: i64) -> VaultItem {
    merge(previous, ItemChanges::from_content(patch), now_ms)
}

/// The single merge engine behind every write shape.
///
/// Order: resolve type, overlay flat fields, re-project onto the resulting
/// type, derive preview from new content, infer array dimensions.
pub fn merge(previous: &VaultItem, changes: ItemChanges, now_ms: i64) -> VaultItem {
    let ItemChanges {
        title,
        kind,
        formula,
        expr,
        samples,
        axis_order,
        size_x,
        size_y,
        size_z,
        tags,
        content,
        links,
    } = changes;

    let kind = kind.unwrap_or_else(|| previous.kind());
    let mut fields = previous.body.to_flat();
    if kind == ItemType::Equation {
        fields.formula = formula.or(fields.formula);
    }
    fields.expr = expr.or(fields.expr);
    fields.samples = samples.or(fields.samples);
    fields.axis_order = axis_order.or(fields.axis_order);
    fields.size_x = size_x.or(fields.size_x);
    fields.size_y = size_y.or(fields.size_y);
    fields.size_z = size_z.or(fields.size_z);

    let mut body = ItemBody::from_flat(kind, fields);
    if let (Some(new_content), Some(preview)) = (content.as_ref(), body.preview_mut()) {
        *preview = derive_preview(kind, new_content, preview);
    }

    let content = content.or_else(|| previous.content.clone());
    let body = infer_body_dimensions(body, content.as_ref());

    VaultItem {
        id: previous.id,
        owner_id: previous.owner_id.clone(),
        title: title.unwrap_or_else(|| previous.title.clone()),
        body,
        tags: tags.unwrap_or_else(|| previous.tags.clone()),
        content,
        links: links.unwrap_or_else(|| previous.links.clone()),
        updated_at: now_ms.max(previous.updated_at),
    }
}

fn text(value: Patch<String>) -> Option<String> {
    value
        .into_set()
        .map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty())
}

fn tag_list(tags: Vec<Option<String>>) -> Vec<String> {
    normalize_tags(&tags.into_iter().flatten().collect::<Vec<_>>())
}

fn parse_kind(value: Patch<String>) -> Result<Option<ItemType>, ReconcileError> {
    match text(value) {
        None => Ok(None),
        Some(raw) => ItemType::parse(&raw)
            .map(Some)
            .ok_or(ReconcileError::InvalidType(raw)),
    }
}
