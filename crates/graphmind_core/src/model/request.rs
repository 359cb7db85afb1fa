//! Inbound write payloads.
//!
//! # Responsibility
//! - Mirror the create/replace/patch request bodies accepted by the boundary.
//! - Keep "omitted" and "explicit null" distinguishable per field.
//!
//! # Invariants
//! - `type` is carried as raw text; it is parsed (and rejected) during
//!   reconciliation, before anything is written.

use crate::model::item::ItemType;
use crate::model::patch::Patch;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Create or full-replace body.
///
/// On create only `type` is required. On replace every field is optional and
/// omitted or `null` fields keep the previous value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VaultUpsert {
    #[serde(default, skip_serializing_if = "Patch::is_absent")]
    pub title: Patch<String>,
    #[serde(default, rename = "type", skip_serializing_if = "Patch::is_absent")]
    pub kind: Patch<String>,
    #[serde(default, skip_serializing_if = "Patch::is_absent")]
    pub formula: Patch<String>,
    #[serde(default, skip_serializing_if = "Patch::is_absent")]
    pub expr: Patch<String>,
    #[serde(default, skip_serializing_if = "Patch::is_absent")]
    pub samples: Patch<u32>,
    #[serde(default, skip_serializing_if = "Patch::is_absent")]
    pub axis_order: Patch<String>,
    #[serde(default, skip_serializing_if = "Patch::is_absent")]
    pub size_x: Patch<u32>,
    #[serde(default, skip_serializing_if = "Patch::is_absent")]
    pub size_y: Patch<u32>,
    #[serde(default, skip_serializing_if = "Patch::is_absent")]
    pub size_z: Patch<u32>,
    /// `null` elements are skipped during normalization.
    #[serde(default, skip_serializing_if = "Patch::is_absent")]
    pub tags: Patch<Vec<Option<String>>>,
    #[serde(default, skip_serializing_if = "Patch::is_absent")]
    pub content: Patch<Value>,
    #[serde(default, skip_serializing_if = "Patch::is_absent")]
    pub links: Patch<Vec<Value>>,
}

/// Generic item patch (`PATCH /items/{id}`).
///
/// Same field set as [`VaultUpsert`]; any subset may be sent.
pub type VaultItemPatch = VaultUpsert;

impl VaultUpsert {
    /// Starts a payload for the given type with every other field omitted.
    pub fn new(kind: ItemType) -> Self {
        Self {
            kind: Patch::Set(kind.as_str().to_string()),
            ..Self::default()
        }
    }

    /// Names of fields sent as explicit `null`.
    pub fn explicit_nulls(&self) -> Vec<&'static str> {
        let fields = [
            ("title", self.title.is_null()),
            ("type", self.kind.is_null()),
            ("formula", self.formula.is_null()),
            ("expr", self.expr.is_null()),
            ("samples", self.samples.is_null()),
            ("axisOrder", self.axis_order.is_null()),
            ("sizeX", self.size_x.is_null()),
            ("sizeY", self.size_y.is_null()),
            ("sizeZ", self.size_z.is_null()),
            ("tags", self.tags.is_null()),
            ("content", self.content.is_null()),
            ("links", self.links.is_null()),
        ];
        fields
            .into_iter()
            .filter_map(|(name, is_null)| is_null.then_some(name))
            .collect()
    }
}

/// Title/tags edit, plus `formula` for equations only.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VaultMetaPatch {
    #[serde(default, skip_serializing_if = "Patch::is_absent")]
    pub title: Patch<String>,
    /// `null` elements are skipped during normalization.
    #[serde(default, skip_serializing_if = "Patch::is_absent")]
    pub tags: Patch<Vec<Option<String>>>,
    /// Ignored unless the item is an equation.
    #[serde(default, skip_serializing_if = "Patch::is_absent")]
    pub formula: Patch<String>,
}

impl VaultMetaPatch {
    /// Names of fields sent as explicit `null`.
    pub fn explicit_nulls(&self) -> Vec<&'static str> {
        [
            ("title", self.title.is_null()),
            ("tags", self.tags.is_null()),
            ("formula", self.formula.is_null()),
        ]
        .into_iter()
        .filter_map(|(name, is_null)| is_null.then_some(name))
        .collect()
    }
}

/// Content-only replacement.
///
/// Accepts either the content tree itself or a `{ "content": <tree> }`
/// wrapper; see [`ContentPatch::from_body`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContentPatch {
    /// `None` keeps the previous content.
    pub content: Option<Value>,
}

impl ContentPatch {
    pub fn new(content: Value) -> Self {
        Self::from_body(Value::Object(
            [("content".to_string(), content)].into_iter().collect(),
        ))
    }

    /// Unwraps a request body.
    ///
    /// An object with a `content` key is a wrapper; anything else is the
    /// content tree itself. JSON `null` (bare or wrapped) keeps the previous
    /// content.
    pub fn from_body(body: Value) -> Self {
        let content = match body {
            Value::Object(mut fields) if fields.contains_key("content") => {
                fields.remove("content")
            }
            other => Some(other),
        };
        Self {
            content: content.filter(|value| !value.is_null()),
        }
    }
}

impl<'de> Deserialize<'de> for ContentPatch {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Value::deserialize(deserializer).map(Self::from_body)
    }
}
