//! Vault item domain model.
//!
//! # Responsibility
//! - Define the canonical record for equations, curves, surfaces and arrays.
//! - Keep per-type preview fields inside a typed body so that illegal
//!   combinations (an array carrying a formula) cannot be represented.
//! - Generate the flat camelCase wire/storage projection from the body.
//!
//! # Invariants
//! - `id` is never nil and never reused for another item.
//! - `tags` are trimmed, non-blank and deduplicated in first-seen order.
//! - Decoding the flat projection drops fields the decoded type does not carry.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Stable identifier of one vault item.
pub type ItemId = Uuid;

/// Identity owning a partition of vault items.
///
/// Supplied by the token-resolution layer and trusted as-is by core.
pub type OwnerId = String;

/// Closed set of mathematical object kinds stored in the vault.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemType {
    /// Single formula such as `y = x^2`.
    Equation,
    /// Parametric curve `(x(t), y(t), z(t))`.
    Curve3d,
    /// Surface `z = f(x, y)`.
    Surface3d,
    /// Dense array stored as `content[z][y][x]`.
    Array3d,
}

impl ItemType {
    pub const ALL: [ItemType; 4] = [
        ItemType::Equation,
        ItemType::Curve3d,
        ItemType::Surface3d,
        ItemType::Array3d,
    ];

    /// Wire name, also used as the persisted `type` column value.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Equation => "equation",
            Self::Curve3d => "curve3d",
            Self::Surface3d => "surface3d",
            Self::Array3d => "array3d",
        }
    }

    /// Parses a wire name, ignoring surrounding whitespace.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "equation" => Some(Self::Equation),
            "curve3d" => Some(Self::Curve3d),
            "surface3d" => Some(Self::Surface3d),
            "array3d" => Some(Self::Array3d),
            _ => None,
        }
    }

    /// Title assigned on create when the payload carries none.
    pub fn default_title(self) -> &'static str {
        match self {
            Self::Equation => "Equation",
            Self::Curve3d => "3D Curve",
            Self::Surface3d => "3D Surface",
            Self::Array3d => "3D Array",
        }
    }
}

impl Display for ItemType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Preview fields shared by curves and surfaces.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParametricPreview {
    /// Human-readable expression used by listings and search.
    pub expr: Option<String>,
    /// Resolution hint for renderers.
    pub samples: Option<u32>,
}

/// Array metadata. `None` sizes are unknown, never zero-filled.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArrayShape {
    pub axis_order: Option<String>,
    pub size_x: Option<u32>,
    pub size_y: Option<u32>,
    pub size_z: Option<u32>,
}

impl ArrayShape {
    /// Returns whether all three sizes are known.
    pub fn is_complete(&self) -> bool {
        self.size_x.is_some() && self.size_y.is_some() && self.size_z.is_some()
    }

    /// `WxHxD` label, only when all three sizes are known.
    pub fn dims_label(&self) -> Option<String> {
        match (self.size_x, self.size_y, self.size_z) {
            (Some(x), Some(y), Some(z)) => Some(format!("{x}x{y}x{z}")),
            _ => None,
        }
    }
}

/// Type-specific part of a vault item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemBody {
    Equation { formula: Option<String> },
    Curve3d(ParametricPreview),
    Surface3d(ParametricPreview),
    Array3d(ArrayShape),
}

/// Union of every body variant's fields.
///
/// Used as the flat projection and as scratch space while reconciling;
/// [`ItemBody::from_flat`] keeps only what the chosen type carries.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FlatFields {
    pub formula: Option<String>,
    pub expr: Option<String>,
    pub samples: Option<u32>,
    pub axis_order: Option<String>,
    pub size_x: Option<u32>,
    pub size_y: Option<u32>,
    pub size_z: Option<u32>,
}

impl ItemBody {
    /// Creates a body of the given type with every field unknown.
    pub fn empty(kind: ItemType) -> Self {
        Self::from_flat(kind, FlatFields::default())
    }

    pub fn kind(&self) -> ItemType {
        match self {
            Self::Equation { .. } => ItemType::Equation,
            Self::Curve3d(_) => ItemType::Curve3d,
            Self::Surface3d(_) => ItemType::Surface3d,
            Self::Array3d(_) => ItemType::Array3d,
        }
    }

    /// Builds the variant for `kind`, dropping fields it does not carry.
    pub fn from_flat(kind: ItemType, fields: FlatFields) -> Self {
        let preview = ParametricPreview {
            expr: fields.expr,
            samples: fields.samples,
        };
        match kind {
            ItemType::Equation => Self::Equation {
                formula: fields.formula,
            },
            ItemType::Curve3d => Self::Curve3d(preview),
            ItemType::Surface3d => Self::Surface3d(preview),
            ItemType::Array3d => Self::Array3d(ArrayShape {
                axis_order: fields.axis_order,
                size_x: fields.size_x,
                size_y: fields.size_y,
                size_z: fields.size_z,
            }),
        }
    }

    pub fn to_flat(&self) -> FlatFields {
        match self {
            Self::Equation { formula } => FlatFields {
                formula: formula.clone(),
                ..FlatFields::default()
            },
            Self::Curve3d(preview) | Self::Surface3d(preview) => FlatFields {
                expr: preview.expr.clone(),
                samples: preview.samples,
                ..FlatFields::default()
            },
            Self::Array3d(shape) => FlatFields {
                axis_order: shape.axis_order.clone(),
                size_x: shape.size_x,
                size_y: shape.size_y,
                size_z: shape.size_z,
                ..FlatFields::default()
            },
        }
    }

    pub fn preview(&self) -> Option<&ParametricPreview> {
        match self {
            Self::Curve3d(preview) | Self::Surface3d(preview) => Some(preview),
            _ => None,
        }
    }

    pub fn preview_mut(&mut self) -> Option<&mut ParametricPreview> {
        match self {
            Self::Curve3d(preview) | Self::Surface3d(preview) => Some(preview),
            _ => None,
        }
    }

    pub fn shape(&self) -> Option<&ArrayShape> {
        match self {
            Self::Array3d(shape) => Some(shape),
            _ => None,
        }
    }
}

/// Validation failures for vault items.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemValidationError {
    NilId,
    BlankOwner,
    BlankTitle,
    /// Tags contain blank, untrimmed or duplicate values.
    UnnormalizedTags,
}

impl Display for ItemValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NilId => write!(f, "item id must not be nil"),
            Self::BlankOwner => write!(f, "owner id must not be blank"),
            Self::BlankTitle => write!(f, "title must not be blank"),
            Self::UnnormalizedTags => {
                write!(f, "tags must be trimmed, non-blank and unique")
            }
        }
    }
}

impl Error for ItemValidationError {}

/// Canonical vault record.
///
/// Serializes through [`VaultItemRecord`], the flat projection shared by the
/// wire format and the SQLite backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "VaultItemRecord", try_from = "VaultItemRecord")]
pub struct VaultItem {
    pub id: ItemId,
    pub owner_id: OwnerId,
    pub title: String,
    pub body: ItemBody,
    pub tags: Vec<String>,
    /// Full type-specific payload, opaque to core apart from derivation keys.
    pub content: Option<Value>,
    /// Ordered opaque references to other resources.
    pub links: Vec<Value>,
    /// Unix epoch milliseconds of the last write.
    pub updated_at: i64,
}

impl VaultItem {
    pub fn kind(&self) -> ItemType {
        self.body.kind()
    }

    pub fn formula(&self) -> Option<&str> {
        match &self.body {
            ItemBody::Equation { formula } => formula.as_deref(),
            _ => None,
        }
    }

    pub fn expr(&self) -> Option<&str> {
        self.body.preview().and_then(|preview| preview.expr.as_deref())
    }

    pub fn samples(&self) -> Option<u32> {
        self.body.preview().and_then(|preview| preview.samples)
    }

    pub fn shape(&self) -> Option<&ArrayShape> {
        self.body.shape()
    }

    /// Validates identity, title and tag normalization.
    pub fn validate(&self) -> Result<(), ItemValidationError> {
        if self.id.is_nil() {
            return Err(ItemValidationError::NilId);
        }
        if self.owner_id.trim().is_empty() {
            return Err(ItemValidationError::BlankOwner);
        }
        if self.title.trim().is_empty() {
            return Err(ItemValidationError::BlankTitle);
        }
        if normalize_tags(&self.tags) != self.tags {
            return Err(ItemValidationError::UnnormalizedTags);
        }
        Ok(())
    }
}

/// Flat camelCase projection of a [`VaultItem`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VaultItemRecord {
    pub id: ItemId,
    pub owner_id: OwnerId,
    pub title: String,
    #[serde(rename = "type")]
    pub kind: ItemType,
    #[serde(default)]
    pub formula: Option<String>,
    #[serde(default)]
    pub expr: Option<String>,
    #[serde(default)]
    pub samples: Option<u32>,
    #[serde(default)]
    pub axis_order: Option<String>,
    #[serde(default)]
    pub size_x: Option<u32>,
    #[serde(default)]
    pub size_y: Option<u32>,
    #[serde(default)]
    pub size_z: Option<u32>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub content: Option<Value>,
    #[serde(default)]
    pub links: Vec<Value>,
    pub updated_at: i64,
}

impl From<VaultItem> for VaultItemRecord {
    fn from(item: VaultItem) -> Self {
        let kind = item.kind();
        let fields = item.body.to_flat();
        Self {
            id: item.id,
            owner_id: item.owner_id,
            title: item.title,
            kind,
            formula: fields.formula,
            expr: fields.expr,
            samples: fields.samples,
            axis_order: fields.axis_order,
            size_x: fields.size_x,
            size_y: fields.size_y,
            size_z: fields.size_z,
            tags: item.tags,
            content: item.content,
            links: item.links,
            updated_at: item.updated_at,
        }
    }
}

impl TryFrom<VaultItemRecord> for VaultItem {
    type Error = ItemValidationError;

    fn try_from(record: VaultItemRecord) -> Result<Self, Self::Error> {
        let fields = FlatFields {
            formula: record.formula,
            expr: record.expr,
            samples: record.samples,
            axis_order: record.axis_order,
            size_x: record.size_x,
            size_y: record.size_y,
            size_z: record.size_z,
        };
        let item = Self {
            id: record.id,
            owner_id: record.owner_id,
            title: record.title,
            body: ItemBody::from_flat(record.kind, fields),
            tags: record.tags,
            content: record.content,
            links: record.links,
            updated_at: record.updated_at,
        };
        item.validate()?;
        Ok(item)
    }
}

/// Trims, drops blanks and deduplicates tags, keeping first-seen order.
pub fn normalize_tags<S: AsRef<str>>(tags: &[S]) -> Vec<String> {
    let mut seen = HashSet::new();
    tags.iter()
        .map(|tag| tag.as_ref().trim())
        .filter(|tag| !tag.is_empty())
        .filter(|tag| seen.insert(*tag))
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::{normalize_tags, ArrayShape, FlatFields, ItemBody, ItemType};

    #[test]
    fn normalize_tags_trims_dedups_and_keeps_first_seen_order() {
        let tags = normalize_tags(&["a", " a ", "b", ""]);
        assert_eq!(tags, vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn from_flat_drops_fields_foreign_to_the_type() {
        let fields = FlatFields {
            formula: Some("y=x".to_string()),
            expr: Some("sin(x)".to_string()),
            size_x: Some(4),
            ..FlatFields::default()
        };
        let body = ItemBody::from_flat(ItemType::Array3d, fields);
        let flat = body.to_flat();
        assert_eq!(flat.formula, None);
        assert_eq!(flat.expr, None);
        assert_eq!(flat.size_x, Some(4));
    }

    #[test]
    fn dims_label_requires_all_three_sizes() {
        let mut shape = ArrayShape {
            size_x: Some(5),
            size_y: Some(5),
            ..ArrayShape::default()
        };
        assert_eq!(shape.dims_label(), None);
        shape.size_z = Some(5);
        assert_eq!(shape.dims_label().as_deref(), Some("5x5x5"));
    }
}
