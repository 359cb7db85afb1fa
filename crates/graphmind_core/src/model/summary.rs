//! Lightweight listing projection.

use crate::model::item::{ItemId, ItemType, VaultItem};
use serde::{Deserialize, Serialize};

/// List-view subset of a vault item: no `content`, no `links`.
///
/// Array items can still show their dimensions from `sizeX/Y/Z`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VaultItemSummary {
    pub id: ItemId,
    pub title: String,
    #[serde(rename = "type")]
    pub kind: ItemType,
    pub formula: Option<String>,
    pub expr: Option<String>,
    pub samples: Option<u32>,
    pub axis_order: Option<String>,
    pub size_x: Option<u32>,
    pub size_y: Option<u32>,
    pub size_z: Option<u32>,
    pub tags: Vec<String>,
    pub updated_at: i64,
}

impl From<&VaultItem> for VaultItemSummary {
    fn from(item: &VaultItem) -> Self {
        let fields = item.body.to_flat();
        Self {
            id: item.id,
            title: item.title.clone(),
            kind: item.kind(),
            formula: fields.formula,
            expr: fields.expr,
            samples: fields.samples,
            axis_order: fields.axis_order,
            size_x: fields.size_x,
            size_y: fields.size_y,
            size_z: fields.size_z,
            tags: item.tags.clone(),
            updated_at: item.updated_at,
        }
    }
}
