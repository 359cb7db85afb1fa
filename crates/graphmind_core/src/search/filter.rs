//! Tag/free-text filtering and recency ordering.
//!
//! # Invariants
//! - Tag filter is exact membership after trimming the requested tag.
//! - Text filter is case-insensitive substring match against title, type,
//!   formula, expr, the joined tags, and the `WxHxD` label of arrays.
//! - Ordering is `updated_at` descending, ties broken by id ascending.
//! - Blank filters match everything.

use crate::model::item::{ItemType, VaultItem};
use std::cmp::Ordering;

/// Listing filters. Both are optional; blank values are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VaultQuery {
    pub tag: Option<String>,
    pub text: Option<String>,
}

impl VaultQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    fn tag_filter(&self) -> Option<&str> {
        self.tag
            .as_deref()
            .map(str::trim)
            .filter(|value| !value.is_empty())
    }

    fn text_filter(&self) -> Option<String> {
        self.text
            .as_deref()
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(str::to_lowercase)
    }
}

/// Applies `query` to `items` and returns them newest first.
pub fn filter_items(items: Vec<VaultItem>, query: &VaultQuery) -> Vec<VaultItem> {
    let tag = query.tag_filter();
    let needle = query.text_filter();

    let mut matched: Vec<VaultItem> = items
        .into_iter()
        .filter(|item| tag.map_or(true, |tag| item.tags.iter().any(|t| t == tag)))
        .filter(|item| {
            needle
                .as_deref()
                .map_or(true, |needle| matches_text(item, needle))
        })
        .collect();

    sort_by_recency(&mut matched);
    matched
}

/// Sorts newest first; equal timestamps fall back to id ascending.
pub fn sort_by_recency(items: &mut [VaultItem]) {
    items.sort_by(compare_recency);
}

fn compare_recency(left: &VaultItem, right: &VaultItem) -> Ordering {
    right
        .updated_at
        .cmp(&left.updated_at)
        .then_with(|| left.id.cmp(&right.id))
}

fn matches_text(item: &VaultItem, needle: &str) -> bool {
    searchable_fields(item)
        .iter()
        .any(|field| field.to_lowercase().contains(needle))
}

fn searchable_fields(item: &VaultItem) -> Vec<String> {
    let mut fields = vec![item.title.clone(), item.kind().as_str().to_string()];
    fields.extend(item.formula().map(str::to_string));
    fields.extend(item.expr().map(str::to_string));
    fields.push(item.tags.join(" "));
    if item.kind() == ItemType::Array3d {
        fields.extend(item.shape().and_then(|shape| shape.dims_label()));
    }
    fields
}

#[cfg(test)]
mod tests {
    use super::{filter_items, sort_by_recency, VaultQuery};
    use crate::model::item::{ArrayShape, ItemBody, ItemType, VaultItem};
    use uuid::Uuid;

    fn item(title: &str, body: ItemBody, tags: &[&str], updated_at: i64) -> VaultItem {
        VaultItem {
            id: Uuid::new_v4(),
            owner_id: "owner-a".to_string(),
            title: title.to_string(),
            body,
            tags: tags.iter().map(|tag| tag.to_string()).collect(),
            content: None,
            links: Vec::new(),
            updated_at,
        }
    }

    fn array(x: u32, y: u32, z: u32) -> ItemBody {
        ItemBody::Array3d(ArrayShape {
            axis_order: Some("zyx".to_string()),
            size_x: Some(x),
            size_y: Some(y),
            size_z: Some(z),
        })
    }

    #[test]
    fn blank_query_keeps_everything_sorted_newest_first() {
        let old = item("Old", ItemBody::empty(ItemType::Equation), &[], 10);
        let new = item("New", ItemBody::empty(ItemType::Curve3d), &[], 20);

        let listed = filter_items(
            vec![old.clone(), new.clone()],
            &VaultQuery::new().with_tag("  ").with_text(""),
        );
        assert_eq!(listed, vec![new, old]);
    }

    #[test]
    fn tag_filter_is_exact_membership() {
        let tagged = item("A", ItemBody::empty(ItemType::Equation), &["calc"], 1);
        let other = item("B", ItemBody::empty(ItemType::Equation), &["calculus"], 2);

        let listed = filter_items(
            vec![tagged.clone(), other],
            &VaultQuery::new().with_tag(" calc "),
        );
        assert_eq!(listed, vec![tagged]);
    }

    #[test]
    fn text_filter_matches_dims_label_only_for_arrays() {
        let cube = item("Cube", array(5, 5, 5), &[], 1);
        let flat = item("Flat", array(5, 5, 1), &[], 2);
        let titled = item("5x5", ItemBody::empty(ItemType::Equation), &[], 3);

        let listed = filter_items(
            vec![cube.clone(), flat, titled],
            &VaultQuery::new().with_text("5X5X5"),
        );
        assert_eq!(listed, vec![cube]);
    }

    #[test]
    fn text_filter_searches_type_and_tags() {
        let surface = item(
            "Saddle",
            ItemBody::empty(ItemType::Surface3d),
            &["Geometry"],
            1,
        );
        let equation = item("Line", ItemBody::empty(ItemType::Equation), &[], 2);
        let items = vec![surface.clone(), equation];

        let by_type = filter_items(items.clone(), &VaultQuery::new().with_text("surface"));
        assert_eq!(by_type, vec![surface.clone()]);

        let by_tag = filter_items(items, &VaultQuery::new().with_text("geometry"));
        assert_eq!(by_tag, vec![surface]);
    }

    #[test]
    fn equal_timestamps_break_ties_by_id() {
        let mut items = vec![
            item("a", ItemBody::empty(ItemType::Equation), &[], 5),
            item("b", ItemBody::empty(ItemType::Equation), &[], 5),
            item("c", ItemBody::empty(ItemType::Equation), &[], 5),
        ];
        sort_by_recency(&mut items);
        assert!(items.windows(2).all(|pair| pair[0].id < pair[1].id));
    }
}
