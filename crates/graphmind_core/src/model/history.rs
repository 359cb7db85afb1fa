//! Append-only history events.
//!
//! # Invariants
//! - Events are immutable once appended.
//! - `scope` and `type` serialize as upper-case tags (`VAULT`, `CREATE`).

use crate::model::item::OwnerId;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Area of the product an event belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HistoryScope {
    Vault,
    Studio,
}

impl HistoryScope {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Vault => "VAULT",
            Self::Studio => "STUDIO",
        }
    }

    /// Case-insensitive parse.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_uppercase().as_str() {
            "VAULT" => Some(Self::Vault),
            "STUDIO" => Some(Self::Studio),
            _ => None,
        }
    }
}

/// What happened to the entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HistoryKind {
    Create,
    Update,
    Snapshot,
}

impl HistoryKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Create => "CREATE",
            Self::Update => "UPDATE",
            Self::Snapshot => "SNAPSHOT",
        }
    }

    /// Case-insensitive parse.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_uppercase().as_str() {
            "CREATE" => Some(Self::Create),
            "UPDATE" => Some(Self::Update),
            "SNAPSHOT" => Some(Self::Snapshot),
            _ => None,
        }
    }
}

/// One history log entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEvent {
    pub id: Uuid,
    pub owner_id: OwnerId,
    pub scope: HistoryScope,
    pub entity_id: String,
    #[serde(rename = "type")]
    pub kind: HistoryKind,
    pub payload: Value,
    /// Unix epoch milliseconds.
    pub created_at: i64,
}

impl HistoryEvent {
    /// Creates an event with a freshly generated id.
    pub fn new(
        owner_id: impl Into<OwnerId>,
        scope: HistoryScope,
        entity_id: impl Into<String>,
        kind: HistoryKind,
        payload: Value,
        created_at: i64,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            owner_id: owner_id.into(),
            scope,
            entity_id: entity_id.into(),
            kind,
            payload,
            created_at,
        }
    }
}
