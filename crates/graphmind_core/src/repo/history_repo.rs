//! Append-only history log contracts and implementations.
//!
//! # Responsibility
//! - Append immutable events and query them per owner.
//! - Apply scope/entity/type filters and the result-size cap.
//!
//! # Invariants
//! - Query results are most-recent-first (append order, not `created_at`).
//! - Query limit is clamped to `1..=HISTORY_LIMIT_MAX`.
//! - An owner never sees another owner's events.

use crate::db::{ensure_table, SharedConnection};
use crate::model::history::{HistoryEvent, HistoryKind, HistoryScope};
use crate::repo::vault_repo::{RepoError, RepoResult};
use parking_lot::RwLock;
use rusqlite::types::Value as SqlValue;
use rusqlite::{params, params_from_iter, Row};
use std::collections::VecDeque;
use uuid::Uuid;

pub const HISTORY_DEFAULT_LIMIT: u32 = 50;
pub const HISTORY_LIMIT_MAX: u32 = 200;

/// Filters for history queries. Unset or blank filters match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HistoryQuery {
    pub scope: Option<HistoryScope>,
    pub entity_id: Option<String>,
    pub kind: Option<HistoryKind>,
    /// Maximum events to return. Defaults to 50 and clamps to `1..=200`.
    pub limit: Option<u32>,
}

impl HistoryQuery {
    fn entity_filter(&self) -> Option<&str> {
        self.entity_id
            .as_deref()
            .map(str::trim)
            .filter(|value| !value.is_empty())
    }

    fn matches(&self, owner_id: &str, event: &HistoryEvent) -> bool {
        event.owner_id == owner_id
            && self.scope.map_or(true, |scope| event.scope == scope)
            && self.kind.map_or(true, |kind| event.kind == kind)
            && self
                .entity_filter()
                .map_or(true, |entity| event.entity_id == entity)
    }
}

/// Normalizes a history result cap.
pub fn normalize_history_limit(limit: Option<u32>) -> u32 {
    limit
        .unwrap_or(HISTORY_DEFAULT_LIMIT)
        .clamp(1, HISTORY_LIMIT_MAX)
}

/// Append-only event log.
pub trait HistoryLog: Send + Sync {
    fn append(&self, event: HistoryEvent) -> RepoResult<()>;
    fn query(&self, owner_id: &str, query: &HistoryQuery) -> RepoResult<Vec<HistoryEvent>>;
}

/// Process-local history log, newest event at the front.
#[derive(Debug, Default)]
pub struct InMemoryHistoryLog {
    events: RwLock<VecDeque<HistoryEvent>>,
}

impl InMemoryHistoryLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.events.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.read().is_empty()
    }
}

impl HistoryLog for InMemoryHistoryLog {
    fn append(&self, event: HistoryEvent) -> RepoResult<()> {
        self.events.write().push_front(event);
        Ok(())
    }

    fn query(&self, owner_id: &str, query: &HistoryQuery) -> RepoResult<Vec<HistoryEvent>> {
        let limit = normalize_history_limit(query.limit) as usize;
        Ok(self
            .events
            .read()
            .iter()
            .filter(|event| query.matches(owner_id, event))
            .take(limit)
            .cloned()
            .collect())
    }
}

/// History log persisted in the `history_events` table.
pub struct SqliteHistoryLog {
    conn: SharedConnection,
}

impl SqliteHistoryLog {
    /// Constructs a log from a migrated connection.
    pub fn try_new(conn: SharedConnection) -> RepoResult<Self> {
        ensure_table(&conn.lock(), "history_events")?;
        Ok(Self { conn })
    }
}

impl HistoryLog for SqliteHistoryLog {
    fn append(&self, event: HistoryEvent) -> RepoResult<()> {
        let payload = serde_json::to_string(&event.payload).map_err(|err| {
            RepoError::InvalidData(format!("cannot encode history payload: {err}"))
        })?;

        self.conn.lock().execute(
            "INSERT INTO history_events (
                uuid,
                owner_id,
                scope,
                entity_id,
                kind,
                payload,
                created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7);",
            params![
                event.id.to_string(),
                event.owner_id,
                event.scope.as_str(),
                event.entity_id,
                event.kind.as_str(),
                payload,
                event.created_at,
            ],
        )?;

        Ok(())
    }

    fn query(&self, owner_id: &str, query: &HistoryQuery) -> RepoResult<Vec<HistoryEvent>> {
        let mut sql = String::from(
            "SELECT uuid, owner_id, scope, entity_id, kind, payload, created_at
             FROM history_events
             WHERE owner_id = ?",
        );
        let mut bind_values: Vec<SqlValue> = vec![SqlValue::Text(owner_id.to_string())];

        if let Some(scope) = query.scope {
            sql.push_str(" AND scope = ?");
            bind_values.push(SqlValue::Text(scope.as_str().to_string()));
        }

        if let Some(entity_id) = query.entity_filter() {
            sql.push_str(" AND entity_id = ?");
            bind_values.push(SqlValue::Text(entity_id.to_string()));
        }

        if let Some(kind) = query.kind {
            sql.push_str(" AND kind = ?");
            bind_values.push(SqlValue::Text(kind.as_str().to_string()));
        }

        sql.push_str(" ORDER BY seq DESC LIMIT ?");
        bind_values.push(SqlValue::Integer(i64::from(normalize_history_limit(
            query.limit,
        ))));

        let conn = self.conn.lock();
        let mut stmt = conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut events = Vec::new();
        while let Some(row) = rows.next()? {
            events.push(parse_event_row(row)?);
        }

        Ok(events)
    }
}

fn parse_event_row(row: &Row<'_>) -> RepoResult<HistoryEvent> {
    let uuid_text: String = row.get("uuid")?;
    let id = Uuid::parse_str(&uuid_text).map_err(|_| {
        RepoError::InvalidData(format!(
            "invalid uuid value `{uuid_text}` in history_events.uuid"
        ))
    })?;

    let scope_text: String = row.get("scope")?;
    let scope = HistoryScope::parse(&scope_text).ok_or_else(|| {
        RepoError::InvalidData(format!(
            "invalid scope `{scope_text}` in history_events.scope"
        ))
    })?;

    let kind_text: String = row.get("kind")?;
    let kind = HistoryKind::parse(&kind_text).ok_or_else(|| {
        RepoError::InvalidData(format!("invalid kind `{kind_text}` in history_events.kind"))
    })?;

    let payload_text: String = row.get("payload")?;
    let payload = serde_json::from_str(&payload_text).map_err(|err| {
        RepoError::InvalidData(format!("invalid payload for history event {id}: {err}"))
    })?;

    Ok(HistoryEvent {
        id,
        owner_id: row.get("owner_id")?,
        scope,
        entity_id: row.get("entity_id")?,
        kind,
        payload,
        created_at: row.get("created_at")?,
    })
}
