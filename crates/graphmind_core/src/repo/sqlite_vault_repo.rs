//! SQLite-backed vault repository.
//!
//! # Responsibility
//! - Persist vault items keyed by `(owner_id, uuid)`.
//! - Store the flat JSON projection as the row body, with `type`, `title`
//!   and `updated_at` mirrored into columns for inspection and ordering.
//!
//! # Invariants
//! - Every query is constrained by `owner_id`.
//! - Read paths re-validate the decoded item and reject rows whose body
//!   disagrees with their key columns instead of masking it.
//! - Upserts are last-write-wins (`ON CONFLICT ... DO UPDATE`).

use crate::db::{ensure_table, SharedConnection};
use crate::model::item::{ItemId, VaultItem};
use crate::repo::vault_repo::{check_writable, RepoError, RepoResult, VaultRepository};
use rusqlite::{params, Row};
use uuid::Uuid;

const ITEM_SELECT_SQL: &str = "SELECT owner_id, uuid, body FROM vault_items";

/// Vault repository over a shared, migrated SQLite connection.
pub struct SqliteVaultRepository {
    conn: SharedConnection,
}

impl SqliteVaultRepository {
    /// Constructs a repository from a migrated connection.
    ///
    /// Fails when the `vault_items` table is missing.
    pub fn try_new(conn: SharedConnection) -> RepoResult<Self> {
        ensure_table(&conn.lock(), "vault_items")?;
        Ok(Self { conn })
    }
}

impl VaultRepository for SqliteVaultRepository {
    fn get_item(&self, owner_id: &str, id: ItemId) -> RepoResult<VaultItem> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(&format!(
            "{ITEM_SELECT_SQL}
             WHERE owner_id = ?1
               AND uuid = ?2;"
        ))?;

        let mut rows = stmt.query(params![owner_id, id.to_string()])?;
        if let Some(row) = rows.next()? {
            return parse_item_row(row);
        }

        Err(RepoError::NotFound(id))
    }

    fn put_item(&self, owner_id: &str, item: &VaultItem) -> RepoResult<()> {
        check_writable(owner_id, item)?;
        let body = serde_json::to_string(item)
            .map_err(|err| RepoError::InvalidData(format!("cannot encode item body: {err}")))?;

        self.conn.lock().execute(
            "INSERT INTO vault_items (
                owner_id,
                uuid,
                type,
                title,
                updated_at,
                body
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            ON CONFLICT (owner_id, uuid) DO UPDATE SET
                type = excluded.type,
                title = excluded.title,
                updated_at = excluded.updated_at,
                body = excluded.body;",
            params![
                owner_id,
                item.id.to_string(),
                item.kind().as_str(),
                item.title.as_str(),
                item.updated_at,
                body,
            ],
        )?;

        Ok(())
    }

    fn delete_item(&self, owner_id: &str, id: ItemId) -> RepoResult<bool> {
        let changed = self.conn.lock().execute(
            "DELETE FROM vault_items WHERE owner_id = ?1 AND uuid = ?2;",
            params![owner_id, id.to_string()],
        )?;
        Ok(changed > 0)
    }

    fn list_by_owner(&self, owner_id: &str) -> RepoResult<Vec<VaultItem>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(&format!(
            "{ITEM_SELECT_SQL}
             WHERE owner_id = ?1
             ORDER BY updated_at DESC, uuid ASC;"
        ))?;

        let mut rows = stmt.query([owner_id])?;
        let mut items = Vec::new();
        while let Some(row) = rows.next()? {
            items.push(parse_item_row(row)?);
        }

        Ok(items)
    }

    fn latest_updated_at(&self, owner_id: &str) -> RepoResult<Option<i64>> {
        let latest = self.conn.lock().query_row(
            "SELECT MAX(updated_at) FROM vault_items WHERE owner_id = ?1;",
            [owner_id],
            |row| row.get::<_, Option<i64>>(0),
        )?;
        Ok(latest)
    }
}

fn parse_item_row(row: &Row<'_>) -> RepoResult<VaultItem> {
    let uuid_text: String = row.get("uuid")?;
    let uuid = Uuid::parse_str(&uuid_text).map_err(|_| {
        RepoError::InvalidData(format!("invalid uuid value `{uuid_text}` in vault_items.uuid"))
    })?;
    let owner_id: String = row.get("owner_id")?;
    let body: String = row.get("body")?;

    let item: VaultItem = serde_json::from_str(&body).map_err(|err| {
        RepoError::InvalidData(format!("invalid body for vault item {uuid}: {err}"))
    })?;

    if item.id != uuid || item.owner_id != owner_id {
        return Err(RepoError::InvalidData(format!(
            "body of vault item {uuid} does not match its key columns"
        )));
    }

    Ok(item)
}
