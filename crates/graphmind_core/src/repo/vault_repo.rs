//! Vault repository contract and in-memory implementation.
//!
//! # Responsibility
//! - Provide owner-scoped get/put/delete/list over vault items.
//! - Keep the concurrency model of the store inside the repository.
//!
//! # Invariants
//! - `put_item` rejects items whose `owner_id` differs from the target
//!   partition.
//! - `list_by_owner` returns an owned snapshot; later writes do not show up
//!   in a list already returned.

use crate::db::DbError;
use crate::model::item::{ItemId, ItemValidationError, OwnerId, VaultItem};
use dashmap::DashMap;
use std::collections::HashMap;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type RepoResult<T> = Result<T, RepoError>;

/// Error for vault and history storage operations.
#[derive(Debug)]
pub enum RepoError {
    Validation(ItemValidationError),
    Db(DbError),
    /// Absent, or owned by another owner.
    NotFound(ItemId),
    OwnerMismatch {
        partition: OwnerId,
        item_owner: OwnerId,
    },
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "vault item not found: {id}"),
            Self::OwnerMismatch {
                partition,
                item_owner,
            } => write!(
                f,
                "item owned by `{item_owner}` cannot be written to partition `{partition}`"
            ),
            Self::InvalidData(message) => write!(f, "invalid persisted data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            Self::NotFound(_) | Self::OwnerMismatch { .. } | Self::InvalidData(_) => None,
        }
    }
}

impl From<ItemValidationError> for RepoError {
    fn from(value: ItemValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Owner-partitioned storage for vault items.
pub trait VaultRepository: Send + Sync {
    /// Gets one item from the owner's partition.
    ///
    /// Fails with `NotFound` when the id is absent or owned by another owner.
    fn get_item(&self, owner_id: &str, id: ItemId) -> RepoResult<VaultItem>;
    /// Inserts or replaces one item in the owner's partition.
    fn put_item(&self, owner_id: &str, item: &VaultItem) -> RepoResult<()>;
    /// Removes one item; returns whether something was removed.
    fn delete_item(&self, owner_id: &str, id: ItemId) -> RepoResult<bool>;
    /// Point-in-time snapshot of the owner's items, in no particular order.
    fn list_by_owner(&self, owner_id: &str) -> RepoResult<Vec<VaultItem>>;
    /// Newest `updated_at` stored for the owner, `None` for an empty partition.
    fn latest_updated_at(&self, owner_id: &str) -> RepoResult<Option<i64>>;
}

impl<R: VaultRepository + ?Sized> VaultRepository for Box<R> {
    fn get_item(&self, owner_id: &str, id: ItemId) -> RepoResult<VaultItem> {
        (**self).get_item(owner_id, id)
    }

    fn put_item(&self, owner_id: &str, item: &VaultItem) -> RepoResult<()> {
        (**self).put_item(owner_id, item)
    }

    fn delete_item(&self, owner_id: &str, id: ItemId) -> RepoResult<bool> {
        (**self).delete_item(owner_id, id)
    }

    fn list_by_owner(&self, owner_id: &str) -> RepoResult<Vec<VaultItem>> {
        (**self).list_by_owner(owner_id)
    }

    fn latest_updated_at(&self, owner_id: &str) -> RepoResult<Option<i64>> {
        (**self).latest_updated_at(owner_id)
    }
}

/// Validates an item and checks it belongs to the target partition.
pub(crate) fn check_writable(owner_id: &str, item: &VaultItem) -> RepoResult<()> {
    item.validate()?;
    if item.owner_id != owner_id {
        return Err(RepoError::OwnerMismatch {
            partition: owner_id.to_string(),
            item_owner: item.owner_id.clone(),
        });
    }
    Ok(())
}

/// Process-local vault store.
///
/// One map entry per owner; operations on different owners never contend,
/// and each read clones the item out so callers never hold a lock.
#[derive(Debug, Default)]
pub struct InMemoryVaultRepository {
    partitions: DashMap<OwnerId, HashMap<ItemId, VaultItem>>,
}

impl InMemoryVaultRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

impl VaultRepository for InMemoryVaultRepository {
    fn get_item(&self, owner_id: &str, id: ItemId) -> RepoResult<VaultItem> {
        self.partitions
            .get(owner_id)
            .and_then(|partition| partition.get(&id).cloned())
            .ok_or(RepoError::NotFound(id))
    }

    fn put_item(&self, owner_id: &str, item: &VaultItem) -> RepoResult<()> {
        check_writable(owner_id, item)?;
        self.partitions
            .entry(owner_id.to_string())
            .or_default()
            .insert(item.id, item.clone());
        Ok(())
    }

    fn delete_item(&self, owner_id: &str, id: ItemId) -> RepoResult<bool> {
        let removed = self
            .partitions
            .get_mut(owner_id)
            .is_some_and(|mut partition| partition.remove(&id).is_some());
        Ok(removed)
    }

    fn list_by_owner(&self, owner_id: &str) -> RepoResult<Vec<VaultItem>> {
        Ok(self
            .partitions
            .get(owner_id)
            .map(|partition| partition.values().cloned().collect())
            .unwrap_or_default())
    }

    fn latest_updated_at(&self, owner_id: &str) -> RepoResult<Option<i64>> {
        Ok(self.partitions.get(owner_id).and_then(|partition| {
            partition.values().map(|item| item.updated_at).max()
        }))
    }
}
