//! Vault use-case service.
//!
//! # Responsibility
//! - Provide owner-scoped create/update/patch/get/delete/list APIs.
//! - Reconcile every write in memory, then commit it with a single `put`.
//! - Emit history events for writes without depending on the log.
//!
//! # Invariants
//! - A rejected write leaves the store untouched.
//! - Cross-owner access fails with `NotFound`, same as a missing id.
//! - Concurrent writes to one item are last-write-wins.
//! - History append failures are logged and never fail the write.

use crate::clock::{Clock, SystemClock};
use crate::model::history::{HistoryEvent, HistoryKind, HistoryScope};
use crate::model::item::{ItemId, VaultItem};
use crate::model::request::{ContentPatch, VaultItemPatch, VaultMetaPatch, VaultUpsert};
use crate::model::summary::VaultItemSummary;
use crate::repo::history_repo::{
    normalize_history_limit, HistoryLog, HistoryQuery, HISTORY_DEFAULT_LIMIT,
};
use crate::repo::vault_repo::{RepoError, VaultRepository};
use crate::search::filter::{filter_items, VaultQuery};
use crate::service::reconcile::{
    reconcile_content, reconcile_create, reconcile_meta, reconcile_upsert, ReconcileError,
};
use log::{debug, info, warn};
use serde_json::json;
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Service error for vault use-cases.
#[derive(Debug)]
pub enum VaultServiceError {
    /// Item is absent or owned by someone else.
    NotFound(ItemId),
    /// Payload rejected before any mutation.
    InvalidArgument(String),
    /// Storage-layer failure.
    Repo(RepoError),
}

impl Display for VaultServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound(id) => write!(f, "vault item not found: {id}"),
            Self::InvalidArgument(message) => write!(f, "invalid argument: {message}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for VaultServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for VaultServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound(id) => Self::NotFound(id),
            other => Self::Repo(other),
        }
    }
}

impl From<ReconcileError> for VaultServiceError {
    fn from(value: ReconcileError) -> Self {
        Self::InvalidArgument(value.to_string())
    }
}

pub type VaultServiceResult<T> = Result<T, VaultServiceError>;

/// Vault service facade over a repository implementation.
pub struct VaultService<R: VaultRepository> {
    repo: R,
    clock: Box<dyn Clock>,
    history: Option<Box<dyn HistoryLog>>,
    history_limit: u32,
}

impl<R: VaultRepository> VaultService<R> {
    /// Creates a service using the system clock and no history log.
    pub fn new(repo: R) -> Self {
        Self {
            repo,
            clock: Box::new(SystemClock::new()),
            history: None,
            history_limit: HISTORY_DEFAULT_LIMIT,
        }
    }

    /// Replaces the timestamp source.
    pub fn with_clock(mut self, clock: Box<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Attaches a history log that receives `VAULT` events after each write.
    pub fn with_history(mut self, history: Box<dyn HistoryLog>) -> Self {
        self.history = Some(history);
        self
    }

    /// Sets the cap used by [`Self::history`] when a query carries no limit.
    pub fn with_history_limit(mut self, limit: u32) -> Self {
        self.history_limit = normalize_history_limit(Some(limit));
        self
    }

    pub fn repository(&self) -> &R {
        &self.repo
    }

    /// Creates one item with a fresh id.
    ///
    /// The timestamp is never older than the owner's newest stored item, even
    /// when the clock lags behind a reopened store.
    ///
    /// # Errors
    /// - `InvalidArgument` when `type` is missing or unsupported.
    pub fn create(&self, owner_id: &str, body: VaultUpsert) -> VaultServiceResult<VaultItem> {
        log_ignored_nulls("create", &body.explicit_nulls());
        let now_ms = match self.repo.latest_updated_at(owner_id)? {
            Some(latest) => self.clock.now_ms().max(latest),
            None => self.clock.now_ms(),
        };
        let item = reconcile_create(owner_id, Uuid::new_v4(), body, now_ms)?;
        self.commit(owner_id, item, "create", HistoryKind::Create)
    }

    /// Full replace: every omitted field keeps its previous value.
    pub fn update(
        &self,
        owner_id: &str,
        id: ItemId,
        body: VaultUpsert,
    ) -> VaultServiceResult<VaultItem> {
        log_ignored_nulls("update", &body.explicit_nulls());
        let previous = self.repo.get_item(owner_id, id)?;
        let next = reconcile_upsert(&previous, body, self.clock.now_ms())?;
        self.commit(owner_id, next, "update", HistoryKind::Update)
    }

    /// Edits title and tags, and `formula` when the item is an equation.
    pub fn patch_meta(
        &self,
        owner_id: &str,
        id: ItemId,
        patch: VaultMetaPatch,
    ) -> VaultServiceResult<VaultItem> {
        log_ignored_nulls("patch_meta", &patch.explicit_nulls());
        let previous = self.repo.get_item(owner_id, id)?;
        let next = reconcile_meta(&previous, patch, self.clock.now_ms());
        self.commit(owner_id, next, "patch_meta", HistoryKind::Update)
    }

    /// Replaces content and re-derives preview fields and array dimensions.
    pub fn patch_content(
        &self,
        owner_id: &str,
        id: ItemId,
        patch: ContentPatch,
    ) -> VaultServiceResult<VaultItem> {
        let previous = self.repo.get_item(owner_id, id)?;
        let next = reconcile_content(&previous, patch, self.clock.now_ms());
        self.commit(owner_id, next, "patch_content", HistoryKind::Update)
    }

    /// Applies any subset of item fields, including a type change.
    pub fn patch_item(
        &self,
        owner_id: &str,
        id: ItemId,
        patch: VaultItemPatch,
    ) -> VaultServiceResult<VaultItem> {
        log_ignored_nulls("patch_item", &patch.explicit_nulls());
        let previous = self.repo.get_item(owner_id, id)?;
        let next = reconcile_upsert(&previous, patch, self.clock.now_ms())?;
        self.commit(owner_id, next, "patch_item", HistoryKind::Update)
    }

    /// Gets one item owned by `owner_id`.
    pub fn get_owned(&self, owner_id: &str, id: ItemId) -> VaultServiceResult<VaultItem> {
        Ok(self.repo.get_item(owner_id, id)?)
    }

    /// Hard-deletes one item. Deleting a missing item is a no-op.
    pub fn delete(&self, owner_id: &str, id: ItemId) -> VaultServiceResult<()> {
        let removed = self.repo.delete_item(owner_id, id)?;
        info!("event=vault_delete module=vault status=ok item_id={id} removed={removed}");
        Ok(())
    }

    /// Lists full items matching `query`, most recently updated first.
    pub fn list_full(
        &self,
        owner_id: &str,
        query: &VaultQuery,
    ) -> VaultServiceResult<Vec<VaultItem>> {
        let items = self.repo.list_by_owner(owner_id)?;
        Ok(filter_items(items, query))
    }

    /// Same as [`Self::list_full`], projected to summaries.
    pub fn list_summary(
        &self,
        owner_id: &str,
        query: &VaultQuery,
    ) -> VaultServiceResult<Vec<VaultItemSummary>> {
        let items = self.list_full(owner_id, query)?;
        Ok(items.iter().map(VaultItemSummary::from).collect())
    }

    /// Queries the attached history log; empty when none is attached.
    pub fn history(
        &self,
        owner_id: &str,
        query: &HistoryQuery,
    ) -> VaultServiceResult<Vec<HistoryEvent>> {
        let Some(log) = &self.history else {
            return Ok(Vec::new());
        };

        let mut query = query.clone();
        query.limit = Some(query.limit.unwrap_or(self.history_limit));
        Ok(log.query(owner_id, &query)?)
    }

    fn commit(
        &self,
        owner_id: &str,
        item: VaultItem,
        op: &'static str,
        kind: HistoryKind,
    ) -> VaultServiceResult<VaultItem> {
        debug!(
            "event=vault_reconcile module=vault status=ok op={op} item_id={} tags={} has_content={}",
            item.id,
            item.tags.len(),
            item.content.is_some()
        );
        self.repo.put_item(owner_id, &item)?;
        info!(
            "event=vault_write module=vault status=ok op={op} item_id={} type={} updated_at={}",
            item.id,
            item.kind(),
            item.updated_at
        );
        self.record_history(&item, kind);
        Ok(item)
    }

    fn record_history(&self, item: &VaultItem, kind: HistoryKind) {
        let Some(log) = &self.history else {
            return;
        };

        let payload = json!({
            "id": item.id,
            "title": item.title,
            "type": item.kind(),
            "updatedAt": item.updated_at,
        });
        let event = HistoryEvent::new(
            item.owner_id.clone(),
            HistoryScope::Vault,
            item.id.to_string(),
            kind,
            payload,
            self.clock.now_ms(),
        );
        if let Err(err) = log.append(event) {
            warn!(
                "event=history_append module=vault status=error item_id={} kind={} error={err}",
                item.id,
                kind.as_str()
            );
        }
    }
}

fn log_ignored_nulls(op: &str, fields: &[&'static str]) {
    if !fields.is_empty() {
        debug!(
            "event=null_fields_kept module=vault op={op} fields={}",
            fields.join(",")
        );
    }
}
