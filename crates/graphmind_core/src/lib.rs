//! Core domain logic for the GraphMind vault.
//! This crate is the single source of truth for vault record invariants.

pub mod clock;
pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod search;
pub mod service;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{open_vault, ConfigError, GraphmindConfig, StoreBackend, Vault};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::history::{HistoryEvent, HistoryKind, HistoryScope};
pub use model::item::{
    normalize_tags, ArrayShape, ItemBody, ItemId, ItemType, ItemValidationError,
    ParametricPreview, OwnerId, VaultItem, VaultItemRecord,
};
pub use model::patch::Patch;
pub use model::request::{ContentPatch, VaultItemPatch, VaultMetaPatch, VaultUpsert};
pub use model::summary::VaultItemSummary;
pub use repo::history_repo::{
    normalize_history_limit, HistoryLog, HistoryQuery, InMemoryHistoryLog, SqliteHistoryLog,
};
pub use repo::sqlite_vault_repo::SqliteVaultRepository;
pub use repo::vault_repo::{InMemoryVaultRepository, RepoError, RepoResult, VaultRepository};
pub use search::filter::{filter_items, sort_by_recency, VaultQuery};
pub use service::reconcile::ReconcileError;
pub use service::vault_service::{VaultService, VaultServiceError, VaultServiceResult};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::{core_version, ping};

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
