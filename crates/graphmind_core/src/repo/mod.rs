//! Repository layer abstractions and storage backends.
//!
//! # Responsibility
//! - Define owner-partitioned storage contracts for vault items.
//! - Provide in-memory and SQLite implementations behind one trait, so the
//!   reconciliation logic never depends on a concrete backend.
//! - Provide the append-only history log.
//!
//! # Invariants
//! - Repository writes call `VaultItem::validate()` before storing.
//! - No operation observes or mutates another owner's partition; a foreign
//!   item is reported as `NotFound`, never as a distinct outcome.
//! - Writes to the same key are last-write-wins; there is no version check.

pub mod history_repo;
pub mod sqlite_vault_repo;
pub mod vault_repo;
