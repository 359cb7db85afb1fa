//! Vault domain model.
//!
//! # Responsibility
//! - Define the canonical vault item and its flat wire projection.
//! - Define the inbound write shapes and the listing summary.
//! - Define history log events emitted around vault writes.
//!
//! # Invariants
//! - Every vault item is identified by a stable `ItemId` and owned by exactly
//!   one `OwnerId` for its whole lifetime.
//! - Deletion is a hard delete; no tombstones are kept in the model.

pub mod history;
pub mod item;
pub mod patch;
pub mod request;
pub mod summary;
