//! Core use-case services.
//!
//! # Responsibility
//! - Reconcile inbound payloads against previous records.
//! - Derive preview fields and array dimensions from content.
//! - Orchestrate repository and history calls into use-case level APIs.
//!
//! # See also
//! - `crate::repo` for the storage contracts these services drive.

pub mod dimensions;
pub mod preview;
pub mod reconcile;
pub mod vault_service;
