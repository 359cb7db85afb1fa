//! Vault listing filters.
//!
//! # Responsibility
//! - Filter an owner's items by tag and free text.
//! - Apply the deterministic recency ordering used by every listing.

pub mod filter;
