//! Sigil Core — shared types, errors, and utilities.
//!
//! This crate provides the foundational types used across all Sigil crates.
//! It has no internal Sigil dependencies (dependency level 0).
//!
//! # Modules
//!
//! - [`error`]: Error types and Result alias
//! - [`types`]: Registry domain types (holders, numbers, admins, link events)
//! - [`service`]: Service lifecycle state for long-running components
//! - [`util`]: Normalization and validation utilities

pub mod error;
pub mod service;
pub mod types;
pub mod util;

// Re-export key types at crate root for convenience
pub use error::{Error, Result};
pub use types::{
    Holder, HolderId, Invitation, InvitationId, LinkAction, LinkEvent, LinkEventId, Role,
    UniqueNumber, NumberId, User, UserId,
};

// Convenience re-exports from util
pub use util::normalize::{normalize_email, normalize_number};
