//! # sigil-api
//!
//! HTTP API server for the Sigil registry.
//!
//! This crate provides the REST surface:
//! - Authentication (login, invite-based registration)
//! - Holder and number CRUD with link/unlink
//! - Link/unlink audit history
//! - Role-based authorization on every `/api` route
//! - Health reporting tied to the server lifecycle
//!
//! The router is built against the [`sigil_store::Store`] trait, so the
//! test suite runs the full surface against the in-memory backend.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![forbid(unsafe_code)]

pub mod dto;
pub mod error;
pub mod routes;
pub mod server;
pub mod state;
pub mod validator;

pub use error::{ApiError, Result};
pub use server::Server;
pub use state::AppState;
