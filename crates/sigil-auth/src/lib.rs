//! Authentication primitives for Sigil.
//!
//! Provides:
//! - [`AuthenticatedAdmin`] — Identity extracted from a validated token
//! - [`TokenValidator`] — Trait for async token validation
//! - [`AuthLayer`] / [`AuthService`] — Tower middleware parameterised over `TokenValidator`
//! - [`TokenSigner`] — HS256 access- and invite-token issuance/verification
//! - [`hash_password`] / [`verify_password`] — argon2id password handling
//! - [`AuthError`] — Auth-specific error types

mod error;
mod identity;
mod middleware;
pub mod password;
pub mod token;

pub use error::AuthError;
pub use identity::{admin_from_parts, AuthenticatedAdmin};
pub use middleware::{AuthLayer, AuthService};
pub use password::{hash_password, verify_password};
pub use token::{AccessClaims, TokenSigner};

/// Trait for validating bearer tokens and extracting the acting admin.
///
/// The middleware calls `validate()` with the raw bearer token and inserts
/// the returned identity into request extensions on success. Implementations
/// typically decode the token and confirm the account still exists and is
/// active.
pub trait TokenValidator: Send + Sync + 'static {
    /// Validate a token and return the authenticated admin.
    fn validate(
        &self,
        token: &str,
    ) -> std::pin::Pin<
        Box<dyn std::future::Future<Output = Result<AuthenticatedAdmin, AuthError>> + Send + '_>,
    >;
}
