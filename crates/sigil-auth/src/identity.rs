//! Authenticated identity and extraction helpers.

use sigil_core::types::{Role, UserId};

use crate::error::AuthError;

/// The admin acting on a request, extracted from a validated token.
///
/// Stored in HTTP request extensions by the auth middleware and read by
/// handlers through `axum::Extension`.
#[derive(Debug, Clone)]
pub struct AuthenticatedAdmin {
    /// Account ID.
    pub id: UserId,
    /// Account email.
    pub email: String,
    /// Account role.
    pub role: Role,
}

impl AuthenticatedAdmin {
    /// Require superadmin privileges for the current operation.
    pub fn require_superadmin(&self) -> Result<(), AuthError> {
        if self.role.can_manage_admins() {
            Ok(())
        } else {
            Err(AuthError::InsufficientRole {
                required: "superadmin",
            })
        }
    }
}

/// Extract the `AuthenticatedAdmin` from HTTP request `Parts`, if present.
pub fn admin_from_parts(parts: &http::request::Parts) -> Option<&AuthenticatedAdmin> {
    parts.extensions.get::<AuthenticatedAdmin>()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn admin(role: Role) -> AuthenticatedAdmin {
        AuthenticatedAdmin {
            id: UserId::new(1),
            email: "ops@registry.org".to_string(),
            role,
        }
    }

    #[test]
    fn test_require_superadmin() {
        assert!(admin(Role::Superadmin).require_superadmin().is_ok());
        let err = admin(Role::Admin).require_superadmin().unwrap_err();
        assert!(matches!(
            err,
            AuthError::InsufficientRole {
                required: "superadmin"
            }
        ));
    }

    #[test]
    fn test_admin_from_parts() {
        let (mut parts, _body) = http::Request::new(()).into_parts();
        assert!(admin_from_parts(&parts).is_none());

        parts.extensions.insert(admin(Role::Admin));
        let found = admin_from_parts(&parts).unwrap();
        assert_eq!(found.email, "ops@registry.org");
    }
}
