//! Auth-specific error types.

/// Errors that can occur during authentication and authorization.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// No Authorization header or bearer token present.
    #[error("missing authentication token")]
    MissingToken,

    /// Token format is invalid (not a valid JWT, wrong claims shape).
    #[error("invalid token format: {0}")]
    InvalidFormat(String),

    /// JWT signature verification failed.
    #[error("invalid token signature: {0}")]
    InvalidSignature(String),

    /// Token has expired.
    #[error("token has expired")]
    Expired,

    /// Token was issued for a different purpose (invite vs. access).
    #[error("token issued for a different purpose")]
    WrongPurpose,

    /// Token is missing or has an unparseable subject claim.
    #[error("token missing a valid subject")]
    MissingSubject,

    /// The account behind the token no longer exists or is inactive.
    #[error("unknown or inactive account")]
    UnknownAccount,

    /// The authenticated role is not allowed to perform the operation.
    #[error("requires {required} privileges")]
    InsufficientRole {
        /// Role the operation requires.
        required: &'static str,
    },

    /// Token signing or password hashing failed (server side).
    #[error("credential processing failed: {0}")]
    Internal(String),
}

impl AuthError {
    /// Whether this error is the caller's fault (401/403 material, not 500).
    pub fn is_client_error(&self) -> bool {
        !matches!(self, AuthError::Internal(_))
    }

    /// Whether this error is an authorization (403) rather than an
    /// authentication (401) failure.
    pub fn is_forbidden(&self) -> bool {
        matches!(self, AuthError::InsufficientRole { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        assert_eq!(
            AuthError::MissingToken.to_string(),
            "missing authentication token"
        );
        assert_eq!(
            AuthError::InsufficientRole {
                required: "superadmin"
            }
            .to_string(),
            "requires superadmin privileges"
        );
    }

    #[test]
    fn test_is_client_error() {
        assert!(AuthError::MissingToken.is_client_error());
        assert!(AuthError::Expired.is_client_error());
        assert!(AuthError::WrongPurpose.is_client_error());
        assert!(!AuthError::Internal("rng failure".into()).is_client_error());
    }

    #[test]
    fn test_is_forbidden() {
        assert!(
            AuthError::InsufficientRole {
                required: "superadmin"
            }
            .is_forbidden()
        );
        assert!(!AuthError::Expired.is_forbidden());
    }
}
