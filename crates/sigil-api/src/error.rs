//! Error types for sigil-api and their HTTP mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;

use sigil_auth::AuthError;

/// Result type alias for sigil-api operations
pub type Result<T> = std::result::Result<T, ApiError>;

/// Errors that can occur in sigil-api
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum ApiError {
    /// Error from sigil-core (validation)
    #[error(transparent)]
    Core(#[from] sigil_core::Error),

    /// Error from sigil-store
    #[error(transparent)]
    Store(#[from] sigil_store::Error),

    /// Error from sigil-auth
    #[error(transparent)]
    Auth(#[from] AuthError),

    /// Login failed; deliberately uniform across unknown email, wrong
    /// password, and inactive account
    #[error("incorrect email or password")]
    BadCredentials,

    /// Registration token is invalid, expired, or has no pending invitation
    #[error("invalid or expired invitation token")]
    BadInviteToken,

    /// Socket/bind error while serving
    #[error("server I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ApiError {
    /// The HTTP status and stable error code for this error.
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            ApiError::Core(sigil_core::Error::Validation { .. }) => {
                (StatusCode::UNPROCESSABLE_ENTITY, "invalid")
            }
            ApiError::Core(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal"),

            ApiError::Store(store) => match store {
                // NotLinked is a 404 to match the lookup semantics of the
                // unlink endpoint ("not found or not linked").
                sigil_store::Error::NotFound { .. } | sigil_store::Error::NotLinked { .. } => {
                    (StatusCode::NOT_FOUND, "not_found")
                }
                sigil_store::Error::DuplicateEmail(_)
                | sigil_store::Error::DuplicateNumber(_)
                | sigil_store::Error::AlreadyLinked { .. }
                | sigil_store::Error::HolderInUse(_) => (StatusCode::CONFLICT, "conflict"),
                _ => (StatusCode::INTERNAL_SERVER_ERROR, "internal"),
            },

            ApiError::Auth(auth) => {
                if auth.is_forbidden() {
                    (StatusCode::FORBIDDEN, "forbidden")
                } else if auth.is_client_error() {
                    (StatusCode::UNAUTHORIZED, "unauthorized")
                } else {
                    (StatusCode::INTERNAL_SERVER_ERROR, "internal")
                }
            }

            ApiError::BadCredentials => (StatusCode::UNAUTHORIZED, "unauthorized"),
            ApiError::BadInviteToken => (StatusCode::BAD_REQUEST, "invalid_token"),
            ApiError::Io(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal"),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();

        // Server-side detail goes to the log, not the wire.
        let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!(error = %self, "request failed");
            "internal error".to_string()
        } else {
            self.to_string()
        };

        let body = serde_json::json!({
            "error": {
                "code": code,
                "message": message,
            }
        });
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_maps_to_404() {
        let err = ApiError::from(sigil_store::Error::not_found("holder", 7));
        let (status, code) = err.status_and_code();
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(code, "not_found");
    }

    #[test]
    fn test_not_linked_maps_to_404() {
        let err = ApiError::from(sigil_store::Error::NotLinked {
            number: 1,
            holder: 2,
        });
        assert_eq!(err.status_and_code().0, StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_conflicts_map_to_409() {
        for store_err in [
            sigil_store::Error::DuplicateEmail("a@b.co".into()),
            sigil_store::Error::DuplicateNumber("SG-1".into()),
            sigil_store::Error::AlreadyLinked { number: 1 },
            sigil_store::Error::HolderInUse(1),
        ] {
            let err = ApiError::from(store_err);
            assert_eq!(err.status_and_code().0, StatusCode::CONFLICT);
        }
    }

    #[test]
    fn test_validation_maps_to_422() {
        let err = ApiError::from(sigil_core::Error::validation("name", "empty"));
        assert_eq!(
            err.status_and_code().0,
            StatusCode::UNPROCESSABLE_ENTITY
        );
    }

    #[test]
    fn test_role_failure_maps_to_403() {
        let err = ApiError::from(AuthError::InsufficientRole {
            required: "superadmin",
        });
        assert_eq!(err.status_and_code().0, StatusCode::FORBIDDEN);
    }

    #[test]
    fn test_database_error_hides_detail() {
        let err = ApiError::from(sigil_store::Error::Corrupt("role 'owner'".into()));
        assert_eq!(
            err.status_and_code().0,
            StatusCode::INTERNAL_SERVER_ERROR
        );
        let resp = err.into_response();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_bad_credentials_is_401() {
        assert_eq!(
            ApiError::BadCredentials.status_and_code().0,
            StatusCode::UNAUTHORIZED
        );
    }
}
