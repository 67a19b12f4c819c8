//! HS256 token issuance and verification.
//!
//! Two token kinds share one signing secret:
//! - access tokens: `sub` (account ID) + `role`, 8 h default TTL
//! - invite tokens: `email` + `purpose = "invite"`, 72 h default TTL
//!
//! The purpose claim keeps the kinds from being interchangeable; an invite
//! token presented as a bearer credential fails before any store lookup.

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use sigil_core::types::{Role, UserId};

use crate::error::AuthError;

/// Default access-token lifetime (matches an operator shift).
pub const DEFAULT_ACCESS_TTL_HOURS: i64 = 8;

/// Default invite-token lifetime.
pub const DEFAULT_INVITE_TTL_HOURS: i64 = 72;

/// Purpose claim carried by invite tokens.
const INVITE_PURPOSE: &str = "invite";

/// Claims of an access token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessClaims {
    /// Account ID, as a decimal string per JWT convention.
    pub sub: String,
    /// Account role at issuance time.
    pub role: Role,
    /// Issued-at (unix seconds).
    pub iat: i64,
    /// Expiry (unix seconds).
    pub exp: i64,
}

impl AccessClaims {
    /// Parse the subject claim back into an account ID.
    pub fn user_id(&self) -> Result<UserId, AuthError> {
        self.sub
            .parse::<i64>()
            .map(UserId::new)
            .map_err(|_| AuthError::MissingSubject)
    }
}

/// Claims of an invite token.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct InviteClaims {
    email: String,
    purpose: String,
    iat: i64,
    exp: i64,
}

/// HS256 signer/verifier over a shared secret.
#[derive(Clone)]
pub struct TokenSigner {
    encoding: EncodingKey,
    decoding: DecodingKey,
    access_ttl: Duration,
    invite_ttl: Duration,
}

impl TokenSigner {
    /// Create a signer with default TTLs.
    pub fn new(secret: &str) -> Self {
        Self::with_ttls(
            secret,
            DEFAULT_ACCESS_TTL_HOURS,
            DEFAULT_INVITE_TTL_HOURS,
        )
    }

    /// Create a signer with explicit TTLs in hours.
    pub fn with_ttls(secret: &str, access_ttl_hours: i64, invite_ttl_hours: i64) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            access_ttl: Duration::hours(access_ttl_hours),
            invite_ttl: Duration::hours(invite_ttl_hours),
        }
    }

    /// Issue an access token for an account.
    pub fn issue_access(&self, user_id: UserId, role: Role) -> Result<String, AuthError> {
        let now = Utc::now();
        let claims = AccessClaims {
            sub: user_id.get().to_string(),
            role,
            iat: now.timestamp(),
            exp: (now + self.access_ttl).timestamp(),
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| AuthError::Internal(format!("token signing failed: {e}")))
    }

    /// Verify an access token and return its claims.
    pub fn verify_access(&self, token: &str) -> Result<AccessClaims, AuthError> {
        let data = decode::<AccessClaims>(
            token,
            &self.decoding,
            &Validation::new(Algorithm::HS256),
        )
        .map_err(map_decode_error)?;
        Ok(data.claims)
    }

    /// Issue an invite token bound to an email address.
    pub fn issue_invite(&self, email: &str) -> Result<String, AuthError> {
        let now = Utc::now();
        let claims = InviteClaims {
            email: email.to_string(),
            purpose: INVITE_PURPOSE.to_string(),
            iat: now.timestamp(),
            exp: (now + self.invite_ttl).timestamp(),
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| AuthError::Internal(format!("token signing failed: {e}")))
    }

    /// Verify an invite token and return the invited email.
    pub fn verify_invite(&self, token: &str) -> Result<String, AuthError> {
        let data = decode::<InviteClaims>(
            token,
            &self.decoding,
            &Validation::new(Algorithm::HS256),
        )
        .map_err(map_decode_error)?;
        if data.claims.purpose != INVITE_PURPOSE {
            return Err(AuthError::WrongPurpose);
        }
        Ok(data.claims.email)
    }
}

impl std::fmt::Debug for TokenSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Keys are secret material; show only the TTLs.
        f.debug_struct("TokenSigner")
            .field("access_ttl", &self.access_ttl)
            .field("invite_ttl", &self.invite_ttl)
            .finish()
    }
}

fn map_decode_error(err: jsonwebtoken::errors::Error) -> AuthError {
    match err.kind() {
        jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::Expired,
        jsonwebtoken::errors::ErrorKind::InvalidSignature => {
            AuthError::InvalidSignature(err.to_string())
        }
        _ => AuthError::InvalidFormat(err.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signer() -> TokenSigner {
        TokenSigner::new("test-secret")
    }

    #[test]
    fn test_access_roundtrip() {
        let token = signer()
            .issue_access(UserId::new(42), Role::Superadmin)
            .unwrap();
        let claims = signer().verify_access(&token).unwrap();
        assert_eq!(claims.user_id().unwrap(), UserId::new(42));
        assert_eq!(claims.role, Role::Superadmin);
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn test_access_rejects_wrong_secret() {
        let token = signer().issue_access(UserId::new(1), Role::Admin).unwrap();
        let other = TokenSigner::new("different-secret");
        let err = other.verify_access(&token).unwrap_err();
        assert!(matches!(err, AuthError::InvalidSignature(_)));
    }

    #[test]
    fn test_access_rejects_garbage() {
        let err = signer().verify_access("not.a.jwt").unwrap_err();
        assert!(matches!(err, AuthError::InvalidFormat(_)));
    }

    #[test]
    fn test_expired_access_rejected() {
        // Zero-hour TTL: expired as soon as the default leeway passes. Build
        // one with a negative TTL to get past jsonwebtoken's leeway window.
        let signer = TokenSigner::with_ttls("test-secret", -1, 72);
        let token = signer.issue_access(UserId::new(1), Role::Admin).unwrap();
        let err = signer.verify_access(&token).unwrap_err();
        assert!(matches!(err, AuthError::Expired));
    }

    #[test]
    fn test_invite_roundtrip() {
        let token = signer().issue_invite("new@registry.org").unwrap();
        let email = signer().verify_invite(&token).unwrap();
        assert_eq!(email, "new@registry.org");
    }

    #[test]
    fn test_token_kinds_not_interchangeable() {
        // An access token is not an invite token...
        let access = signer().issue_access(UserId::new(1), Role::Admin).unwrap();
        assert!(signer().verify_invite(&access).is_err());

        // ...and an invite token has no subject to act as.
        let invite = signer().issue_invite("new@registry.org").unwrap();
        assert!(signer().verify_access(&invite).is_err());
    }

    #[test]
    fn test_bad_subject_claim() {
        let claims = AccessClaims {
            sub: "not-a-number".to_string(),
            role: Role::Admin,
            iat: 0,
            exp: 0,
        };
        assert!(matches!(
            claims.user_id(),
            Err(AuthError::MissingSubject)
        ));
    }

    #[test]
    fn test_debug_hides_secret() {
        let repr = format!("{:?}", signer());
        assert!(!repr.contains("test-secret"));
    }
}
