//! Store-backed access-token validation.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use sigil_auth::{AuthError, AuthenticatedAdmin, TokenSigner, TokenValidator};
use sigil_store::Store;

/// Validates access tokens against the signing secret and the account store.
///
/// Decoding alone is not enough: the account may have been deactivated since
/// the token was issued, so every request re-checks the store. The role is
/// taken from the store, not the token, so demotions apply immediately.
pub struct StoreTokenValidator {
    store: Arc<dyn Store>,
    signer: TokenSigner,
}

impl StoreTokenValidator {
    /// Create a validator over the given store and signer.
    pub fn new(store: Arc<dyn Store>, signer: TokenSigner) -> Self {
        Self { store, signer }
    }
}

impl TokenValidator for StoreTokenValidator {
    fn validate(
        &self,
        token: &str,
    ) -> Pin<Box<dyn Future<Output = Result<AuthenticatedAdmin, AuthError>> + Send + '_>> {
        let token = token.to_string();
        Box::pin(async move {
            let claims = self.signer.verify_access(&token)?;
            let user_id = claims.user_id()?;

            let user = self
                .store
                .user_by_id(user_id)
                .await
                .map_err(|e| AuthError::Internal(format!("account lookup failed: {e}")))?
                .ok_or(AuthError::UnknownAccount)?;

            if !user.is_active {
                return Err(AuthError::UnknownAccount);
            }

            Ok(AuthenticatedAdmin {
                id: user.id,
                email: user.email,
                role: user.role,
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sigil_auth::hash_password;
    use sigil_core::types::Role;
    use sigil_store::{MemStore, NewUser};

    async fn setup() -> (Arc<MemStore>, TokenSigner) {
        let store = Arc::new(MemStore::new());
        let signer = TokenSigner::new("test-secret");
        (store, signer)
    }

    fn account(email: &str, role: Role) -> NewUser {
        NewUser {
            email: email.to_string(),
            password_hash: hash_password("password123").unwrap(),
            full_name: None,
            role,
            is_invited: false,
            invited_by: None,
        }
    }

    #[tokio::test]
    async fn test_valid_token_resolves_account() {
        let (store, signer) = setup().await;
        let user = store
            .create_user(account("ops@registry.org", Role::Admin))
            .await
            .unwrap();
        let token = signer.issue_access(user.id, user.role).unwrap();

        let validator = StoreTokenValidator::new(store, signer);
        let admin = validator.validate(&token).await.unwrap();
        assert_eq!(admin.id, user.id);
        assert_eq!(admin.email, "ops@registry.org");
        assert_eq!(admin.role, Role::Admin);
    }

    #[tokio::test]
    async fn test_unknown_account_rejected() {
        let (store, signer) = setup().await;
        let token = signer
            .issue_access(sigil_core::types::UserId::new(999), Role::Admin)
            .unwrap();

        let validator = StoreTokenValidator::new(store, signer);
        let err = validator.validate(&token).await.unwrap_err();
        assert!(matches!(err, AuthError::UnknownAccount));
    }

    #[tokio::test]
    async fn test_garbage_token_rejected() {
        let (store, signer) = setup().await;
        let validator = StoreTokenValidator::new(store, signer);
        let err = validator.validate("garbage").await.unwrap_err();
        assert!(err.is_client_error());
    }

    #[tokio::test]
    async fn test_role_read_from_store_not_token() {
        let (store, signer) = setup().await;
        let user = store
            .create_user(account("root@registry.org", Role::Superadmin))
            .await
            .unwrap();
        // Token claims a stale role; the store's current role wins.
        let token = signer.issue_access(user.id, Role::Admin).unwrap();

        let validator = StoreTokenValidator::new(store, signer);
        let admin = validator.validate(&token).await.unwrap();
        assert_eq!(admin.role, Role::Superadmin);
    }
}
