//! Shared application state.

use std::sync::Arc;

use sigil_auth::TokenSigner;
use sigil_core::service::ServiceHandle;
use sigil_store::Store;

/// State shared by every handler.
///
/// Cheap to clone; the store is behind an `Arc` and the signer holds only
/// derived key material.
#[derive(Clone)]
pub struct AppState {
    /// Persistence backend.
    pub store: Arc<dyn Store>,
    /// Access/invite token signer.
    pub signer: TokenSigner,
    /// Server lifecycle handle, surfaced by `/health`.
    pub service: ServiceHandle,
}

impl AppState {
    /// Assemble state from its parts.
    pub fn new(store: Arc<dyn Store>, signer: TokenSigner) -> Self {
        Self {
            store,
            signer,
            service: ServiceHandle::new("sigil-api"),
        }
    }
}
