//! Superadmin-only account management handlers.

use axum::extract::State;
use axum::{Extension, Json};

use sigil_auth::AuthenticatedAdmin;
use sigil_core::util::validate;

use crate::dto::{InvitationResponse, InvitePayload, UserResponse};
use crate::error::Result;
use crate::state::AppState;

/// `POST /api/invite` — invite an admin by email.
///
/// Reissues the pending invitation if one exists; conflicts once the email
/// has an account. The signed invite token is returned to the caller, who
/// is responsible for delivering it.
pub async fn invite(
    State(state): State<AppState>,
    Extension(admin): Extension<AuthenticatedAdmin>,
    Json(payload): Json<InvitePayload>,
) -> Result<Json<InvitationResponse>> {
    admin.require_superadmin()?;

    let email = sigil_core::normalize_email(&payload.email);
    validate::validate_email(&email)?;

    let invitation = state.store.upsert_invitation(&email, admin.id).await?;
    let token = state.signer.issue_invite(&email)?;

    tracing::info!(%email, by = %admin.id, "invitation issued");
    Ok(Json(InvitationResponse::with_token(invitation, token)))
}

/// `GET /api/admins/` — list admin-role accounts.
pub async fn list(
    State(state): State<AppState>,
    Extension(admin): Extension<AuthenticatedAdmin>,
) -> Result<Json<Vec<UserResponse>>> {
    admin.require_superadmin()?;
    let admins = state.store.list_admins().await?;
    Ok(Json(admins.into_iter().map(UserResponse::from).collect()))
}
