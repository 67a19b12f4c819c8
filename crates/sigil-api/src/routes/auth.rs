//! Login, invite-based registration, and profile handlers.

use axum::extract::State;
use axum::{Extension, Form, Json};

use sigil_auth::{hash_password, verify_password, AuthError, AuthenticatedAdmin};
use sigil_core::types::Role;
use sigil_core::util::validate;
use sigil_store::NewUser;

use crate::dto::{LoginForm, RegisterPayload, TokenResponse, UserResponse};
use crate::error::{ApiError, Result};
use crate::state::AppState;

/// `POST /api/token` — OAuth2 password-grant login.
///
/// Unknown email, wrong password, and inactive account all produce the same
/// 401 so callers cannot probe for accounts.
pub async fn login(
    State(state): State<AppState>,
    Form(form): Form<LoginForm>,
) -> Result<Json<TokenResponse>> {
    let email = sigil_core::normalize_email(&form.username);
    let creds = state
        .store
        .credentials_by_email(&email)
        .await?
        .ok_or(ApiError::BadCredentials)?;

    if !verify_password(&form.password, &creds.password_hash) {
        return Err(ApiError::BadCredentials);
    }
    if !creds.user.is_active {
        return Err(ApiError::BadCredentials);
    }

    let token = state.signer.issue_access(creds.user.id, creds.user.role)?;
    tracing::debug!(user = %creds.user.id, "login succeeded");
    Ok(Json(TokenResponse::bearer(token)))
}

/// `POST /api/register` — complete an invitation.
///
/// The token must be a valid invite token whose email still has a pending
/// invitation. The new account is an active admin and is logged in by the
/// returned token.
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterPayload>,
) -> Result<Json<TokenResponse>> {
    let email = state
        .signer
        .verify_invite(&payload.token)
        .map_err(|_| ApiError::BadInviteToken)?;
    validate::validate_password(&payload.password)?;

    let invitation = state
        .store
        .pending_invitation_by_email(&email)
        .await?
        .ok_or(ApiError::BadInviteToken)?;

    let password_hash = hash_password(&payload.password)?;
    let user = state
        .store
        .create_user(NewUser {
            email,
            password_hash,
            full_name: payload.full_name,
            role: Role::Admin,
            is_invited: true,
            invited_by: Some(invitation.invited_by),
        })
        .await?;
    state
        .store
        .mark_invitation_accepted(invitation.id, user.id)
        .await?;

    tracing::info!(user = %user.id, email = %user.email, "admin registered from invitation");
    let token = state.signer.issue_access(user.id, user.role)?;
    Ok(Json(TokenResponse::bearer(token)))
}

/// `GET /api/users/me` — profile of the requesting admin.
pub async fn me(
    State(state): State<AppState>,
    Extension(admin): Extension<AuthenticatedAdmin>,
) -> Result<Json<UserResponse>> {
    let user = state
        .store
        .user_by_id(admin.id)
        .await?
        .ok_or(AuthError::UnknownAccount)?;
    Ok(Json(user.into()))
}
