//! Holder CRUD handlers.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;

use sigil_core::types::HolderId;
use sigil_core::util::validate;
use sigil_store::{Error as StoreError, HolderDraft};

use crate::dto::{HolderPayload, HolderResponse, PageQuery};
use crate::error::Result;
use crate::state::AppState;

/// Validate and normalize an incoming holder payload.
fn draft_from(payload: HolderPayload) -> Result<HolderDraft> {
    validate::validate_holder_name(&payload.name)?;

    let contact_email = payload
        .contact_email
        .map(|e| sigil_core::normalize_email(&e))
        .filter(|e| !e.is_empty());
    if let Some(email) = &contact_email {
        validate::validate_email(email)?;
    }

    Ok(HolderDraft {
        name: payload.name.trim().to_string(),
        contact_email,
        notes: payload.notes,
    })
}

/// `POST /api/holders/` — create a holder.
pub async fn create(
    State(state): State<AppState>,
    Json(payload): Json<HolderPayload>,
) -> Result<Json<HolderResponse>> {
    let draft = draft_from(payload)?;
    let holder = state.store.create_holder(draft).await?;
    tracing::info!(holder = %holder.id, "holder created");
    Ok(Json(holder.into()))
}

/// `GET /api/holders/` — list holders.
pub async fn list(
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> Result<Json<Vec<HolderResponse>>> {
    let holders = state.store.list_holders(query.page()).await?;
    Ok(Json(holders.into_iter().map(HolderResponse::from).collect()))
}

/// `GET /api/holders/{holder_id}` — fetch one holder.
pub async fn fetch(
    State(state): State<AppState>,
    Path(holder_id): Path<i64>,
) -> Result<Json<HolderResponse>> {
    let holder = state
        .store
        .holder_by_id(HolderId::new(holder_id))
        .await?
        .ok_or_else(|| StoreError::not_found("holder", holder_id))?;
    Ok(Json(holder.into()))
}

/// `PUT /api/holders/{holder_id}` — replace a holder's fields.
pub async fn update(
    State(state): State<AppState>,
    Path(holder_id): Path<i64>,
    Json(payload): Json<HolderPayload>,
) -> Result<Json<HolderResponse>> {
    let draft = draft_from(payload)?;
    let holder = state
        .store
        .update_holder(HolderId::new(holder_id), draft)
        .await?;
    Ok(Json(holder.into()))
}

/// `DELETE /api/holders/{holder_id}` — delete a holder.
///
/// Refused with 409 while any number remains linked to it.
pub async fn remove(
    State(state): State<AppState>,
    Path(holder_id): Path<i64>,
) -> Result<StatusCode> {
    state.store.delete_holder(HolderId::new(holder_id)).await?;
    tracing::info!(holder = holder_id, "holder deleted");
    Ok(StatusCode::NO_CONTENT)
}
