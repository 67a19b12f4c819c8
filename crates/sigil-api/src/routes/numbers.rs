//! Unique-number handlers: CRUD plus link/unlink.

use axum::extract::{Path, Query, State};
use axum::{Extension, Json};

use sigil_auth::AuthenticatedAdmin;
use sigil_core::types::{HolderId, NumberId};
use sigil_core::util::validate;

use crate::dto::{NumberListQuery, NumberPayload, NumberResponse};
use crate::error::Result;
use crate::state::AppState;

/// `POST /api/numbers/` — register a new (unlinked) number.
pub async fn create(
    State(state): State<AppState>,
    Json(payload): Json<NumberPayload>,
) -> Result<Json<NumberResponse>> {
    let number = sigil_core::normalize_number(&payload.number);
    validate::validate_number(&number)?;

    let created = state.store.create_number(&number).await?;
    tracing::info!(number = %created.number, "number registered");
    Ok(Json(created.into()))
}

/// `GET /api/numbers/` — list numbers, optionally filtered by holder.
pub async fn list(
    State(state): State<AppState>,
    Query(query): Query<NumberListQuery>,
) -> Result<Json<Vec<NumberResponse>>> {
    let holder = query.holder_id.map(HolderId::new);
    let numbers = state.store.list_numbers(query.page(), holder).await?;
    Ok(Json(numbers.into_iter().map(NumberResponse::from).collect()))
}

/// `POST /api/holders/{holder_id}/numbers/{number_id}/link` — assign a
/// number to a holder. The audit event records the acting admin.
pub async fn link(
    State(state): State<AppState>,
    Extension(admin): Extension<AuthenticatedAdmin>,
    Path((holder_id, number_id)): Path<(i64, i64)>,
) -> Result<Json<NumberResponse>> {
    let linked = state
        .store
        .link_number(HolderId::new(holder_id), NumberId::new(number_id), admin.id)
        .await?;
    tracing::info!(holder = holder_id, number = number_id, by = %admin.id, "number linked");
    Ok(Json(linked.into()))
}

/// `POST /api/holders/{holder_id}/numbers/{number_id}/unlink` — release a
/// number from the holder it is currently linked to.
pub async fn unlink(
    State(state): State<AppState>,
    Extension(admin): Extension<AuthenticatedAdmin>,
    Path((holder_id, number_id)): Path<(i64, i64)>,
) -> Result<Json<NumberResponse>> {
    let released = state
        .store
        .unlink_number(HolderId::new(holder_id), NumberId::new(number_id), admin.id)
        .await?;
    tracing::info!(holder = holder_id, number = number_id, by = %admin.id, "number unlinked");
    Ok(Json(released.into()))
}
