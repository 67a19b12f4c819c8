//! Link/unlink audit-trail handlers.

use axum::extract::{Query, State};
use axum::Json;

use sigil_core::types::{HolderId, NumberId, UserId};
use sigil_store::HistoryFilter;

use crate::dto::{EventResponse, HistoryQuery};
use crate::error::Result;
use crate::state::AppState;

/// `GET /api/history/` — list link/unlink events, newest first.
///
/// Filters are exact matches; an ID of zero filters for id 0 rather than
/// being ignored.
pub async fn list(
    State(state): State<AppState>,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<Vec<EventResponse>>> {
    let filter = HistoryFilter {
        holder_id: query.holder_id.map(HolderId::new),
        number_id: query.number_id.map(NumberId::new),
        admin_id: query.admin_id.map(UserId::new),
    };
    let events = state.store.list_history(filter, query.page()).await?;
    Ok(Json(events.into_iter().map(EventResponse::from).collect()))
}
