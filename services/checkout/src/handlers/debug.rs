use axum::{
    Json,
    extract::{Query, State},
    http::HeaderMap,
};
use serde::Deserialize;

use crate::domain::types::QueueSnapshot;
use crate::error::CheckoutServiceError;
use crate::handlers::bearer_matches;
use crate::state::AppState;

// ── GET /checkout/debug/queue ────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct InspectQuery {
    #[serde(default)]
    pub peek: usize,
}

pub async fn inspect_queue(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<InspectQuery>,
) -> Result<Json<QueueSnapshot>, CheckoutServiceError> {
    let authorized = state
        .config
        .debug_secret
        .as_deref()
        .is_some_and(|secret| bearer_matches(&headers, secret));
    if !authorized {
        return Err(CheckoutServiceError::Unauthorized);
    }
    let snapshot = state.inspect_queue().execute(query.peek).await?;
    Ok(Json(snapshot))
}
