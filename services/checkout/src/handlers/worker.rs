use axum::{
    Json,
    extract::{Query, State},
    http::HeaderMap,
};
use serde::Deserialize;

use crate::domain::types::WorkerReport;
use crate::error::CheckoutServiceError;
use crate::handlers::bearer_matches;
use crate::state::AppState;

/// Set by the platform scheduler on cron-triggered calls.
pub const X_SCHEDULER_ORIGIN: &str = "x-scheduler-origin";

// ── POST|GET /checkout/worker ────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct WorkerQuery {
    pub batch: Option<usize>,
}

pub async fn run_worker(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<WorkerQuery>,
) -> Result<Json<WorkerReport>, CheckoutServiceError> {
    let from_scheduler =
        state.config.trust_scheduler_header && headers.contains_key(X_SCHEDULER_ORIGIN);
    if !from_scheduler && !bearer_matches(&headers, &state.config.worker_secret) {
        return Err(CheckoutServiceError::Unauthorized);
    }
    let batch = query.batch.unwrap_or(state.config.worker_batch_size);
    let report = state.checkout_worker().execute(batch).await?;
    Ok(Json(report))
}
