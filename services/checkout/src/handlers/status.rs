use axum::{
    Json,
    extract::{Path, State},
};
use chrono::{DateTime, Utc};
use serde::Serialize;

use storefront_auth_types::identity::IdentityHeaders;

use crate::domain::types::{JobState, JobStatusRecord};
use crate::error::CheckoutServiceError;
use crate::state::AppState;
use crate::usecase::status::Caller;

// ── GET /checkout/status/{job_id} ────────────────────────────────────────────

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobStatusResponse {
    pub job_id: String,
    pub state: JobState,
    pub user_id: String,
    pub order_number: String,
    #[serde(serialize_with = "storefront_core::serde::to_rfc3339_ms")]
    pub queued_at: DateTime<Utc>,
    #[serde(serialize_with = "storefront_core::serde::to_rfc3339_ms_opt")]
    pub processing_at: Option<DateTime<Utc>>,
    #[serde(serialize_with = "storefront_core::serde::to_rfc3339_ms_opt")]
    pub succeeded_at: Option<DateTime<Utc>>,
    #[serde(serialize_with = "storefront_core::serde::to_rfc3339_ms_opt")]
    pub failed_at: Option<DateTime<Utc>>,
    pub order_id: Option<String>,
    pub error: Option<String>,
}

impl From<JobStatusRecord> for JobStatusResponse {
    fn from(record: JobStatusRecord) -> Self {
        Self {
            job_id: record.job_id.to_string(),
            state: record.state,
            user_id: record.user_id.to_string(),
            order_number: record.order_number,
            queued_at: record.queued_at,
            processing_at: record.processing_at,
            succeeded_at: record.succeeded_at,
            failed_at: record.failed_at,
            order_id: record.order_id.map(|id| id.to_string()),
            error: record.error,
        }
    }
}

pub async fn get_job_status(
    identity: IdentityHeaders,
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> Result<Json<JobStatusResponse>, CheckoutServiceError> {
    let caller = Caller {
        user_id: identity.user_id,
        is_admin: identity.is_admin(),
    };
    let record = state.job_status().execute(caller, &job_id).await?;
    Ok(Json(record.into()))
}
