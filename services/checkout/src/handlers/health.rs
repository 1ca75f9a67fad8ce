use axum::{Json, extract::State, http::StatusCode};
use tracing::warn;

use storefront_core::health::{DependencyCheck, ReadinessBody, readiness};

use crate::infra::redis::ping;
use crate::state::AppState;

// ── GET /readyz ──────────────────────────────────────────────────────────────

pub async fn readyz(State(state): State<AppState>) -> (StatusCode, Json<ReadinessBody>) {
    let redis_ok = match ping(&state.redis).await {
        Ok(()) => true,
        Err(e) => {
            warn!(error = %e, "redis not ready");
            false
        }
    };
    let db_ok = match state.db.ping().await {
        Ok(()) => true,
        Err(e) => {
            warn!(error = %e, "database not ready");
            false
        }
    };
    readiness(vec![
        DependencyCheck {
            name: "redis",
            ok: redis_ok,
        },
        DependencyCheck {
            name: "database",
            ok: db_ok,
        },
    ])
}
