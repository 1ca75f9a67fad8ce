use axum::Json;
use axum::http::StatusCode;
use serde::Serialize;

/// Handler for `GET /healthz`: liveness check.
pub async fn healthz() -> StatusCode {
    StatusCode::OK
}

/// Outcome of one dependency probe in a readiness check.
#[derive(Debug, Clone, Serialize)]
pub struct DependencyCheck {
    pub name: &'static str,
    pub ok: bool,
}

#[derive(Debug, Serialize)]
pub struct ReadinessBody {
    pub ready: bool,
    pub checks: Vec<DependencyCheck>,
}

/// Fold dependency probes into a `/readyz` response: 200 when all pass, 503 otherwise.
pub fn readiness(checks: Vec<DependencyCheck>) -> (StatusCode, Json<ReadinessBody>) {
    let ready = checks.iter().all(|c| c.ok);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (status, Json(ReadinessBody { ready, checks }))
}
