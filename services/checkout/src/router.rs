use axum::{
    Router,
    routing::{get, post},
};
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use storefront_core::health::healthz;
use storefront_core::middleware::{propagate_request_id_layer, request_id_layer};

use crate::handlers::{
    checkout::submit_checkout, debug::inspect_queue, health::readyz, status::get_job_status,
    worker::run_worker,
};
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        // Health
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        // Producer
        .route("/checkout", post(submit_checkout))
        // Poller
        .route("/checkout/status/{job_id}", get(get_job_status))
        // Worker trigger (scheduler sends GET, wake-ups POST)
        .route("/checkout/worker", post(run_worker).get(run_worker))
        // Operator inspection
        .route("/checkout/debug/queue", get(inspect_queue))
        .layer(
            ServiceBuilder::new()
                .layer(request_id_layer())
                .layer(TraceLayer::new_for_http())
                .layer(propagate_request_id_layer()),
        )
        .with_state(state)
}
