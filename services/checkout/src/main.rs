use std::sync::Arc;
use std::time::Duration;

use sea_orm::Database;
use tracing::{info, warn};

use storefront_checkout::config::CheckoutConfig;
use storefront_checkout::router::build_router;
use storefront_checkout::state::AppState;
use storefront_core::config::Config;
use storefront_core::tracing::init_tracing;

#[tokio::main]
async fn main() {
    init_tracing("info");

    let config = CheckoutConfig::from_env();

    let db = Database::connect(&config.database_url)
        .await
        .expect("failed to connect to database");

    let redis_cfg = deadpool_redis::Config::from_url(&config.redis_url);
    let redis = redis_cfg
        .create_pool(Some(deadpool_redis::Runtime::Tokio1))
        .expect("failed to create Redis pool");

    let state = AppState {
        db,
        redis,
        config: Arc::new(config),
        http: reqwest::Client::new(),
    };

    // Scheduled pass: picks up jobs whose wake-up was lost.
    if let Some(secs) = state.config.worker_interval_secs.filter(|s| *s > 0) {
        let worker_state = state.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(Duration::from_secs(secs));
            loop {
                ticker.tick().await;
                let batch = worker_state.config.worker_batch_size;
                if let Err(e) = worker_state.checkout_worker().execute(batch).await {
                    warn!(error = %e, "scheduled worker pass failed");
                }
            }
        });
        info!(interval_secs = secs, "scheduled checkout worker enabled");
    }

    let router = build_router(state.clone());
    let addr = format!("0.0.0.0:{}", state.config.checkout_port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("failed to bind");

    info!("checkout service listening on {addr}");
    axum::serve(listener, router).await.expect("server error");
}
