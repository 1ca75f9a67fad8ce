use tracing::warn;

use crate::domain::repository::WorkerSignal;
use crate::state::AppState;

/// How the producer asks for a worker pass after enqueueing.
#[derive(Clone)]
pub enum WorkerWaker {
    /// POST to an external worker trigger, authorized with the worker secret.
    Http {
        client: reqwest::Client,
        url: String,
        secret: String,
    },
    /// Run a pass on this process's runtime.
    InProcess { state: AppState, batch: usize },
}

impl WorkerSignal for WorkerWaker {
    fn wake(&self) {
        match self.clone() {
            Self::Http {
                client,
                url,
                secret,
            } => {
                tokio::spawn(async move {
                    let result = client
                        .post(&url)
                        .bearer_auth(secret)
                        .send()
                        .await
                        .and_then(reqwest::Response::error_for_status);
                    if let Err(e) = result {
                        warn!(error = %e, "worker wake-up failed; scheduled pass will pick up the job");
                    }
                });
            }
            Self::InProcess { state, batch } => {
                tokio::spawn(async move {
                    if let Err(e) = state.checkout_worker().execute(batch).await {
                        warn!(error = %e, "in-process worker pass failed");
                    }
                });
            }
        }
    }
}
