//! Consumer side of the job status contract.
//!
//! A submitted checkout is only visible through its status record, so callers poll:
//! fixed interval, bounded attempts, a few tolerated 404s (the record may not be
//! readable yet), and an immediate stop on a terminal state.

#![allow(async_fn_in_trait)]

use std::time::Duration;

use anyhow::Context as _;
use reqwest::StatusCode;
use reqwest::header::HeaderMap;
use serde::Deserialize;

use crate::domain::types::JobState;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobStatusView {
    pub job_id: String,
    pub state: JobState,
    pub order_number: String,
    #[serde(default)]
    pub order_id: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug)]
pub enum StatusFetch {
    Found(JobStatusView),
    NotFound,
}

#[derive(Debug, thiserror::Error)]
pub enum PollError {
    #[error("job not found after {0} lookups")]
    NotFound(u32),
    #[error("job still pending after {attempts} attempts")]
    TimedOut {
        attempts: u32,
        last: Option<JobStatusView>,
    },
    #[error("unauthorized")]
    Unauthorized,
    #[error("forbidden")]
    Forbidden,
    #[error(transparent)]
    Transport(#[from] anyhow::Error),
}

#[derive(Debug, Clone, Copy)]
pub struct PollPolicy {
    pub interval: Duration,
    pub max_attempts: u32,
    /// 404 responses tolerated before the job is reported missing.
    pub max_not_found: u32,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(1),
            max_attempts: 30,
            max_not_found: 5,
        }
    }
}

pub trait StatusSource {
    async fn fetch(&self, job_id: &str) -> Result<StatusFetch, PollError>;
}

/// Reads `GET {base_url}/checkout/status/{job_id}` with the caller's identity headers.
pub struct HttpStatusSource {
    pub client: reqwest::Client,
    pub base_url: String,
    pub headers: HeaderMap,
}

impl StatusSource for HttpStatusSource {
    async fn fetch(&self, job_id: &str) -> Result<StatusFetch, PollError> {
        let url = format!(
            "{}/checkout/status/{job_id}",
            self.base_url.trim_end_matches('/')
        );
        let resp = self
            .client
            .get(&url)
            .headers(self.headers.clone())
            .send()
            .await
            .context("request job status")?;
        match resp.status() {
            StatusCode::NOT_FOUND => Ok(StatusFetch::NotFound),
            StatusCode::UNAUTHORIZED => Err(PollError::Unauthorized),
            StatusCode::FORBIDDEN => Err(PollError::Forbidden),
            _ => {
                let view = resp
                    .error_for_status()
                    .context("job status lookup failed")?
                    .json::<JobStatusView>()
                    .await
                    .context("decode job status")?;
                Ok(StatusFetch::Found(view))
            }
        }
    }
}

/// Poll until the job reaches `succeeded` or `failed`.
///
/// A terminal `failed` record is returned as `Ok`; its `error` carries the reason.
pub async fn poll_job_status<S: StatusSource>(
    source: &S,
    job_id: &str,
    policy: PollPolicy,
) -> Result<JobStatusView, PollError> {
    let mut not_found = 0;
    let mut last = None;
    for attempt in 1..=policy.max_attempts {
        match source.fetch(job_id).await? {
            StatusFetch::Found(view) if view.state.is_terminal() => return Ok(view),
            StatusFetch::Found(view) => last = Some(view),
            StatusFetch::NotFound => {
                not_found += 1;
                if not_found >= policy.max_not_found {
                    return Err(PollError::NotFound(not_found));
                }
            }
        }
        if attempt < policy.max_attempts {
            tokio::time::sleep(policy.interval).await;
        }
    }
    Err(PollError::TimedOut {
        attempts: policy.max_attempts,
        last,
    })
}
