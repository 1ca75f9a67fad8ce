use serde::Deserialize;

use storefront_core::config::Config;

use crate::domain::types::{DEFAULT_JOB_STATUS_TTL_SECS, DEFAULT_MAX_QUEUE_DEPTH};

/// Checkout service configuration loaded from environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct CheckoutConfig {
    /// PostgreSQL connection URL (inventory and orders).
    pub database_url: String,
    /// Redis connection URL (queue, dead-letter list, job status).
    pub redis_url: String,
    /// TCP port to listen on (default 3114). Env var: `CHECKOUT_PORT`.
    #[serde(default = "default_port")]
    pub checkout_port: u16,
    /// Bearer secret accepted by the worker trigger endpoint.
    pub worker_secret: String,
    /// Bearer secret for the queue inspection endpoint. Unset disables it.
    #[serde(default)]
    pub debug_secret: Option<String>,
    /// Accept `x-scheduler-origin` in place of the worker secret.
    #[serde(default)]
    pub trust_scheduler_header: bool,
    #[serde(default = "default_max_queue_depth")]
    pub max_queue_depth: u64,
    #[serde(default = "default_batch_size")]
    pub worker_batch_size: usize,
    /// External worker trigger. When unset, wake-ups run a pass in-process.
    #[serde(default)]
    pub worker_wake_url: Option<String>,
    /// Interval of the in-process scheduled worker pass. Unset disables it.
    #[serde(default)]
    pub worker_interval_secs: Option<u64>,
    #[serde(default)]
    pub notification_url: Option<String>,
    #[serde(default = "default_status_ttl")]
    pub job_status_ttl_secs: u64,
}

impl Config for CheckoutConfig {}

fn default_port() -> u16 {
    3114
}

fn default_max_queue_depth() -> u64 {
    DEFAULT_MAX_QUEUE_DEPTH
}

fn default_batch_size() -> usize {
    10
}

fn default_status_ttl() -> u64 {
    DEFAULT_JOB_STATUS_TTL_SECS
}
