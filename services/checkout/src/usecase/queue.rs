use anyhow::Context as _;
use chrono::Utc;
use tracing::{error, warn};

use crate::domain::repository::QueueStore;
use crate::domain::types::{DeadLetterEntry, JobEnvelope};
use crate::error::CheckoutServiceError;

/// One popped queue entry.
#[derive(Debug)]
pub enum Dequeued {
    Job(JobEnvelope),
    /// Entry that failed to decode; already captured in the dead-letter list.
    Malformed {
        job_id: Option<String>,
        reason: String,
    },
}

/// Typed view over a [`QueueStore`]: envelopes in, envelopes out.
pub struct CheckoutQueue<Q: QueueStore> {
    pub store: Q,
}

impl<Q: QueueStore> CheckoutQueue<Q> {
    pub async fn enqueue(&self, envelope: &JobEnvelope) -> Result<(), CheckoutServiceError> {
        let raw = serde_json::to_string(envelope).context("serialize job envelope")?;
        self.store.push(&raw).await
    }

    pub async fn depth(&self) -> Result<u64, CheckoutServiceError> {
        self.store.depth().await
    }

    pub async fn dead_letter(&self, entry: &DeadLetterEntry) -> Result<(), CheckoutServiceError> {
        let raw = serde_json::to_string(entry).context("serialize dead-letter entry")?;
        self.store.push_dead_letter(&raw).await
    }

    /// Pop up to `max` entries in FIFO order.
    ///
    /// Undecodable entries are moved to the dead-letter list and reported as
    /// [`Dequeued::Malformed`]; they count toward `max`. A storage error after at least
    /// one successful pop ends the batch early instead of dropping what was taken.
    pub async fn take(&self, max: usize) -> Result<Vec<Dequeued>, CheckoutServiceError> {
        let mut taken = Vec::new();
        while taken.len() < max {
            let raw = match self.store.pop().await {
                Ok(Some(raw)) => raw,
                Ok(None) => break,
                Err(e) if taken.is_empty() => return Err(e),
                Err(e) => {
                    warn!(error = %e, taken = taken.len(), "queue pop failed mid-batch");
                    break;
                }
            };
            match serde_json::from_str::<JobEnvelope>(&raw) {
                Ok(envelope) => taken.push(Dequeued::Job(envelope)),
                Err(e) => {
                    let reason = format!("malformed queue entry: {e}");
                    let entry = DeadLetterEntry::malformed(raw, reason.clone(), Utc::now());
                    warn!(job_id = ?entry.job_id, %reason, "dead-lettering malformed entry");
                    if let Err(dl_err) = self.dead_letter(&entry).await {
                        error!(
                            error = %dl_err,
                            raw = ?entry.raw,
                            "failed to dead-letter malformed entry"
                        );
                    }
                    taken.push(Dequeued::Malformed {
                        job_id: entry.job_id,
                        reason,
                    });
                }
            }
        }
        Ok(taken)
    }
}
