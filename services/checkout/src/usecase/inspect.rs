use crate::domain::repository::QueueStore;
use crate::domain::types::QueueSnapshot;
use crate::error::CheckoutServiceError;

/// Upper bound on entries returned per list by one inspection.
pub const MAX_PEEK: usize = 20;

pub struct InspectQueueUseCase<Q: QueueStore> {
    pub store: Q,
}

impl<Q: QueueStore> InspectQueueUseCase<Q> {
    pub async fn execute(&self, peek: usize) -> Result<QueueSnapshot, CheckoutServiceError> {
        let peek = peek.min(MAX_PEEK);
        let queue_length = self.store.depth().await?;
        let dead_letter_length = self.store.dead_letter_depth().await?;
        let (queue_tail, dead_letter_tail) = if peek == 0 {
            (vec![], vec![])
        } else {
            (
                self.store.peek_tail(peek).await?,
                self.store.peek_dead_letter_tail(peek).await?,
            )
        };
        Ok(QueueSnapshot {
            queue_length,
            dead_letter_length,
            queue_tail: queue_tail.into_iter().map(as_json).collect(),
            dead_letter_tail: dead_letter_tail.into_iter().map(as_json).collect(),
        })
    }
}

fn as_json(raw: String) -> serde_json::Value {
    serde_json::from_str(&raw).unwrap_or(serde_json::Value::String(raw))
}
