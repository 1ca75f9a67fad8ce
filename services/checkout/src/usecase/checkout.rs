use chrono::{DateTime, Utc};
use rand::RngExt;
use tracing::{info, warn};

use storefront_domain::id::CheckoutJobId;

use crate::domain::repository::{JobStatusStore, QueueStore, WorkerSignal};
use crate::domain::types::{
    Buyer, JobEnvelope, JobPayload, JobStatusRecord, LineItem, MAX_LINE_QUANTITY, MAX_ORDER_ITEMS,
    PriceTotals, ShippingAddressInput,
};
use crate::error::CheckoutServiceError;
use crate::usecase::queue::CheckoutQueue;

/// Charset for the random order-number suffix (uppercase alphanumeric).
const CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

const ORDER_NUMBER_SUFFIX_LEN: usize = 6;

/// Human-readable order number: `ORD-<UTC yyyymmddHHMMSS>-<6 random chars>`.
pub fn generate_order_number(now: DateTime<Utc>) -> String {
    let mut rng = rand::rng();
    let suffix: String = (0..ORDER_NUMBER_SUFFIX_LEN)
        .map(|_| CHARSET[rng.random_range(0..CHARSET.len())] as char)
        .collect();
    format!("ORD-{}-{suffix}", now.format("%Y%m%d%H%M%S"))
}

pub struct SubmitCheckoutInput {
    pub buyer: Buyer,
    pub order_items: Vec<LineItem>,
    pub shipping_address: Option<ShippingAddressInput>,
    pub payment_method: Option<String>,
    pub prices: PriceTotals,
}

#[derive(Debug)]
pub struct SubmitCheckoutOutput {
    pub job_id: CheckoutJobId,
    pub order_number: String,
}

pub struct SubmitCheckoutUseCase<Q, S, W>
where
    Q: QueueStore,
    S: JobStatusStore,
    W: WorkerSignal,
{
    pub queue: CheckoutQueue<Q>,
    pub statuses: S,
    pub signal: W,
    pub max_queue_depth: u64,
    pub status_ttl_secs: u64,
}

impl<Q, S, W> SubmitCheckoutUseCase<Q, S, W>
where
    Q: QueueStore,
    S: JobStatusStore,
    W: WorkerSignal,
{
    pub async fn execute(
        &self,
        input: SubmitCheckoutInput,
    ) -> Result<SubmitCheckoutOutput, CheckoutServiceError> {
        // 1. Shape checks, no side effects → 400
        if input.order_items.is_empty() {
            return Err(CheckoutServiceError::EmptyOrder);
        }
        if input.order_items.len() > MAX_ORDER_ITEMS {
            return Err(CheckoutServiceError::TooManyItems {
                max: MAX_ORDER_ITEMS,
            });
        }
        if input
            .order_items
            .iter()
            .any(|item| !(1..=MAX_LINE_QUANTITY).contains(&item.quantity))
        {
            return Err(CheckoutServiceError::InvalidQuantity {
                max: MAX_LINE_QUANTITY,
            });
        }
        let shipping_address = input
            .shipping_address
            .ok_or(CheckoutServiceError::MissingShippingAddress)?
            .into_address();
        let payment_method = input
            .payment_method
            .map(|m| m.trim().to_owned())
            .filter(|m| !m.is_empty())
            .ok_or(CheckoutServiceError::MissingPaymentMethod)?;

        // 2. Admission control → 503
        let depth = self
            .queue
            .depth()
            .await
            .map_err(CheckoutServiceError::into_unavailable)?;
        if depth > self.max_queue_depth {
            warn!(depth, max = self.max_queue_depth, "checkout queue over high-water mark");
            return Err(CheckoutServiceError::QueueBusy);
        }

        // 3. Build envelope
        let now = Utc::now();
        let envelope = JobEnvelope {
            id: CheckoutJobId::generate(),
            created_at: now,
            payload: JobPayload {
                buyer: input.buyer,
                order_number: generate_order_number(now),
                items: input.order_items,
                shipping_address: Some(shipping_address),
                payment_method: Some(payment_method),
                prices: input.prices,
            },
        };

        // 4. Status before push: a fast worker must never see its `processing` write
        //    overwritten by a late `queued`.
        self.statuses
            .set(&JobStatusRecord::queued(&envelope), self.status_ttl_secs)
            .await
            .map_err(CheckoutServiceError::into_unavailable)?;

        // 5. Enqueue; without a persisted job there is no success
        if let Err(e) = self.queue.enqueue(&envelope).await {
            if let Err(cleanup) = self.statuses.delete(envelope.id).await {
                warn!(job_id = %envelope.id, error = %cleanup, "failed to remove orphan status");
            }
            return Err(e.into_unavailable());
        }

        // 6. Best-effort wake-up
        self.signal.wake();

        info!(
            job_id = %envelope.id,
            order_number = %envelope.payload.order_number,
            items = envelope.payload.items.len(),
            "checkout job queued"
        );
        Ok(SubmitCheckoutOutput {
            job_id: envelope.id,
            order_number: envelope.payload.order_number,
        })
    }
}
