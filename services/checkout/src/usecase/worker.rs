use std::collections::{BTreeSet, HashMap};

use chrono::Utc;
use tracing::{error, info, warn};
use uuid::Uuid;

use storefront_domain::id::{CheckoutJobId, OrderId};

use crate::domain::repository::{
    InventoryRepository, JobStatusStore, Notifier, OrderRepository, QueueStore,
};
use crate::domain::types::{
    DeadLetterEntry, JobEnvelope, JobFailure, JobResult, JobState, JobStatusRecord, LineItem,
    MAX_WORKER_BATCH, NewOrder, OrderConfirmation, OrderInsert, StockDecrement, VariantKey,
    WorkerReport, stock_lookup,
};
use crate::error::CheckoutServiceError;
use crate::usecase::queue::{CheckoutQueue, Dequeued};

/// Clamp a requested batch size into `1..=MAX_WORKER_BATCH`.
pub fn clamp_batch(requested: usize) -> usize {
    requested.clamp(1, MAX_WORKER_BATCH)
}

/// Outcome of running one job, before status/dead-letter bookkeeping.
enum Processed {
    Done(OrderId),
    /// Status was already terminal; nothing was touched.
    AlreadyFinished(JobStatusRecord),
}

pub struct CheckoutWorkerUseCase<Q, S, I, O, N>
where
    Q: QueueStore,
    S: JobStatusStore,
    I: InventoryRepository,
    O: OrderRepository,
    N: Notifier,
{
    pub queue: CheckoutQueue<Q>,
    pub statuses: S,
    pub inventory: I,
    pub orders: O,
    pub notifier: N,
    pub status_ttl_secs: u64,
}

impl<Q, S, I, O, N> CheckoutWorkerUseCase<Q, S, I, O, N>
where
    Q: QueueStore,
    S: JobStatusStore,
    I: InventoryRepository,
    O: OrderRepository,
    N: Notifier,
{
    /// Pop up to `batch_size` jobs (clamped) and process them one at a time.
    ///
    /// Only a failure to pop at all is returned as an error; every per-job failure is
    /// recorded in the report.
    pub async fn execute(&self, batch_size: usize) -> Result<WorkerReport, CheckoutServiceError> {
        let taken = self.queue.take(clamp_batch(batch_size)).await?;
        let mut results = Vec::with_capacity(taken.len());
        for dequeued in taken {
            let result = match dequeued {
                Dequeued::Job(envelope) => self.process(envelope).await,
                Dequeued::Malformed { job_id, reason } => {
                    self.fail_malformed(job_id.as_deref(), &reason).await;
                    JobResult::failed(job_id, reason)
                }
            };
            results.push(result);
        }

        let succeeded = results.iter().filter(|r| r.ok).count();
        if !results.is_empty() {
            info!(
                processed = results.len(),
                succeeded,
                failed = results.len() - succeeded,
                "checkout worker pass finished"
            );
        }
        Ok(WorkerReport {
            processed: results.len(),
            results,
        })
    }

    async fn process(&self, envelope: JobEnvelope) -> JobResult {
        let job_id = envelope.id;
        let mut record = None;
        match self.run(&envelope, &mut record).await {
            Ok(Processed::Done(order_id)) => {
                info!(%job_id, %order_id, order_number = %envelope.payload.order_number, "checkout job succeeded");
                JobResult::succeeded(job_id, order_id)
            }
            Ok(Processed::AlreadyFinished(existing)) => {
                info!(%job_id, state = ?existing.state, "checkout job already finished, skipping");
                match (existing.state, existing.order_id) {
                    (JobState::Succeeded, Some(order_id)) => JobResult::succeeded(job_id, order_id),
                    _ => JobResult::failed(
                        Some(job_id.to_string()),
                        existing
                            .error
                            .unwrap_or_else(|| "job already failed".to_owned()),
                    ),
                }
            }
            Err(failure) => {
                let reason = failure.to_string();
                warn!(%job_id, %reason, "checkout job failed");
                self.record_failure(envelope, record, &reason).await;
                JobResult::failed(Some(job_id.to_string()), reason)
            }
        }
    }

    /// Steps 1-8 of a job. `record` holds the status as last successfully written so
    /// the failure path can finish it without a re-read; it stays `None` until then.
    async fn run(
        &self,
        envelope: &JobEnvelope,
        record: &mut Option<JobStatusRecord>,
    ) -> Result<Processed, JobFailure> {
        // 1. Mark processing
        let mut status = match self.statuses.get(envelope.id).await? {
            Some(existing) if existing.state.is_terminal() => {
                return Ok(Processed::AlreadyFinished(existing));
            }
            Some(existing) => existing,
            // Expired or never written: rebuild from the envelope.
            None => JobStatusRecord::queued(envelope),
        };
        if status.state == JobState::Queued {
            status.mark_processing(Utc::now())?;
        }
        self.statuses.set(&status, self.status_ttl_secs).await?;
        *record = Some(status.clone());

        // 2. Structural validation, never retried
        let payload = &envelope.payload;
        let valid = payload.validate()?;

        // Re-delivery after an earlier success: the order exists, stock is already taken.
        let order_id = match self.orders.find_by_job_id(envelope.id).await? {
            Some(existing) => existing.id,
            None => {
                // 3-5. Check and take stock
                let decrements = self.check_stock(&payload.items).await?;
                let matched = self.inventory.decrement_stock(&decrements).await?;
                if matched < decrements.len() as u64 {
                    return Err(JobFailure::StockChanged);
                }

                // 6. Idempotent order creation
                let order = NewOrder {
                    id: OrderId(Uuid::now_v7()),
                    checkout_job_id: envelope.id,
                    order_number: payload.order_number.clone(),
                    user_id: payload.buyer.id,
                    buyer_email: payload.buyer.email.clone(),
                    items: payload.items.clone(),
                    shipping_address: valid.shipping_address.clone(),
                    payment_method: valid.payment_method.to_owned(),
                    prices: payload.prices,
                    created_at: Utc::now(),
                };
                let order_id = self.create_order_once(&order, &decrements).await?;

                // 7. Best-effort notification
                self.notify(envelope, &order).await;
                order_id
            }
        };

        // 8. Terminal status. The order exists from here on, so the job is not failed
        //    over a lost status write; the record expires or is rewritten on replay.
        status.mark_succeeded(order_id, Utc::now())?;
        if let Err(e) = self.statuses.set(&status, self.status_ttl_secs).await {
            error!(job_id = %envelope.id, %order_id, error = %e, "failed to record job success");
        }
        Ok(Processed::Done(order_id))
    }

    /// Batch-read stock and verify every line; returns one decrement per variant.
    async fn check_stock(&self, items: &[LineItem]) -> Result<Vec<StockDecrement>, JobFailure> {
        let product_ids: Vec<_> = items
            .iter()
            .map(|item| item.product_id)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let available = stock_lookup(self.inventory.find_variants(&product_ids).await?);

        // Lines naming the same variant are summed so they cannot jointly oversell.
        let mut requested: Vec<(VariantKey, i32, &LineItem)> = Vec::new();
        let mut index: HashMap<VariantKey, usize> = HashMap::new();
        for item in items {
            if item.quantity <= 0 {
                return Err(JobFailure::InvalidQuantity {
                    product: item.name.clone(),
                });
            }
            let key = item.variant_key();
            match index.get(&key) {
                Some(&i) => {
                    requested[i].1 = requested[i].1.checked_add(item.quantity).ok_or_else(|| {
                        JobFailure::InvalidQuantity {
                            product: item.name.clone(),
                        }
                    })?;
                }
                None => {
                    index.insert(key.clone(), requested.len());
                    requested.push((key, item.quantity, item));
                }
            }
        }

        let mut decrements = Vec::with_capacity(requested.len());
        for (key, quantity, item) in requested {
            let stock = *available
                .get(&key)
                .ok_or_else(|| JobFailure::VariantNotFound {
                    product: item.name.clone(),
                    size: item.size.clone(),
                    color: item.color.clone(),
                })?;
            if stock < quantity {
                return Err(JobFailure::InsufficientStock {
                    product: item.name.clone(),
                    available: stock,
                    requested: quantity,
                });
            }
            decrements.push(StockDecrement { key, quantity });
        }
        decrements.sort_by(|a, b| a.key.cmp(&b.key));
        Ok(decrements)
    }

    /// Insert the order for stock this attempt has already taken. Unless a new order
    /// comes out of it, that stock is handed back before returning.
    async fn create_order_once(
        &self,
        order: &NewOrder,
        decrements: &[StockDecrement],
    ) -> Result<OrderId, JobFailure> {
        let inserted = self.orders.create(order).await;
        if !matches!(inserted, Ok(OrderInsert::Created)) {
            self.restore_stock(order.checkout_job_id, decrements).await;
        }
        match inserted? {
            OrderInsert::Created => Ok(order.id),
            OrderInsert::Duplicate => {
                let existing = self
                    .orders
                    .find_by_job_id(order.checkout_job_id)
                    .await?
                    .ok_or(JobFailure::OrderMissingAfterConflict)?;
                info!(
                    job_id = %order.checkout_job_id,
                    order_id = %existing.id,
                    "order already created by an earlier attempt"
                );
                Ok(existing.id)
            }
        }
    }

    async fn restore_stock(&self, job_id: CheckoutJobId, decrements: &[StockDecrement]) {
        match self.inventory.restore_stock(decrements).await {
            Ok(()) => info!(%job_id, variants = decrements.len(), "stock restored"),
            Err(e) => error!(%job_id, error = %e, ?decrements, "failed to restore stock"),
        }
    }

    async fn notify(&self, envelope: &JobEnvelope, order: &NewOrder) {
        let Some(email) = envelope.payload.buyer.email.clone() else {
            info!(job_id = %envelope.id, "no buyer email, skipping confirmation");
            return;
        };
        let confirmation = OrderConfirmation {
            order_id: order.id,
            order_number: order.order_number.clone(),
            email,
            name: envelope.payload.buyer.name.clone(),
            items: order.items.clone(),
            shipping_address: order.shipping_address.clone(),
            total_price: order.prices.total_price,
        };
        if let Err(e) = self.notifier.send_order_confirmation(&confirmation).await {
            warn!(job_id = %envelope.id, error = %e, "order confirmation not sent");
        }
    }

    async fn record_failure(
        &self,
        envelope: JobEnvelope,
        record: Option<JobStatusRecord>,
        reason: &str,
    ) {
        let now = Utc::now();
        let mut status = record.unwrap_or_else(|| JobStatusRecord::queued(&envelope));
        match status.mark_failed(reason, now) {
            Ok(()) => {
                if let Err(e) = self.statuses.set(&status, self.status_ttl_secs).await {
                    error!(job_id = %envelope.id, error = %e, "failed to record job failure");
                }
            }
            Err(e) => warn!(job_id = %envelope.id, error = %e, "status left unchanged"),
        }

        let job_id = envelope.id;
        let entry = DeadLetterEntry::failed_job(envelope, reason, now);
        if let Err(e) = self.queue.dead_letter(&entry).await {
            error!(%job_id, error = %e, "failed to dead-letter job");
        }
    }

    async fn fail_malformed(&self, job_id: Option<&str>, reason: &str) {
        let Some(job_id) = job_id.and_then(|id| id.parse::<CheckoutJobId>().ok()) else {
            return;
        };
        let mut status = match self.statuses.get(job_id).await {
            Ok(Some(status)) => status,
            Ok(None) => return,
            Err(e) => {
                warn!(%job_id, error = %e, "could not load status of malformed job");
                return;
            }
        };
        if status.mark_failed(reason, Utc::now()).is_ok() {
            if let Err(e) = self.statuses.set(&status, self.status_ttl_secs).await {
                error!(%job_id, error = %e, "failed to record malformed job failure");
            }
        }
    }
}
