#![allow(async_fn_in_trait)]

use storefront_domain::id::{CheckoutJobId, ProductId};

use crate::domain::types::{
    JobStatusRecord, NewOrder, OrderConfirmation, OrderInsert, OrderRecord, StockDecrement,
    VariantStock,
};
use crate::error::CheckoutServiceError;

/// Durable FIFO list of serialized job envelopes plus its dead-letter list.
///
/// Entries are pushed at one end and popped from the other; each pop is atomic, so no
/// entry is ever handed to two concurrent consumers.
pub trait QueueStore: Send + Sync {
    async fn push(&self, entry: &str) -> Result<(), CheckoutServiceError>;

    /// Remove and return the oldest entry, or `None` when empty.
    async fn pop(&self) -> Result<Option<String>, CheckoutServiceError>;

    async fn depth(&self) -> Result<u64, CheckoutServiceError>;

    async fn push_dead_letter(&self, entry: &str) -> Result<(), CheckoutServiceError>;

    async fn dead_letter_depth(&self) -> Result<u64, CheckoutServiceError>;

    /// Read up to `count` entries at the consuming end without removing them.
    async fn peek_tail(&self, count: usize) -> Result<Vec<String>, CheckoutServiceError>;

    async fn peek_dead_letter_tail(
        &self,
        count: usize,
    ) -> Result<Vec<String>, CheckoutServiceError>;
}

/// Keyed, TTL-bounded job status records.
pub trait JobStatusStore: Send + Sync {
    async fn set(&self, record: &JobStatusRecord, ttl_secs: u64)
    -> Result<(), CheckoutServiceError>;

    async fn get(
        &self,
        job_id: CheckoutJobId,
    ) -> Result<Option<JobStatusRecord>, CheckoutServiceError>;

    async fn delete(&self, job_id: CheckoutJobId) -> Result<(), CheckoutServiceError>;
}

/// Product variant stock owned by the catalog.
pub trait InventoryRepository: Send + Sync {
    /// All variants of the given products in one read.
    async fn find_variants(
        &self,
        product_ids: &[ProductId],
    ) -> Result<Vec<VariantStock>, CheckoutServiceError>;

    /// Apply every decrement guarded by `stock >= quantity`; returns how many guards
    /// matched. Implementations must leave stock untouched unless all of them match.
    async fn decrement_stock(
        &self,
        decrements: &[StockDecrement],
    ) -> Result<u64, CheckoutServiceError>;

    /// Give back stock taken by a successful `decrement_stock` whose order was never
    /// created by this attempt.
    async fn restore_stock(&self, decrements: &[StockDecrement])
    -> Result<(), CheckoutServiceError>;
}

/// Order store with a uniqueness constraint on the checkout job id.
pub trait OrderRepository: Send + Sync {
    async fn find_by_job_id(
        &self,
        job_id: CheckoutJobId,
    ) -> Result<Option<OrderRecord>, CheckoutServiceError>;

    async fn create(&self, order: &NewOrder) -> Result<OrderInsert, CheckoutServiceError>;
}

/// Outbound buyer notifications.
pub trait Notifier: Send + Sync {
    async fn send_order_confirmation(
        &self,
        confirmation: &OrderConfirmation,
    ) -> Result<(), CheckoutServiceError>;
}

/// Fire-and-forget request for a worker pass. Must not block or fail the caller.
pub trait WorkerSignal: Send + Sync {
    fn wake(&self);
}
