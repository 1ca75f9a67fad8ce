use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use storefront_domain::id::{CheckoutJobId, OrderId, ProductId};

/// Maximum number of line items in one checkout request.
pub const MAX_ORDER_ITEMS: usize = 50;

/// Largest quantity accepted on a single line item.
pub const MAX_LINE_QUANTITY: i32 = 999;

/// Hard cap on jobs popped by one worker pass.
pub const MAX_WORKER_BATCH: usize = 25;

/// Queue depth above which new checkouts are rejected (admission control).
pub const DEFAULT_MAX_QUEUE_DEPTH: u64 = 2000;

/// Job status retention window in seconds (24 hours).
pub const DEFAULT_JOB_STATUS_TTL_SECS: u64 = 86_400;

// ── Checkout payload ─────────────────────────────────────────────────────────

/// One ordered line, snapshotted from the cart at submit time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    pub product_id: ProductId,
    pub name: String,
    pub price: f64,
    pub quantity: i32,
    pub size: String,
    /// Selected color name; together with product and size it names a variant.
    pub color: String,
    #[serde(default)]
    pub image: Option<String>,
}

impl LineItem {
    pub fn variant_key(&self) -> VariantKey {
        VariantKey {
            product_id: self.product_id,
            size: self.size.clone(),
            color_name: self.color.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShippingAddress {
    pub full_name: String,
    pub address: String,
    pub city: String,
    pub postal_code: String,
    pub country: String,
    #[serde(default)]
    pub phone: Option<String>,
}

/// Address as submitted by clients, which may split the recipient name.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShippingAddressInput {
    pub full_name: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub postal_code: String,
    #[serde(default)]
    pub country: String,
    pub phone: Option<String>,
}

impl ShippingAddressInput {
    /// Normalise into a stored address, synthesizing `full_name` from first/last
    /// when the client did not send a combined name.
    pub fn into_address(self) -> ShippingAddress {
        let full_name = match self.full_name.filter(|n| !n.trim().is_empty()) {
            Some(name) => name.trim().to_owned(),
            None => [self.first_name, self.last_name]
                .into_iter()
                .flatten()
                .map(|part| part.trim().to_owned())
                .filter(|part| !part.is_empty())
                .collect::<Vec<_>>()
                .join(" "),
        };
        ShippingAddress {
            full_name,
            address: self.address,
            city: self.city,
            postal_code: self.postal_code,
            country: self.country,
            phone: self.phone,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceTotals {
    pub items_price: f64,
    pub tax_price: f64,
    pub shipping_price: f64,
    pub total_price: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Buyer {
    pub id: Uuid,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

/// Immutable snapshot of a checkout request carried by a queued job.
///
/// Address and payment method stay optional on the wire so that a structurally
/// incomplete entry still deserializes and is rejected by [`JobPayload::validate`]
/// with a precise reason.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobPayload {
    pub buyer: Buyer,
    pub order_number: String,
    pub items: Vec<LineItem>,
    #[serde(default)]
    pub shipping_address: Option<ShippingAddress>,
    #[serde(default)]
    pub payment_method: Option<String>,
    pub prices: PriceTotals,
}

/// Payload fields a job cannot be processed without.
pub struct ValidatedPayload<'a> {
    pub shipping_address: &'a ShippingAddress,
    pub payment_method: &'a str,
}

impl JobPayload {
    pub fn validate(&self) -> Result<ValidatedPayload<'_>, JobFailure> {
        if self.buyer.id.is_nil() {
            return Err(JobFailure::InvalidPayload("missing buyer id"));
        }
        if self.items.is_empty() {
            return Err(JobFailure::InvalidPayload("no order items"));
        }
        let shipping_address = self
            .shipping_address
            .as_ref()
            .ok_or(JobFailure::InvalidPayload("missing shipping address"))?;
        let payment_method = self
            .payment_method
            .as_deref()
            .map(str::trim)
            .filter(|m| !m.is_empty())
            .ok_or(JobFailure::InvalidPayload("missing payment method"))?;
        Ok(ValidatedPayload {
            shipping_address,
            payment_method,
        })
    }
}

/// Queue entry: a checkout request wrapped with its job identity. Never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobEnvelope {
    pub id: CheckoutJobId,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub created_at: DateTime<Utc>,
    pub payload: JobPayload,
}

// ── Job status ───────────────────────────────────────────────────────────────

/// Lifecycle state. Declaration order is transition order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobState {
    Queued,
    Processing,
    Succeeded,
    Failed,
}

impl JobState {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed)
    }

    /// `queued → processing → {succeeded | failed}`; `queued → failed` is allowed for
    /// entries that never reach processing (malformed queue entries).
    pub fn can_transition_to(self, next: JobState) -> bool {
        match (self, next) {
            (Self::Queued, Self::Processing | Self::Failed) => true,
            (Self::Processing, Self::Succeeded | Self::Failed) => true,
            _ => false,
        }
    }
}

#[derive(Debug, thiserror::Error)]
#[error("cannot move job from {from:?} to {to:?}")]
pub struct InvalidTransition {
    pub from: JobState,
    pub to: JobState,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobStatusRecord {
    pub job_id: CheckoutJobId,
    pub state: JobState,
    pub user_id: Uuid,
    pub order_number: String,
    pub queued_at: DateTime<Utc>,
    #[serde(default)]
    pub processing_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub succeeded_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub failed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub order_id: Option<OrderId>,
    #[serde(default)]
    pub error: Option<String>,
}

impl JobStatusRecord {
    pub fn queued(envelope: &JobEnvelope) -> Self {
        Self {
            job_id: envelope.id,
            state: JobState::Queued,
            user_id: envelope.payload.buyer.id,
            order_number: envelope.payload.order_number.clone(),
            queued_at: envelope.created_at,
            processing_at: None,
            succeeded_at: None,
            failed_at: None,
            order_id: None,
            error: None,
        }
    }

    fn advance(&mut self, next: JobState) -> Result<(), InvalidTransition> {
        if !self.state.can_transition_to(next) {
            return Err(InvalidTransition {
                from: self.state,
                to: next,
            });
        }
        self.state = next;
        Ok(())
    }

    pub fn mark_processing(&mut self, at: DateTime<Utc>) -> Result<(), InvalidTransition> {
        self.advance(JobState::Processing)?;
        self.processing_at = Some(at);
        Ok(())
    }

    pub fn mark_succeeded(
        &mut self,
        order_id: OrderId,
        at: DateTime<Utc>,
    ) -> Result<(), InvalidTransition> {
        self.advance(JobState::Succeeded)?;
        self.succeeded_at = Some(at);
        self.order_id = Some(order_id);
        Ok(())
    }

    pub fn mark_failed(
        &mut self,
        reason: impl Into<String>,
        at: DateTime<Utc>,
    ) -> Result<(), InvalidTransition> {
        self.advance(JobState::Failed)?;
        self.failed_at = Some(at);
        self.error = Some(reason.into());
        Ok(())
    }
}

// ── Dead letter ──────────────────────────────────────────────────────────────

/// Record of a job that could not be completed. Append-only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeadLetterEntry {
    pub job_id: Option<String>,
    pub failed_at: DateTime<Utc>,
    pub reason: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub envelope: Option<JobEnvelope>,
    /// Undecodable queue entry, verbatim.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw: Option<String>,
}

impl DeadLetterEntry {
    pub fn failed_job(envelope: JobEnvelope, reason: impl Into<String>, at: DateTime<Utc>) -> Self {
        Self {
            job_id: Some(envelope.id.to_string()),
            failed_at: at,
            reason: reason.into(),
            envelope: Some(envelope),
            raw: None,
        }
    }

    pub fn malformed(raw: String, reason: impl Into<String>, at: DateTime<Utc>) -> Self {
        Self {
            job_id: extract_job_id(&raw),
            failed_at: at,
            reason: reason.into(),
            envelope: None,
            raw: Some(raw),
        }
    }
}

/// Best-effort recovery of the `id` field from an entry that failed to decode.
pub fn extract_job_id(raw: &str) -> Option<String> {
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(raw) {
        return value.get("id").and_then(|v| v.as_str()).map(str::to_owned);
    }
    // Not JSON at all (truncated write etc.): scan for `"id":"..."`.
    let rest = &raw[raw.find("\"id\"")? + 4..];
    let rest = rest.trim_start().strip_prefix(':')?.trim_start();
    let rest = rest.strip_prefix('"')?;
    let id = &rest[..rest.find('"')?];
    (!id.is_empty()).then(|| id.to_owned())
}

// ── Processing failures ──────────────────────────────────────────────────────

/// Why a dequeued job did not produce an order. `Display` is the buyer-facing reason.
#[derive(Debug, thiserror::Error)]
pub enum JobFailure {
    #[error("{0}")]
    InvalidPayload(&'static str),
    #[error("invalid quantity for {product}")]
    InvalidQuantity { product: String },
    #[error("variant not found: {product} ({size}/{color})")]
    VariantNotFound {
        product: String,
        size: String,
        color: String,
    },
    #[error("insufficient stock for {product}: {available} available, {requested} requested")]
    InsufficientStock {
        product: String,
        available: i32,
        requested: i32,
    },
    #[error("stock changed, please retry")]
    StockChanged,
    #[error("order for job already exists but could not be loaded")]
    OrderMissingAfterConflict,
    #[error("internal error: {0}")]
    Store(anyhow::Error),
}

impl From<crate::error::CheckoutServiceError> for JobFailure {
    fn from(err: crate::error::CheckoutServiceError) -> Self {
        match err {
            crate::error::CheckoutServiceError::Internal(e)
            | crate::error::CheckoutServiceError::QueueUnavailable(e) => Self::Store(e),
            other => Self::Store(anyhow::anyhow!(other.to_string())),
        }
    }
}

impl From<InvalidTransition> for JobFailure {
    fn from(err: InvalidTransition) -> Self {
        Self::Store(err.into())
    }
}

// ── Inventory ────────────────────────────────────────────────────────────────

/// Ordered by product, then size, then colour; stock writes follow this order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VariantKey {
    pub product_id: ProductId,
    pub size: String,
    pub color_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariantStock {
    pub key: VariantKey,
    pub stock: i32,
}

/// Guarded decrement: applies only while current stock >= `quantity`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StockDecrement {
    pub key: VariantKey,
    pub quantity: i32,
}

/// In-memory lookup built from one batch read.
pub fn stock_lookup(variants: Vec<VariantStock>) -> HashMap<VariantKey, i32> {
    variants.into_iter().map(|v| (v.key, v.stock)).collect()
}

// ── Orders ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct NewOrder {
    pub id: OrderId,
    pub checkout_job_id: CheckoutJobId,
    pub order_number: String,
    pub user_id: Uuid,
    pub buyer_email: Option<String>,
    pub items: Vec<LineItem>,
    pub shipping_address: ShippingAddress,
    pub payment_method: String,
    pub prices: PriceTotals,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrderRecord {
    pub id: OrderId,
    pub checkout_job_id: CheckoutJobId,
    pub order_number: String,
}

/// Result of an insert keyed by checkout job id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderInsert {
    Created,
    /// A row with the same checkout job id already exists.
    Duplicate,
}

/// Body of the best-effort confirmation mail.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderConfirmation {
    pub order_id: OrderId,
    pub order_number: String,
    pub email: String,
    pub name: Option<String>,
    pub items: Vec<LineItem>,
    pub shipping_address: ShippingAddress,
    pub total_price: f64,
}

// ── Worker report ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobResult {
    pub job_id: Option<String>,
    pub ok: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order_id: Option<OrderId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl JobResult {
    pub fn succeeded(job_id: CheckoutJobId, order_id: OrderId) -> Self {
        Self {
            job_id: Some(job_id.to_string()),
            ok: true,
            order_id: Some(order_id),
            error: None,
        }
    }

    pub fn failed(job_id: Option<String>, error: impl Into<String>) -> Self {
        Self {
            job_id,
            ok: false,
            order_id: None,
            error: Some(error.into()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkerReport {
    pub processed: usize,
    pub results: Vec<JobResult>,
}

// ── Inspection ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueSnapshot {
    pub queue_length: u64,
    pub dead_letter_length: u64,
    pub queue_tail: Vec<serde_json::Value>,
    pub dead_letter_tail: Vec<serde_json::Value>,
}
