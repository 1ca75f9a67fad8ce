use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use chrono::Utc;
use uuid::Uuid;

use storefront_checkout::domain::repository::{
    InventoryRepository, JobStatusStore, Notifier, OrderRepository, QueueStore, WorkerSignal,
};
use storefront_checkout::domain::types::{
    Buyer, JobEnvelope, JobPayload, JobState, JobStatusRecord, LineItem, NewOrder,
    OrderConfirmation, OrderInsert, OrderRecord, PriceTotals, ShippingAddress,
    ShippingAddressInput, StockDecrement, VariantKey, VariantStock,
};
use storefront_checkout::error::CheckoutServiceError;
use storefront_checkout::usecase::checkout::{SubmitCheckoutInput, SubmitCheckoutUseCase};
use storefront_checkout::usecase::queue::CheckoutQueue;
use storefront_checkout::usecase::status::GetJobStatusUseCase;
use storefront_checkout::usecase::worker::CheckoutWorkerUseCase;
use storefront_domain::id::{CheckoutJobId, ProductId};

pub const TTL: u64 = 86_400;

// ── MemQueue ─────────────────────────────────────────────────────────────────

/// Head is the front of the deque, tail the back.
#[derive(Clone, Default)]
pub struct MemQueue {
    pub entries: Arc<Mutex<VecDeque<String>>>,
    pub dead: Arc<Mutex<Vec<String>>>,
    pub fail_push: Arc<AtomicBool>,
}

impl MemQueue {
    pub fn len(&self) -> usize {
        self.entries.lock().unwrap().len()
    }

    pub fn dead_len(&self) -> usize {
        self.dead.lock().unwrap().len()
    }

    pub fn dead_entries(&self) -> Vec<serde_json::Value> {
        self.dead
            .lock()
            .unwrap()
            .iter()
            .map(|raw| serde_json::from_str(raw).unwrap())
            .collect()
    }
}

impl QueueStore for MemQueue {
    async fn push(&self, entry: &str) -> Result<(), CheckoutServiceError> {
        if self.fail_push.load(Ordering::SeqCst) {
            return Err(anyhow::anyhow!("queue store unavailable").into());
        }
        self.entries.lock().unwrap().push_front(entry.to_owned());
        Ok(())
    }

    async fn pop(&self) -> Result<Option<String>, CheckoutServiceError> {
        Ok(self.entries.lock().unwrap().pop_back())
    }

    async fn depth(&self) -> Result<u64, CheckoutServiceError> {
        Ok(self.len() as u64)
    }

    async fn push_dead_letter(&self, entry: &str) -> Result<(), CheckoutServiceError> {
        self.dead.lock().unwrap().push(entry.to_owned());
        Ok(())
    }

    async fn dead_letter_depth(&self) -> Result<u64, CheckoutServiceError> {
        Ok(self.dead_len() as u64)
    }

    async fn peek_tail(&self, count: usize) -> Result<Vec<String>, CheckoutServiceError> {
        Ok(self
            .entries
            .lock()
            .unwrap()
            .iter()
            .rev()
            .take(count)
            .cloned()
            .collect())
    }

    async fn peek_dead_letter_tail(
        &self,
        count: usize,
    ) -> Result<Vec<String>, CheckoutServiceError> {
        Ok(self.dead.lock().unwrap().iter().take(count).cloned().collect())
    }
}

// ── MemStatusStore ───────────────────────────────────────────────────────────

#[derive(Clone, Default)]
pub struct MemStatusStore {
    pub records: Arc<Mutex<HashMap<CheckoutJobId, JobStatusRecord>>>,
    /// Every state written, in order, per job.
    pub history: Arc<Mutex<Vec<(CheckoutJobId, JobState)>>>,
    pub fail_get: Arc<AtomicBool>,
    /// Writes of these states fail and leave the store untouched.
    pub fail_writes_of: Arc<Mutex<Vec<JobState>>>,
}

impl MemStatusStore {
    pub fn states_of(&self, job_id: CheckoutJobId) -> Vec<JobState> {
        self.history
            .lock()
            .unwrap()
            .iter()
            .filter(|(id, _)| *id == job_id)
            .map(|(_, state)| *state)
            .collect()
    }

    pub fn record(&self, job_id: CheckoutJobId) -> Option<JobStatusRecord> {
        self.records.lock().unwrap().get(&job_id).cloned()
    }

    pub fn fail_writes_of(&self, state: JobState) {
        self.fail_writes_of.lock().unwrap().push(state);
    }
}

impl JobStatusStore for MemStatusStore {
    async fn set(
        &self,
        record: &JobStatusRecord,
        _ttl_secs: u64,
    ) -> Result<(), CheckoutServiceError> {
        if self.fail_writes_of.lock().unwrap().contains(&record.state) {
            return Err(anyhow::anyhow!("status store unavailable").into());
        }
        self.history
            .lock()
            .unwrap()
            .push((record.job_id, record.state));
        self.records
            .lock()
            .unwrap()
            .insert(record.job_id, record.clone());
        Ok(())
    }

    async fn get(
        &self,
        job_id: CheckoutJobId,
    ) -> Result<Option<JobStatusRecord>, CheckoutServiceError> {
        if self.fail_get.load(Ordering::SeqCst) {
            return Err(anyhow::anyhow!("status store unavailable").into());
        }
        Ok(self.record(job_id))
    }

    async fn delete(&self, job_id: CheckoutJobId) -> Result<(), CheckoutServiceError> {
        self.records.lock().unwrap().remove(&job_id);
        Ok(())
    }
}

// ── MemInventory ─────────────────────────────────────────────────────────────

/// Variant stock behind one lock, so a decrement batch is all-or-nothing.
#[derive(Clone, Default)]
pub struct MemInventory {
    pub stock: Arc<Mutex<HashMap<VariantKey, i32>>>,
    pub reads: Arc<AtomicUsize>,
    pub writes: Arc<AtomicUsize>,
    pub restores: Arc<AtomicUsize>,
    /// Decrement batches in the order they were received.
    pub decrements: Arc<Mutex<Vec<Vec<StockDecrement>>>>,
    /// Yield after each read so concurrent workers interleave between check and write.
    pub yield_after_read: bool,
}

impl MemInventory {
    pub fn with_stock(variants: &[(&VariantKey, i32)]) -> Self {
        let inventory = Self::default();
        {
            let mut stock = inventory.stock.lock().unwrap();
            for (key, qty) in variants {
                stock.insert((*key).clone(), *qty);
            }
        }
        inventory
    }

    pub fn stock_of(&self, key: &VariantKey) -> i32 {
        self.stock.lock().unwrap()[key]
    }

    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    pub fn restores(&self) -> usize {
        self.restores.load(Ordering::SeqCst)
    }
}

impl InventoryRepository for MemInventory {
    async fn find_variants(
        &self,
        product_ids: &[ProductId],
    ) -> Result<Vec<VariantStock>, CheckoutServiceError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        let variants = self
            .stock
            .lock()
            .unwrap()
            .iter()
            .filter(|(key, _)| product_ids.contains(&key.product_id))
            .map(|(key, stock)| VariantStock {
                key: key.clone(),
                stock: *stock,
            })
            .collect();
        if self.yield_after_read {
            tokio::task::yield_now().await;
        }
        Ok(variants)
    }

    async fn decrement_stock(
        &self,
        decrements: &[StockDecrement],
    ) -> Result<u64, CheckoutServiceError> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.decrements.lock().unwrap().push(decrements.to_vec());
        let mut stock = self.stock.lock().unwrap();
        let matched = decrements
            .iter()
            .filter(|d| stock.get(&d.key).is_some_and(|s| *s >= d.quantity))
            .count() as u64;
        if matched == decrements.len() as u64 {
            for d in decrements {
                if let Some(s) = stock.get_mut(&d.key) {
                    *s -= d.quantity;
                }
            }
        }
        Ok(matched)
    }

    async fn restore_stock(
        &self,
        decrements: &[StockDecrement],
    ) -> Result<(), CheckoutServiceError> {
        self.restores.fetch_add(1, Ordering::SeqCst);
        let mut stock = self.stock.lock().unwrap();
        for d in decrements {
            if let Some(s) = stock.get_mut(&d.key) {
                *s += d.quantity;
            }
        }
        Ok(())
    }
}

// ── MemOrders ────────────────────────────────────────────────────────────────

#[derive(Clone, Default)]
pub struct MemOrders {
    pub orders: Arc<Mutex<Vec<NewOrder>>>,
    /// Next lookup reports nothing, as if a concurrent attempt inserted just after it.
    pub miss_next_lookup: Arc<AtomicBool>,
    pub fail_create: Arc<AtomicBool>,
}

impl MemOrders {
    pub fn count(&self) -> usize {
        self.orders.lock().unwrap().len()
    }

    pub fn insert_existing(&self, order: NewOrder) {
        self.orders.lock().unwrap().push(order);
    }
}

impl OrderRepository for MemOrders {
    async fn find_by_job_id(
        &self,
        job_id: CheckoutJobId,
    ) -> Result<Option<OrderRecord>, CheckoutServiceError> {
        if self.miss_next_lookup.swap(false, Ordering::SeqCst) {
            return Ok(None);
        }
        Ok(self
            .orders
            .lock()
            .unwrap()
            .iter()
            .find(|o| o.checkout_job_id == job_id)
            .map(|o| OrderRecord {
                id: o.id,
                checkout_job_id: o.checkout_job_id,
                order_number: o.order_number.clone(),
            }))
    }

    async fn create(&self, order: &NewOrder) -> Result<OrderInsert, CheckoutServiceError> {
        if self.fail_create.load(Ordering::SeqCst) {
            return Err(anyhow::anyhow!("order store unavailable").into());
        }
        let mut orders = self.orders.lock().unwrap();
        if orders
            .iter()
            .any(|o| o.checkout_job_id == order.checkout_job_id)
        {
            return Ok(OrderInsert::Duplicate);
        }
        orders.push(order.clone());
        Ok(OrderInsert::Created)
    }
}

// ── MemNotifier / CountingSignal ─────────────────────────────────────────────

#[derive(Clone, Default)]
pub struct MemNotifier {
    pub sent: Arc<Mutex<Vec<OrderConfirmation>>>,
    pub fail: bool,
}

impl Notifier for MemNotifier {
    async fn send_order_confirmation(
        &self,
        confirmation: &OrderConfirmation,
    ) -> Result<(), CheckoutServiceError> {
        if self.fail {
            return Err(anyhow::anyhow!("mail service down").into());
        }
        self.sent.lock().unwrap().push(confirmation.clone());
        Ok(())
    }
}

#[derive(Clone, Default)]
pub struct CountingSignal {
    pub wakes: Arc<AtomicUsize>,
}

impl CountingSignal {
    pub fn count(&self) -> usize {
        self.wakes.load(Ordering::SeqCst)
    }
}

impl WorkerSignal for CountingSignal {
    fn wake(&self) {
        self.wakes.fetch_add(1, Ordering::SeqCst);
    }
}

// ── Harness ──────────────────────────────────────────────────────────────────

/// One set of shared fakes; producer, worker, and poller built from it see the same data.
#[derive(Clone, Default)]
pub struct Harness {
    pub queue: MemQueue,
    pub statuses: MemStatusStore,
    pub inventory: MemInventory,
    pub orders: MemOrders,
    pub notifier: MemNotifier,
    pub signal: CountingSignal,
    pub max_queue_depth: Option<u64>,
}

impl Harness {
    pub fn with_inventory(inventory: MemInventory) -> Self {
        Self {
            inventory,
            ..Default::default()
        }
    }

    pub fn producer(&self) -> SubmitCheckoutUseCase<MemQueue, MemStatusStore, CountingSignal> {
        SubmitCheckoutUseCase {
            queue: CheckoutQueue {
                store: self.queue.clone(),
            },
            statuses: self.statuses.clone(),
            signal: self.signal.clone(),
            max_queue_depth: self.max_queue_depth.unwrap_or(2000),
            status_ttl_secs: TTL,
        }
    }

    pub fn worker(
        &self,
    ) -> CheckoutWorkerUseCase<MemQueue, MemStatusStore, MemInventory, MemOrders, MemNotifier>
    {
        CheckoutWorkerUseCase {
            queue: CheckoutQueue {
                store: self.queue.clone(),
            },
            statuses: self.statuses.clone(),
            inventory: self.inventory.clone(),
            orders: self.orders.clone(),
            notifier: self.notifier.clone(),
            status_ttl_secs: TTL,
        }
    }

    pub fn poller(&self) -> GetJobStatusUseCase<MemStatusStore> {
        GetJobStatusUseCase {
            statuses: self.statuses.clone(),
        }
    }
}

// ── Fixtures ─────────────────────────────────────────────────────────────────

pub fn variant(product_id: ProductId, size: &str, color: &str) -> VariantKey {
    VariantKey {
        product_id,
        size: size.to_owned(),
        color_name: color.to_owned(),
    }
}

pub fn line_item(key: &VariantKey, quantity: i32) -> LineItem {
    LineItem {
        product_id: key.product_id,
        name: "Linen Shirt".to_owned(),
        price: 49.0,
        quantity,
        size: key.size.clone(),
        color: key.color_name.clone(),
        image: None,
    }
}

pub fn buyer(id: Uuid) -> Buyer {
    Buyer {
        id,
        email: Some("buyer@example.com".to_owned()),
        name: Some("Ada Buyer".to_owned()),
    }
}

pub fn address_input() -> ShippingAddressInput {
    ShippingAddressInput {
        first_name: Some("Ada".to_owned()),
        last_name: Some("Buyer".to_owned()),
        address: "1 Market St".to_owned(),
        city: "Springfield".to_owned(),
        postal_code: "12345".to_owned(),
        country: "US".to_owned(),
        ..Default::default()
    }
}

pub fn checkout_input(user_id: Uuid, items: Vec<LineItem>) -> SubmitCheckoutInput {
    SubmitCheckoutInput {
        buyer: buyer(user_id),
        order_items: items,
        shipping_address: Some(address_input()),
        payment_method: Some("card".to_owned()),
        prices: PriceTotals {
            items_price: 49.0,
            tax_price: 4.9,
            shipping_price: 5.0,
            total_price: 58.9,
        },
    }
}

/// Envelope pushed straight onto the queue, bypassing producer validation.
pub fn raw_envelope(user_id: Uuid, items: Vec<LineItem>) -> JobEnvelope {
    JobEnvelope {
        id: CheckoutJobId::generate(),
        created_at: Utc::now(),
        payload: JobPayload {
            buyer: buyer(user_id),
            order_number: "ORD-20260310000000-ABC123".to_owned(),
            items,
            shipping_address: Some(ShippingAddress {
                full_name: "Ada Buyer".to_owned(),
                address: "1 Market St".to_owned(),
                city: "Springfield".to_owned(),
                postal_code: "12345".to_owned(),
                country: "US".to_owned(),
                phone: None,
            }),
            payment_method: Some("card".to_owned()),
            prices: PriceTotals::default(),
        },
    }
}

/// Push an envelope and record its `queued` status, as the producer would.
pub async fn enqueue_raw(harness: &Harness, envelope: &JobEnvelope) {
    harness
        .statuses
        .set(&JobStatusRecord::queued(envelope), TTL)
        .await
        .unwrap();
    harness
        .queue
        .push(&serde_json::to_string(envelope).unwrap())
        .await
        .unwrap();
}
