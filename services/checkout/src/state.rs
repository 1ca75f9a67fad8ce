use std::sync::Arc;

use deadpool_redis::Pool as RedisPool;
use sea_orm::DatabaseConnection;

use crate::config::CheckoutConfig;
use crate::infra::db::{DbInventoryRepository, DbOrderRepository};
use crate::infra::notify::HttpNotifier;
use crate::infra::redis::{RedisCheckoutQueue, RedisJobStatusStore};
use crate::infra::wake::WorkerWaker;
use crate::usecase::checkout::SubmitCheckoutUseCase;
use crate::usecase::inspect::InspectQueueUseCase;
use crate::usecase::queue::CheckoutQueue;
use crate::usecase::status::GetJobStatusUseCase;
use crate::usecase::worker::CheckoutWorkerUseCase;

pub type CheckoutWorker = CheckoutWorkerUseCase<
    RedisCheckoutQueue,
    RedisJobStatusStore,
    DbInventoryRepository,
    DbOrderRepository,
    HttpNotifier,
>;

/// Shared application state passed to every handler via axum `State`.
#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub redis: RedisPool,
    pub config: Arc<CheckoutConfig>,
    pub http: reqwest::Client,
}

impl AppState {
    pub fn queue_store(&self) -> RedisCheckoutQueue {
        RedisCheckoutQueue {
            pool: self.redis.clone(),
        }
    }

    pub fn status_store(&self) -> RedisJobStatusStore {
        RedisJobStatusStore {
            pool: self.redis.clone(),
        }
    }

    pub fn inventory_repo(&self) -> DbInventoryRepository {
        DbInventoryRepository {
            db: self.db.clone(),
        }
    }

    pub fn order_repo(&self) -> DbOrderRepository {
        DbOrderRepository {
            db: self.db.clone(),
        }
    }

    pub fn notifier(&self) -> HttpNotifier {
        HttpNotifier {
            client: self.http.clone(),
            url: self.config.notification_url.clone(),
        }
    }

    pub fn worker_signal(&self) -> WorkerWaker {
        match &self.config.worker_wake_url {
            Some(url) => WorkerWaker::Http {
                client: self.http.clone(),
                url: url.clone(),
                secret: self.config.worker_secret.clone(),
            },
            None => WorkerWaker::InProcess {
                state: self.clone(),
                batch: self.config.worker_batch_size,
            },
        }
    }

    pub fn submit_checkout(
        &self,
    ) -> SubmitCheckoutUseCase<RedisCheckoutQueue, RedisJobStatusStore, WorkerWaker> {
        SubmitCheckoutUseCase {
            queue: CheckoutQueue {
                store: self.queue_store(),
            },
            statuses: self.status_store(),
            signal: self.worker_signal(),
            max_queue_depth: self.config.max_queue_depth,
            status_ttl_secs: self.config.job_status_ttl_secs,
        }
    }

    pub fn checkout_worker(&self) -> CheckoutWorker {
        CheckoutWorkerUseCase {
            queue: CheckoutQueue {
                store: self.queue_store(),
            },
            statuses: self.status_store(),
            inventory: self.inventory_repo(),
            orders: self.order_repo(),
            notifier: self.notifier(),
            status_ttl_secs: self.config.job_status_ttl_secs,
        }
    }

    pub fn job_status(&self) -> GetJobStatusUseCase<RedisJobStatusStore> {
        GetJobStatusUseCase {
            statuses: self.status_store(),
        }
    }

    pub fn inspect_queue(&self) -> InspectQueueUseCase<RedisCheckoutQueue> {
        InspectQueueUseCase {
            store: self.queue_store(),
        }
    }
}
