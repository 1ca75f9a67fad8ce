use anyhow::Context as _;
use deadpool_redis::Pool;
use deadpool_redis::redis::AsyncCommands;

use storefront_domain::id::CheckoutJobId;

use crate::domain::repository::{JobStatusStore, QueueStore};
use crate::domain::types::JobStatusRecord;
use crate::error::CheckoutServiceError;

pub const QUEUE_KEY: &str = "checkout:queue";
pub const DEAD_LETTER_KEY: &str = "checkout:dead_letter";

fn status_key(job_id: CheckoutJobId) -> String {
    format!("checkout:status:{job_id}")
}

/// Checkout queue on two Redis lists. Producers `LPUSH`, workers `RPOP`, so the tail is
/// always the oldest entry.
#[derive(Clone)]
pub struct RedisCheckoutQueue {
    pub pool: Pool,
}

impl RedisCheckoutQueue {
    async fn conn(&self) -> Result<deadpool_redis::Connection, CheckoutServiceError> {
        Ok(self.pool.get().await.context("get redis connection")?)
    }

    /// Up to `count` entries at the tail, oldest first.
    async fn tail(&self, key: &str, count: usize) -> Result<Vec<String>, CheckoutServiceError> {
        if count == 0 {
            return Ok(vec![]);
        }
        let mut conn = self.conn().await?;
        let mut entries: Vec<String> = conn
            .lrange(key, -(count as isize), -1)
            .await
            .with_context(|| format!("lrange {key}"))?;
        entries.reverse();
        Ok(entries)
    }
}

impl QueueStore for RedisCheckoutQueue {
    async fn push(&self, entry: &str) -> Result<(), CheckoutServiceError> {
        let mut conn = self.conn().await?;
        let _: u64 = conn
            .lpush(QUEUE_KEY, entry)
            .await
            .context("lpush checkout queue")?;
        Ok(())
    }

    async fn pop(&self) -> Result<Option<String>, CheckoutServiceError> {
        let mut conn = self.conn().await?;
        let entry: Option<String> = conn
            .rpop(QUEUE_KEY, None)
            .await
            .context("rpop checkout queue")?;
        Ok(entry)
    }

    async fn depth(&self) -> Result<u64, CheckoutServiceError> {
        let mut conn = self.conn().await?;
        let len: u64 = conn.llen(QUEUE_KEY).await.context("llen checkout queue")?;
        Ok(len)
    }

    async fn push_dead_letter(&self, entry: &str) -> Result<(), CheckoutServiceError> {
        let mut conn = self.conn().await?;
        let _: u64 = conn
            .lpush(DEAD_LETTER_KEY, entry)
            .await
            .context("lpush dead-letter list")?;
        Ok(())
    }

    async fn dead_letter_depth(&self) -> Result<u64, CheckoutServiceError> {
        let mut conn = self.conn().await?;
        let len: u64 = conn
            .llen(DEAD_LETTER_KEY)
            .await
            .context("llen dead-letter list")?;
        Ok(len)
    }

    async fn peek_tail(&self, count: usize) -> Result<Vec<String>, CheckoutServiceError> {
        self.tail(QUEUE_KEY, count).await
    }

    async fn peek_dead_letter_tail(
        &self,
        count: usize,
    ) -> Result<Vec<String>, CheckoutServiceError> {
        self.tail(DEAD_LETTER_KEY, count).await
    }
}

/// Job status records as JSON strings under `checkout:status:{job_id}` with a TTL.
#[derive(Clone)]
pub struct RedisJobStatusStore {
    pub pool: Pool,
}

impl JobStatusStore for RedisJobStatusStore {
    async fn set(
        &self,
        record: &JobStatusRecord,
        ttl_secs: u64,
    ) -> Result<(), CheckoutServiceError> {
        let json = serde_json::to_string(record).context("serialize job status")?;
        let mut conn = self.pool.get().await.context("get redis connection")?;
        let (): () = conn
            .set_ex(status_key(record.job_id), json, ttl_secs)
            .await
            .context("set job status")?;
        Ok(())
    }

    async fn get(
        &self,
        job_id: CheckoutJobId,
    ) -> Result<Option<JobStatusRecord>, CheckoutServiceError> {
        let mut conn = self.pool.get().await.context("get redis connection")?;
        let raw: Option<String> = conn.get(status_key(job_id)).await.context("get job status")?;
        let Some(raw) = raw else {
            return Ok(None);
        };
        let record = serde_json::from_str(&raw).context("decode job status")?;
        Ok(Some(record))
    }

    async fn delete(&self, job_id: CheckoutJobId) -> Result<(), CheckoutServiceError> {
        let mut conn = self.pool.get().await.context("get redis connection")?;
        let _: u64 = conn
            .del(status_key(job_id))
            .await
            .context("delete job status")?;
        Ok(())
    }
}

/// `PING` probe for `/readyz`.
pub async fn ping(pool: &Pool) -> anyhow::Result<()> {
    let mut conn = pool.get().await.context("get redis connection")?;
    let _: String = deadpool_redis::redis::cmd("PING")
        .query_async(&mut conn)
        .await
        .context("redis ping")?;
    Ok(())
}
