use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use redis::{AsyncCommands, Client as RedisClient};

use super::store::CacheStore;
use crate::error::StoreResult;

const SCAN_BATCH: usize = 200;

/// Redis-backed store shared by every instance of the service.
#[derive(Clone)]
pub struct RedisCacheStore {
    redis: Arc<RedisClient>,
    default_expiration: Option<Duration>,
}

impl RedisCacheStore {
    pub fn new(redis: RedisClient, default_expiration: Option<Duration>) -> Self {
        Self {
            redis: Arc::new(redis),
            default_expiration,
        }
    }

    async fn connection(&self) -> StoreResult<redis::aio::MultiplexedConnection> {
        Ok(self.redis.get_multiplexed_async_connection().await?)
    }
}

#[async_trait]
impl CacheStore for RedisCacheStore {
    async fn get_raw(&self, key: &str) -> StoreResult<Option<String>> {
        let mut conn = self.connection().await?;
        let value: Option<String> = conn.get(key).await?;
        Ok(value)
    }

    async fn set_raw(
        &self,
        key: &str,
        value: String,
        expiration: Option<Duration>,
    ) -> StoreResult<()> {
        let mut conn = self.connection().await?;

        match expiration.or(self.default_expiration) {
            // SET EX rejects 0, round sub-second lifetimes up
            Some(ttl) => {
                let secs = ttl.as_secs().max(1);
                let _: () = conn.set_ex(key, value, secs).await?;
            }
            None => {
                let _: () = conn.set(key, value).await?;
            }
        }

        Ok(())
    }

    async fn exists(&self, key: &str) -> StoreResult<bool> {
        let mut conn = self.connection().await?;
        let found: bool = conn.exists(key).await?;
        Ok(found)
    }

    async fn remove(&self, key: &str) -> StoreResult<()> {
        let mut conn = self.connection().await?;
        let _: () = conn.del(key).await?;
        Ok(())
    }

    async fn remove_by_prefix(&self, prefix: &str) -> StoreResult<()> {
        let mut conn = self.connection().await?;
        let pattern = format!("{}*", prefix);
        let mut cursor: u64 = 0;
        let mut removed = 0usize;

        loop {
            let (next, keys): (u64, Vec<String>) = redis::cmd("SCAN")
                .arg(cursor)
                .arg("MATCH")
                .arg(&pattern)
                .arg("COUNT")
                .arg(SCAN_BATCH)
                .query_async(&mut conn)
                .await?;

            if !keys.is_empty() {
                removed += keys.len();
                let _: () = conn.del(keys).await?;
            }

            if next == 0 {
                break;
            }
            cursor = next;
        }

        tracing::debug!("Removed {} keys with prefix {}", removed, prefix);
        Ok(())
    }
}
