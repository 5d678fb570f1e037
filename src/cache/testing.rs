//! Store doubles shared by unit tests.

use std::time::Duration;

use async_trait::async_trait;

use super::store::CacheStore;
use crate::error::{StoreError, StoreResult};

/// Fails every operation the way a dropped Redis connection does.
pub struct UnreachableStore;

fn unreachable() -> StoreError {
    StoreError::Redis(redis::RedisError::from((
        redis::ErrorKind::IoError,
        "connection refused",
    )))
}

#[async_trait]
impl CacheStore for UnreachableStore {
    async fn get_raw(&self, _key: &str) -> StoreResult<Option<String>> {
        Err(unreachable())
    }

    async fn set_raw(&self, _: &str, _: String, _: Option<Duration>) -> StoreResult<()> {
        Err(unreachable())
    }

    async fn exists(&self, _key: &str) -> StoreResult<bool> {
        Err(unreachable())
    }

    async fn remove(&self, _key: &str) -> StoreResult<()> {
        Err(unreachable())
    }

    async fn remove_by_prefix(&self, _prefix: &str) -> StoreResult<()> {
        Err(unreachable())
    }
}
