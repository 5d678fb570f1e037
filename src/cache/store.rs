use std::time::Duration;

use async_trait::async_trait;
use serde::{Serialize, de::DeserializeOwned};

use crate::error::StoreResult;

/// A shared key-value store holding serialized values.
///
/// Writes overwrite. An `expiration` of `None` leaves the lifetime to the
/// store's configured default.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Returns the serialized value stored at `key`.
    async fn get_raw(&self, key: &str) -> StoreResult<Option<String>>;

    async fn set_raw(
        &self,
        key: &str,
        value: String,
        expiration: Option<Duration>,
    ) -> StoreResult<()>;

    async fn exists(&self, key: &str) -> StoreResult<bool>;

    async fn remove(&self, key: &str) -> StoreResult<()>;

    /// Removes every key starting with `prefix`.
    async fn remove_by_prefix(&self, prefix: &str) -> StoreResult<()>;
}

/// Typed access on top of [`CacheStore`]; values travel as JSON.
#[async_trait]
pub trait CacheStoreExt {
    async fn get<T>(&self, key: &str) -> StoreResult<Option<T>>
    where
        T: DeserializeOwned + Send;

    async fn set<T>(&self, key: &str, value: &T, expiration: Option<Duration>) -> StoreResult<()>
    where
        T: Serialize + Sync;
}

#[async_trait]
impl<S> CacheStoreExt for S
where
    S: CacheStore + ?Sized,
{
    async fn get<T>(&self, key: &str) -> StoreResult<Option<T>>
    where
        T: DeserializeOwned + Send,
    {
        match self.get_raw(key).await? {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    async fn set<T>(&self, key: &str, value: &T, expiration: Option<Duration>) -> StoreResult<()>
    where
        T: Serialize + Sync,
    {
        let json = serde_json::to_string(value)?;
        self.set_raw(key, json, expiration).await
    }
}
