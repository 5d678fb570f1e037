use std::sync::Arc;

use async_trait::async_trait;
use serde::{Serialize, de::DeserializeOwned};
use tracing::{debug, info, warn};

use super::{Next, PipelineBehavior, Request};
use crate::cache::keyed_lock::KeyedLocks;
use crate::cache::{CacheStore, CacheStoreExt};
use crate::config::FailurePolicy;
use crate::error::AppResult;

/// Read-through response cache for requests that declare [`super::Cacheable`].
///
/// Hits return the stored response without running the handler. Misses run
/// the handler and store its response under the store's default expiration;
/// a failed or cancelled handler never writes.
pub struct CachingBehavior {
    store: Arc<dyn CacheStore>,
    failure_policy: FailurePolicy,
    in_flight: Option<KeyedLocks>,
}

impl CachingBehavior {
    pub fn new(store: Arc<dyn CacheStore>, failure_policy: FailurePolicy) -> Self {
        Self {
            store,
            failure_policy,
            in_flight: None,
        }
    }

    /// Concurrent misses on one key wait for the first instead of recomputing.
    pub fn with_single_flight(mut self, enabled: bool) -> Self {
        self.in_flight = enabled.then(KeyedLocks::new);
        self
    }

    async fn lookup<T>(&self, key: &str) -> AppResult<Option<T>>
    where
        T: DeserializeOwned + Send,
    {
        match self.store.get::<T>(key).await {
            Ok(found) => Ok(found),
            Err(e) if self.failure_policy == FailurePolicy::FailOpen => {
                warn!("Cache read failed for '{}', treating as miss: {}", key, e);
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn populate<T>(&self, key: &str, response: &T) -> AppResult<()>
    where
        T: Serialize + Sync,
    {
        match self.store.set(key, response, None).await {
            Ok(()) => {
                info!("Added to cache -> '{}'", key);
                Ok(())
            }
            Err(e) if self.failure_policy == FailurePolicy::FailOpen => {
                warn!("Cache write failed for '{}': {}", key, e);
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }
}

#[async_trait]
impl PipelineBehavior for CachingBehavior {
    async fn handle<R: Request>(&self, request: R, next: Next<'_, R>) -> AppResult<R::Response> {
        let directive = request
            .cacheable()
            .map(|c| (c.bypass_cache(), c.cache_key()));

        let key = match directive {
            None => return next.run(request).await,
            Some((true, key)) => {
                debug!("Bypassing cache -> '{}'", key);
                return next.run(request).await;
            }
            Some((false, key)) => key,
        };

        if let Some(cached) = self.lookup::<R::Response>(&key).await? {
            info!("Fetched from cache -> '{}'", key);
            return Ok(cached);
        }

        let _flight = match &self.in_flight {
            Some(locks) => {
                let guard = locks.lock(&key).await;
                // populated while we waited for the leader
                if let Some(cached) = self.lookup::<R::Response>(&key).await? {
                    info!("Fetched from cache after wait -> '{}'", key);
                    return Ok(cached);
                }
                Some(guard)
            }
            None => None,
        };

        let response = next.run(request).await?;
        self.populate(&key, &response).await?;
        Ok(response)
    }
}
