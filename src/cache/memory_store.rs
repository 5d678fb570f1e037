use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use dashmap::DashMap;
use tokio::time::Instant;

use super::store::CacheStore;
use crate::error::StoreResult;

#[derive(Debug, Clone)]
struct MemoryEntry {
    value: String,
    expires_at: Option<Instant>,
}

impl MemoryEntry {
    fn is_live(&self, now: Instant) -> bool {
        self.expires_at.is_none_or(|deadline| now < deadline)
    }
}

/// Minimum time between two sweeps of expired entries.
const SWEEP_INTERVAL: Duration = Duration::from_secs(30);

/// In-process store for single-node deployments and tests.
///
/// Expired entries read as absent and are evicted on access. Writes also
/// sweep every expired entry, at most once per [`SWEEP_INTERVAL`].
#[derive(Debug)]
pub struct MemoryCacheStore {
    entries: DashMap<String, MemoryEntry>,
    default_expiration: Option<Duration>,
    last_sweep: Mutex<Instant>,
}

impl Default for MemoryCacheStore {
    fn default() -> Self {
        Self::new(None)
    }
}

impl MemoryCacheStore {
    pub fn new(default_expiration: Option<Duration>) -> Self {
        Self {
            entries: DashMap::new(),
            default_expiration,
            last_sweep: Mutex::new(Instant::now()),
        }
    }

    fn sweep_if_due(&self, now: Instant) {
        {
            let Ok(mut last) = self.last_sweep.try_lock() else {
                // another writer is sweeping
                return;
            };
            if now.duration_since(*last) < SWEEP_INTERVAL {
                return;
            }
            *last = now;
        }
        self.entries.retain(|_, entry| entry.is_live(now));
    }

    /// Number of stored entries, expired or not.
    #[cfg(test)]
    fn stored_len(&self) -> usize {
        self.entries.len()
    }

    /// Number of live entries.
    pub fn len(&self) -> usize {
        let now = Instant::now();
        self.entries.iter().filter(|e| e.is_live(now)).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl CacheStore for MemoryCacheStore {
    async fn get_raw(&self, key: &str) -> StoreResult<Option<String>> {
        let now = Instant::now();
        if let Some(entry) = self.entries.get(key) {
            if entry.is_live(now) {
                return Ok(Some(entry.value.clone()));
            }
        }
        self.entries.remove_if(key, |_, entry| !entry.is_live(now));
        Ok(None)
    }

    async fn set_raw(
        &self,
        key: &str,
        value: String,
        expiration: Option<Duration>,
    ) -> StoreResult<()> {
        let now = Instant::now();
        self.sweep_if_due(now);

        let expires_at = expiration.or(self.default_expiration).map(|ttl| now + ttl);
        self.entries
            .insert(key.to_string(), MemoryEntry { value, expires_at });
        Ok(())
    }

    async fn exists(&self, key: &str) -> StoreResult<bool> {
        Ok(self.get_raw(key).await?.is_some())
    }

    async fn remove(&self, key: &str) -> StoreResult<()> {
        self.entries.remove(key);
        Ok(())
    }

    async fn remove_by_prefix(&self, prefix: &str) -> StoreResult<()> {
        self.entries.retain(|key, _| !key.starts_with(prefix));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::CacheStoreExt;

    #[tokio::test]
    async fn set_overwrites_and_get_reads_typed() {
        let store = MemoryCacheStore::new(None);
        store.set("k", &1u32, None).await.unwrap();
        store.set("k", &2u32, None).await.unwrap();

        assert_eq!(store.get::<u32>("k").await.unwrap(), Some(2));
        assert!(store.exists("k").await.unwrap());
        assert_eq!(store.get::<u32>("missing").await.unwrap(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn entries_expire() {
        let store = MemoryCacheStore::new(None);
        store
            .set("short", &"v", Some(Duration::from_secs(5)))
            .await
            .unwrap();

        tokio::time::advance(Duration::from_secs(4)).await;
        assert!(store.exists("short").await.unwrap());

        tokio::time::advance(Duration::from_secs(1)).await;
        assert!(!store.exists("short").await.unwrap());
        assert!(store.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn default_expiration_applies_when_none_given() {
        let store = MemoryCacheStore::new(Some(Duration::from_secs(60)));
        store.set("k", &"v", None).await.unwrap();

        tokio::time::advance(Duration::from_secs(61)).await;
        assert_eq!(store.get_raw("k").await.unwrap(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn writes_sweep_expired_entries() {
        let store = MemoryCacheStore::new(None);
        for client in 0..1000 {
            let key = format!("rate_limit:GET:/limited:ip:{}", client);
            store
                .set(&key, &1u32, Some(Duration::from_secs(6)))
                .await
                .unwrap();
        }
        assert_eq!(store.stored_len(), 1000);

        tokio::time::advance(Duration::from_secs(3600)).await;
        store.set("fresh", &1u32, None).await.unwrap();

        assert_eq!(store.stored_len(), 1);
        assert_eq!(store.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn sweeps_are_spaced_out() {
        let store = MemoryCacheStore::new(None);
        store.set("a", &1u32, Some(Duration::from_secs(1))).await.unwrap();

        tokio::time::advance(Duration::from_secs(2)).await;
        store.set("b", &1u32, None).await.unwrap();
        // expired but not yet swept
        assert_eq!(store.stored_len(), 2);
        assert_eq!(store.len(), 1);

        tokio::time::advance(SWEEP_INTERVAL).await;
        store.set("c", &1u32, None).await.unwrap();
        assert_eq!(store.stored_len(), 2);
    }

    #[tokio::test]
    async fn remove_by_prefix_leaves_other_keys() {
        let store = MemoryCacheStore::new(None);
        for key in ["companies:all", "companies:search:1:10", "devices:search:1:10"] {
            store.set(key, &key, None).await.unwrap();
        }

        store.remove_by_prefix("companies:").await.unwrap();

        assert!(!store.exists("companies:all").await.unwrap());
        assert!(!store.exists("companies:search:1:10").await.unwrap());
        assert!(store.exists("devices:search:1:10").await.unwrap());

        store.remove("devices:search:1:10").await.unwrap();
        assert!(store.is_empty());
    }
}
