use std::sync::Arc;

use crate::cache::keyed_lock::KeyedLocks;
use crate::cache::models::rate_limit::{ConsumptionData, RateLimitDecision, RateLimitPolicy};
use crate::cache::{CacheStore, CacheStoreExt};
use crate::error::StoreResult;
use crate::utils::Clock;

/// Reads and updates per-client consumption records in the shared store.
///
/// Read-evaluate-write for one key is serialized inside this process.
/// Separate processes sharing the store still race; the last write wins.
pub struct ConsumptionTracker {
    store: Arc<dyn CacheStore>,
    clock: Arc<dyn Clock>,
    locks: KeyedLocks,
}

impl ConsumptionTracker {
    pub fn new(store: Arc<dyn CacheStore>, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            clock,
            locks: KeyedLocks::new(),
        }
    }

    pub async fn get_consumption(&self, key: &str) -> StoreResult<Option<ConsumptionData>> {
        self.store.get::<ConsumptionData>(key).await
    }

    /// Charges one request against `policy`, persisting the record on admission.
    ///
    /// The record expires one window after the write so abandoned windows
    /// clean themselves up.
    pub async fn consume(
        &self,
        key: &str,
        policy: &RateLimitPolicy,
    ) -> StoreResult<RateLimitDecision> {
        let _guard = self.locks.lock(key).await;

        let existing = self.get_consumption(key).await?;
        let decision = ConsumptionData::evaluate(existing, policy, self.clock.now());

        if let RateLimitDecision::Admitted(data) = &decision {
            self.store
                .set(key, data, Some(policy.window_std()))
                .await?;
        }

        Ok(decision)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MemoryCacheStore;
    use crate::utils::ManualClock;
    use chrono::{Duration, Utc};

    fn tracker() -> (ConsumptionTracker, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(Utc::now()));
        let store: Arc<dyn CacheStore> = Arc::new(MemoryCacheStore::new(None));
        (ConsumptionTracker::new(store, clock.clone()), clock)
    }

    #[tokio::test]
    async fn rejection_does_not_touch_the_record() {
        let (tracker, clock) = tracker();
        let policy = RateLimitPolicy::new(1, 10);

        assert!(matches!(
            tracker.consume("k", &policy).await.unwrap(),
            RateLimitDecision::Admitted(_)
        ));
        clock.advance(Duration::seconds(1));
        assert!(matches!(
            tracker.consume("k", &policy).await.unwrap(),
            RateLimitDecision::Rejected { retry_after_secs: 9 }
        ));

        let stored = tracker.get_consumption("k").await.unwrap().unwrap();
        assert_eq!(stored.request_count, 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_requests_are_counted_exactly() {
        let (tracker, _clock) = tracker();
        let tracker = Arc::new(tracker);
        let policy = RateLimitPolicy::new(5, 60);

        let tasks: Vec<_> = (0..20)
            .map(|_| {
                let tracker = tracker.clone();
                tokio::spawn(async move { tracker.consume("hot", &policy).await.unwrap() })
            })
            .collect();

        let mut admitted = 0;
        for task in tasks {
            if let RateLimitDecision::Admitted(_) = task.await.unwrap() {
                admitted += 1;
            }
        }

        assert_eq!(admitted, 5);
    }
}
