use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Fixed-window ceiling attached to a route.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitPolicy {
    pub max_requests: u32,
    pub time_window_secs: u64,
    /// Amount charged per admitted request.
    pub weight: u32,
}

impl RateLimitPolicy {
    pub const fn new(max_requests: u32, time_window_secs: u64) -> Self {
        assert!(max_requests > 0, "max_requests must be positive");
        assert!(time_window_secs > 0, "time_window_secs must be positive");
        Self {
            max_requests,
            time_window_secs,
            weight: 1,
        }
    }

    pub const fn with_weight(mut self, weight: u32) -> Self {
        assert!(weight > 0, "weight must be positive");
        self.weight = weight;
        self
    }

    pub fn window(&self) -> Duration {
        Duration::seconds(self.time_window_secs as i64)
    }

    pub fn window_std(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.time_window_secs)
    }
}

/// One client's usage of one rate-limited route within the current window.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub struct ConsumptionData {
    pub request_count: u32,
    pub window_start: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateLimitDecision {
    /// The request may proceed; the record must be persisted.
    Admitted(ConsumptionData),
    Rejected { retry_after_secs: u64 },
}

impl ConsumptionData {
    pub fn fresh(now: DateTime<Utc>) -> Self {
        Self {
            request_count: 0,
            window_start: now,
        }
    }

    /// A request landing exactly on the boundary opens a new window.
    pub fn window_expired(&self, policy: &RateLimitPolicy, now: DateTime<Utc>) -> bool {
        now - self.window_start >= policy.window()
    }

    pub fn has_consumed_all_requests(&self, policy: &RateLimitPolicy, now: DateTime<Utc>) -> bool {
        !self.window_expired(policy, now) && self.request_count >= policy.max_requests
    }

    /// Whole seconds until the window resets, at least one.
    pub fn retry_after_secs(&self, policy: &RateLimitPolicy, now: DateTime<Utc>) -> u64 {
        let remaining = (self.window_start + policy.window() - now).num_milliseconds();
        (remaining.max(0) as u64).div_ceil(1000).max(1)
    }

    /// Applies one request to the stored record.
    pub fn evaluate(
        existing: Option<Self>,
        policy: &RateLimitPolicy,
        now: DateTime<Utc>,
    ) -> RateLimitDecision {
        let mut data = match existing {
            Some(data) if !data.window_expired(policy, now) => data,
            _ => Self::fresh(now),
        };

        if data.has_consumed_all_requests(policy, now) {
            return RateLimitDecision::Rejected {
                retry_after_secs: data.retry_after_secs(policy, now),
            };
        }

        data.request_count = data.request_count.saturating_add(policy.weight);
        RateLimitDecision::Admitted(data)
    }
}
