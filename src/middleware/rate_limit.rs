use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    body::Body,
    extract::{MatchedPath, State},
    http::{Method, Request},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tracing::{debug, info, warn};

use crate::cache::keys::consumption_key;
use crate::cache::models::{RateLimitDecision, RateLimitPolicy};
use crate::cache::operations::ConsumptionTracker;
use crate::config::FailurePolicy;
use crate::error::AppError;
use crate::utils::client_identity;

/// Rate-limit policies declared per route (full path template, then method).
#[derive(Debug, Clone, Default)]
pub struct RateLimitPolicies {
    policies: HashMap<String, HashMap<Method, RateLimitPolicy>>,
}

impl RateLimitPolicies {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, method: Method, path: impl Into<String>, policy: RateLimitPolicy) -> Self {
        self.policies
            .entry(path.into())
            .or_default()
            .insert(method, policy);
        self
    }

    /// Finds the policy for a request, returning the method it was declared
    /// under. HEAD is answered by GET routes, so it falls back to the GET
    /// policy and shares its allowance.
    pub fn get(&self, method: &Method, path: &str) -> Option<(&Method, &RateLimitPolicy)> {
        let by_method = self.policies.get(path)?;
        by_method.get_key_value(method).or_else(|| {
            if method == Method::HEAD {
                by_method.get_key_value(&Method::GET)
            } else {
                None
            }
        })
    }

    pub fn is_empty(&self) -> bool {
        self.policies.is_empty()
    }
}

pub struct RateLimiter {
    tracker: ConsumptionTracker,
    policies: RateLimitPolicies,
    failure_policy: FailurePolicy,
}

impl RateLimiter {
    pub fn new(
        tracker: ConsumptionTracker,
        policies: RateLimitPolicies,
        failure_policy: FailurePolicy,
    ) -> Self {
        Self {
            tracker,
            policies,
            failure_policy,
        }
    }

    /// Consumption key and policy for a request, if any policy applies.
    fn policy_for(&self, req: &Request<Body>) -> Option<(String, &RateLimitPolicy)> {
        let path = req
            .extensions()
            .get::<MatchedPath>()
            .map_or(req.uri().path(), MatchedPath::as_str);
        let (method, policy) = self.policies.get(req.method(), path)?;

        let key = consumption_key(&format!("{}:{}", method, path), &client_identity(req));
        Some((key, policy))
    }

    /// Charges the request before it runs. A request that later fails or is
    /// cancelled keeps its slot.
    pub async fn check_rate_limit(self: Arc<Self>, req: Request<Body>, next: Next) -> Response {
        let Some((key, policy)) = self.policy_for(&req) else {
            return next.run(req).await;
        };

        match self.tracker.consume(&key, policy).await {
            Ok(RateLimitDecision::Admitted(data)) => {
                debug!(
                    "Rate limit admitted '{}' ({}/{})",
                    key, data.request_count, policy.max_requests
                );
                next.run(req).await
            }
            Ok(RateLimitDecision::Rejected { retry_after_secs }) => {
                info!(
                    "Rate limit exceeded for '{}', retry after {}s",
                    key, retry_after_secs
                );
                AppError::RateLimitExceeded { retry_after_secs }.into_response()
            }
            Err(e) if self.failure_policy == FailurePolicy::FailOpen => {
                warn!("Rate limit store unavailable for '{}', admitting: {}", key, e);
                next.run(req).await
            }
            Err(e) => AppError::CacheStore(e).into_response(),
        }
    }
}

pub async fn rate_limit(
    State(limiter): State<Arc<RateLimiter>>,
    req: Request<Body>,
    next: Next,
) -> Response {
    limiter.check_rate_limit(req, next).await
}
