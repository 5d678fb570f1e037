//! Request/response mediator: requests travel through a fixed chain of
//! behaviors before reaching their handler.

use std::future::Future;

use async_trait::async_trait;
use futures_util::future::BoxFuture;
use serde::{Serialize, de::DeserializeOwned};

use crate::error::AppResult;

pub mod caching;
pub mod mediator;
pub mod validation;

pub use caching::CachingBehavior;
pub use mediator::Mediator;
pub use validation::ValidationBehavior;

/// Opt-in capability for requests whose responses may be cached.
pub trait Cacheable {
    /// Skip the cache entirely and go straight to the handler.
    fn bypass_cache(&self) -> bool;

    /// Must encode every parameter that influences the response.
    fn cache_key(&self) -> String;
}

pub trait Request: Send + 'static {
    type Response: Serialize + DeserializeOwned + Send + Sync + 'static;

    /// `Some` when this request declares the [`Cacheable`] capability.
    fn cacheable(&self) -> Option<&dyn Cacheable> {
        None
    }

    fn validate(&self) -> Result<(), Vec<String>> {
        Ok(())
    }
}

#[async_trait]
pub trait Handler<R: Request>: Send + Sync {
    async fn handle(&self, request: R) -> AppResult<R::Response>;
}

/// The remainder of the chain after the current behavior.
pub struct Next<'a, R: Request> {
    inner: Box<dyn FnOnce(R) -> BoxFuture<'a, AppResult<R::Response>> + Send + 'a>,
}

impl<'a, R: Request> Next<'a, R> {
    pub fn new<F, Fut>(f: F) -> Self
    where
        F: FnOnce(R) -> Fut + Send + 'a,
        Fut: Future<Output = AppResult<R::Response>> + Send + 'a,
    {
        Self {
            inner: Box::new(move |request| Box::pin(f(request))),
        }
    }

    pub async fn run(self, request: R) -> AppResult<R::Response> {
        (self.inner)(request).await
    }
}

#[async_trait]
pub trait PipelineBehavior: Send + Sync {
    async fn handle<R: Request>(&self, request: R, next: Next<'_, R>) -> AppResult<R::Response>;
}
