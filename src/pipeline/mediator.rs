use std::sync::Arc;

use super::{CachingBehavior, Handler, Next, PipelineBehavior, Request, ValidationBehavior};
use crate::application::RequestHandlers;
use crate::error::AppResult;

/// Dispatches requests through validation, then caching, then the handler.
pub struct Mediator {
    handlers: Arc<RequestHandlers>,
    validation: ValidationBehavior,
    caching: CachingBehavior,
}

impl Mediator {
    pub fn new(handlers: Arc<RequestHandlers>, caching: CachingBehavior) -> Self {
        Self {
            handlers,
            validation: ValidationBehavior,
            caching,
        }
    }

    pub async fn send<R>(&self, request: R) -> AppResult<R::Response>
    where
        R: Request,
        RequestHandlers: Handler<R>,
    {
        let handlers = &self.handlers;
        let caching = &self.caching;

        let handler = Next::new(move |request: R| async move { handlers.handle(request).await });
        let cached =
            Next::new(move |request: R| async move { caching.handle(request, handler).await });

        self.validation.handle(request, cached).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::company::{CompanyDto, CreateCompany, ListCompanies};
    use crate::application::testing;
    use crate::cache::{CacheStore, CacheStoreExt, MemoryCacheStore};
    use crate::config::FailurePolicy;
    use crate::error::AppError;

    fn mediator() -> (Mediator, Arc<MemoryCacheStore>) {
        let (handlers, store) = testing::handlers();
        let caching = CachingBehavior::new(
            store.clone() as Arc<dyn CacheStore>,
            FailurePolicy::FailOpen,
        );
        (Mediator::new(Arc::new(handlers), caching), store)
    }

    #[tokio::test]
    async fn invalid_requests_never_reach_the_handler() {
        let (mediator, _store) = mediator();

        let err = mediator.send(CreateCompany::default()).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));

        let all = mediator.send(ListCompanies::default()).await.unwrap();
        assert!(all.is_empty());
    }

    #[tokio::test]
    async fn queries_are_cached_until_a_command_invalidates_them() {
        let (mediator, store) = mediator();

        let first = mediator.send(ListCompanies::default()).await.unwrap();
        assert!(first.is_empty());
        assert!(store.exists("companies:all").await.unwrap());

        mediator
            .send(CreateCompany {
                tenant_id: 1,
                name: Some("Acme".into()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert!(!store.exists("companies:all").await.unwrap());

        let second = mediator.send(ListCompanies::default()).await.unwrap();
        assert_eq!(second.len(), 1);
        let cached: Option<Vec<CompanyDto>> = store.get("companies:all").await.unwrap();
        assert_eq!(cached.map(|c| c.len()), Some(1));
    }
}
