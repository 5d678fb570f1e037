//! Requests, their validation rules and their handlers.

use std::sync::Arc;

use tracing::warn;

use crate::cache::CacheStore;
use crate::database::Repositories;
use crate::events::{DomainEvent, EventPublisher};
use crate::pipeline::validation::Rules;
use crate::result::Page;
use crate::utils::Clock;

pub mod company;
pub mod device;

pub const MAX_NAME_LENGTH: usize = 100;
pub const MAX_PAGE_SIZE: u32 = 100;

/// Every request handler, composed once at start-up.
pub struct RequestHandlers {
    repositories: Repositories,
    store: Arc<dyn CacheStore>,
    events: Arc<dyn EventPublisher>,
    clock: Arc<dyn Clock>,
}

impl RequestHandlers {
    pub fn new(
        repositories: Repositories,
        store: Arc<dyn CacheStore>,
        events: Arc<dyn EventPublisher>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            repositories,
            store,
            events,
            clock,
        }
    }

    /// Drops every cached query under `prefix`. The command already
    /// succeeded, so a store failure is only logged.
    async fn invalidate(&self, prefix: &str) {
        if let Err(e) = self.store.remove_by_prefix(prefix).await {
            warn!("Failed to invalidate cache prefix '{}': {}", prefix, e);
        }
    }

    async fn publish(&self, event: DomainEvent) {
        self.events.publish(event).await;
    }
}

/// Paging parameters shared by list queries.
#[derive(Debug, Clone, Copy, Default)]
pub struct PageQuery {
    pub page_number: u32,
    pub page_size: u32,
}

impl PageQuery {
    pub fn new(page_number: u32, page_size: u32) -> Self {
        Self {
            page_number,
            page_size,
        }
    }

    pub fn page(&self) -> Page {
        Page {
            number: self.page_number,
            size: self.page_size,
        }
    }

    pub(crate) fn check(&self, rules: &mut Rules) {
        rules
            .positive("PageNumber", i64::from(self.page_number))
            .positive("PageSize", i64::from(self.page_size))
            .check(
                self.page_size <= MAX_PAGE_SIZE,
                format!("PageSize must not exceed {}.", MAX_PAGE_SIZE),
            );
    }
}
