use std::sync::Arc;

use cache::CacheStore;
use config::Config;
use pipeline::Mediator;

pub mod application;
pub mod cache;
pub mod config;
pub mod database;
pub mod error;
pub mod events;
pub mod middleware;
pub mod pipeline;
pub mod result;
pub mod router;
pub mod routes;
pub mod utils;

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub mediator: Arc<Mediator>,
    pub store: Arc<dyn CacheStore>,
}
