use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use registry_api::{
    AppState,
    application::RequestHandlers,
    cache::{CacheStore, MemoryCacheStore, RedisCacheStore, operations::ConsumptionTracker},
    config::Config,
    database::{self, Repositories},
    events::LogEventPublisher,
    middleware::RateLimiter,
    pipeline::{CachingBehavior, Mediator},
    router::{create_router, rate_limit_policies},
    utils::{Clock, SystemClock},
};
use sqlx::Executor;
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env().expect("Failed to load configuration");

    #[cfg(debug_assertions)]
    tracing::info!("Running in debug mode with CORS enabled");

    #[cfg(not(debug_assertions))]
    tracing::info!("Running in production mode with CORS disabled");

    let repositories = match &config.database_url {
        Some(url) => {
            let pool = PgPoolOptions::new()
                .max_connections(config.database_max_connections)
                .after_connect(|conn, _meta| {
                    Box::pin(async move {
                        conn.execute("SET application_name = 'registry_api';")
                            .await?;
                        Ok(())
                    })
                })
                .connect(url)
                .await
                .expect("Failed to connect to Postgres");
            database::ensure_schema(&pool)
                .await
                .expect("Failed to create database schema");
            Repositories::postgres(pool)
        }
        None => {
            tracing::warn!("DATABASE_URL not set, using in-memory repositories");
            Repositories::in_memory()
        }
    };

    let default_expiration = config.cache_default_expiration();
    let store: Arc<dyn CacheStore> = match &config.redis_url {
        Some(url) => {
            let client = redis::Client::open(url.as_str()).expect("Failed to create Redis client");
            Arc::new(RedisCacheStore::new(client, default_expiration))
        }
        None => {
            tracing::warn!("REDIS_URL not set, using in-memory cache store");
            Arc::new(MemoryCacheStore::new(default_expiration))
        }
    };

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);

    let handlers = RequestHandlers::new(
        repositories,
        store.clone(),
        Arc::new(LogEventPublisher),
        clock.clone(),
    );
    let caching = CachingBehavior::new(store.clone(), config.cache_failure_policy)
        .with_single_flight(config.cache_single_flight);
    let mediator = Arc::new(Mediator::new(Arc::new(handlers), caching));

    let rate_limiter = Arc::new(RateLimiter::new(
        ConsumptionTracker::new(store.clone(), clock),
        rate_limit_policies(&config.api_base_uri),
        config.cache_failure_policy,
    ));

    let state = AppState {
        config: config.clone(),
        mediator,
        store,
    };

    let router = create_router(state, rate_limiter);

    #[cfg(debug_assertions)]
    let router = {
        tracing::debug!("Adding CORS layer for development mode");
        router.layer(tower_http::cors::CorsLayer::permissive())
    };

    let addr = SocketAddr::new(
        config.server_host.parse().unwrap_or_else(|_| {
            tracing::warn!("Invalid server_host, falling back to dual-stack default");
            IpAddr::V6(std::net::Ipv6Addr::UNSPECIFIED)
        }),
        config.server_port,
    );
    tracing::info!("Server listening on {}", addr);
    axum::serve(
        tokio::net::TcpListener::bind(&addr)
            .await
            .expect("Failed to bind"),
        router.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    .expect("Failed to start server");
}
