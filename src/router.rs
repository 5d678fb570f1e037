use std::sync::Arc;

use axum::{
    Router,
    http::Method,
    middleware::{from_fn, from_fn_with_state},
    routing::{delete, get, post},
};

use crate::AppState;
use crate::cache::models::RateLimitPolicy;
use crate::middleware::{RateLimitPolicies, RateLimiter, log_errors, rate_limit};
use crate::routes;

/// Paginated listing: three requests per client every six seconds.
pub const PAGINATED_COMPANIES_POLICY: RateLimitPolicy = RateLimitPolicy::new(3, 6);

/// Rate-limit policies for the routes nested under `base_uri`.
pub fn rate_limit_policies(base_uri: &str) -> RateLimitPolicies {
    RateLimitPolicies::new().with(
        Method::GET,
        full_path(base_uri, "/companies/paginated"),
        PAGINATED_COMPANIES_POLICY,
    )
}

fn full_path(base_uri: &str, path: &str) -> String {
    format!("{}{}", base_uri.trim_end_matches('/'), path)
}

fn company_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/companies",
            get(routes::company::list_companies)
                .post(routes::company::create_company)
                .put(routes::company::update_company),
        )
        .route(
            "/companies/paginated",
            get(routes::company::paginated_companies),
        )
        .route("/companies/search", get(routes::company::search_companies))
        .route("/companies/{id}", delete(routes::company::delete_company))
}

fn device_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/devices",
            post(routes::device::create_device).put(routes::device::update_device),
        )
        .route("/devices/search", get(routes::device::search_devices))
        .route("/devices/{id}", delete(routes::device::delete_device))
}

/// Composes the API under the configured base path.
pub fn create_router(state: AppState, limiter: Arc<RateLimiter>) -> Router {
    let api = Router::new()
        .merge(company_routes())
        .merge(device_routes())
        .route("/ping", get(routes::health::ping));

    // axum refuses to nest at the root
    let router = match state.config.api_base_uri.as_str() {
        "/" => api,
        base => Router::new().nest(base, api),
    };

    router
        .layer(from_fn(log_errors))
        .layer(from_fn_with_state(limiter, rate_limit))
        .with_state(state)
}
