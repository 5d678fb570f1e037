use std::sync::Arc;

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, StatusCode, header},
    response::Response,
};
use chrono::{Duration, TimeZone, Utc};
use registry_api::{
    AppState,
    application::RequestHandlers,
    cache::{CacheStore, MemoryCacheStore, operations::ConsumptionTracker},
    config::{Config, FailurePolicy},
    database::Repositories,
    events::LogEventPublisher,
    middleware::RateLimiter,
    pipeline::{CachingBehavior, Mediator},
    router::{create_router, rate_limit_policies},
    utils::{Clock, ManualClock},
};
use serde_json::{Value, json};
use tower::ServiceExt;

struct TestApp {
    router: Router,
    store: Arc<MemoryCacheStore>,
    clock: Arc<ManualClock>,
}

impl TestApp {
    fn new() -> Self {
        let config = Config::default();
        let store = Arc::new(MemoryCacheStore::new(None));
        let clock = Arc::new(ManualClock::new(
            Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap(),
        ));
        let shared_store: Arc<dyn CacheStore> = store.clone();
        let shared_clock: Arc<dyn Clock> = clock.clone();

        let handlers = RequestHandlers::new(
            Repositories::in_memory(),
            shared_store.clone(),
            Arc::new(LogEventPublisher),
            shared_clock.clone(),
        );
        let caching = CachingBehavior::new(shared_store.clone(), FailurePolicy::FailOpen)
            .with_single_flight(true);
        let limiter = Arc::new(RateLimiter::new(
            ConsumptionTracker::new(shared_store.clone(), shared_clock),
            rate_limit_policies(&config.api_base_uri),
            FailurePolicy::FailOpen,
        ));
        let state = AppState {
            config,
            mediator: Arc::new(Mediator::new(Arc::new(handlers), caching)),
            store: shared_store,
        };

        Self {
            router: create_router(state, limiter),
            store,
            clock,
        }
    }

    async fn send(&self, request: Request<Body>) -> Response {
        self.router.clone().oneshot(request).await.unwrap()
    }

    async fn get(&self, uri: &str, client_ip: &str) -> Response {
        self.send(
            Request::builder()
                .uri(uri)
                .header("x-real-ip", client_ip)
                .body(Body::empty())
                .unwrap(),
        )
        .await
    }

    async fn json(&self, method: &str, uri: &str, body: Value) -> Response {
        self.send(
            Request::builder()
                .method(method)
                .uri(uri)
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
    }
}

async fn body_json(response: Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

const PAGINATED: &str = "/api/companies/paginated?pageNumber=1&pageSize=10";

#[tokio::test]
async fn paginated_companies_are_limited_to_three_per_six_seconds() {
    let app = TestApp::new();

    for _ in 0..3 {
        let response = app.get(PAGINATED, "10.0.0.1").await;
        assert_eq!(response.status(), StatusCode::OK);
        app.clock.advance(Duration::seconds(1));
    }

    // t = 3s
    let rejected = app.get(PAGINATED, "10.0.0.1").await;
    assert_eq!(rejected.status(), StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(rejected.headers()[header::RETRY_AFTER], "3");
    assert_eq!(
        body_json(rejected).await,
        json!({
            "succeeded": false,
            "message": "Too many requests. Please try again later."
        })
    );

    // t = 7s, a new window
    app.clock.advance(Duration::seconds(4));
    let admitted = app.get(PAGINATED, "10.0.0.1").await;
    assert_eq!(admitted.status(), StatusCode::OK);
}

#[tokio::test]
async fn each_client_has_its_own_allowance() {
    let app = TestApp::new();

    for _ in 0..3 {
        app.get(PAGINATED, "10.0.0.1").await;
    }
    assert_eq!(
        app.get(PAGINATED, "10.0.0.1").await.status(),
        StatusCode::TOO_MANY_REQUESTS
    );

    for _ in 0..3 {
        assert_eq!(app.get(PAGINATED, "10.0.0.2").await.status(), StatusCode::OK);
    }
}

#[tokio::test]
async fn head_requests_are_limited_with_get() {
    let app = TestApp::new();
    let head = |ip: &'static str| {
        Request::builder()
            .method("HEAD")
            .uri(format!("{}&bypassCache=true", PAGINATED))
            .header("x-real-ip", ip)
            .body(Body::empty())
            .unwrap()
    };

    for _ in 0..3 {
        assert_eq!(app.send(head("10.0.0.1")).await.status(), StatusCode::OK);
    }
    let rejected = app.send(head("10.0.0.1")).await;
    assert_eq!(rejected.status(), StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(rejected.headers()[header::RETRY_AFTER], "6");

    // the GET allowance is the same one
    assert_eq!(
        app.get(PAGINATED, "10.0.0.1").await.status(),
        StatusCode::TOO_MANY_REQUESTS
    );
}

#[tokio::test]
async fn unlimited_routes_ignore_the_policy() {
    let app = TestApp::new();

    for _ in 0..10 {
        let response = app
            .get("/api/companies/search?pageNumber=1&pageSize=5", "10.0.0.1")
            .await;
        assert_eq!(response.status(), StatusCode::OK);
    }
}

#[tokio::test]
async fn list_is_cached_and_invalidated_by_commands() {
    let app = TestApp::new();

    let created = app
        .json("POST", "/api/companies", json!({ "tenantId": 1, "name": "Acme" }))
        .await;
    assert_eq!(created.status(), StatusCode::CREATED);
    let created = body_json(created).await;
    assert_eq!(created["data"]["name"], "Acme");

    let listed = body_json(app.get("/api/companies", "10.0.0.1").await).await;
    assert_eq!(listed["data"].as_array().unwrap().len(), 1);
    assert!(app.store.exists("companies:all").await.unwrap());

    let updated = app
        .json(
            "PUT",
            "/api/companies",
            json!({
                "id": created["data"]["id"],
                "name": "Acme Corp",
                "updatedBy": "ops",
                "updatedUserId": "u-1"
            }),
        )
        .await;
    assert_eq!(updated.status(), StatusCode::NO_CONTENT);
    assert!(!app.store.exists("companies:all").await.unwrap());

    let listed = body_json(app.get("/api/companies", "10.0.0.1").await).await;
    assert_eq!(listed["data"][0]["name"], "Acme Corp");
}

#[tokio::test]
async fn bypass_cache_skips_the_store() {
    let app = TestApp::new();

    let response = app
        .get(
            "/api/companies/search?pageNumber=1&pageSize=10&name=acme&bypassCache=true",
            "10.0.0.1",
        )
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    assert!(app.store.is_empty());
}

#[tokio::test]
async fn invalid_requests_are_rejected_with_their_errors() {
    let app = TestApp::new();

    let response = app
        .json("POST", "/api/companies", json!({ "tenantId": 0 }))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = body_json(response).await;
    assert_eq!(body["succeeded"], false);
    assert_eq!(
        body["errors"],
        json!(["TenantId must be greater than 0.", "Name is required."])
    );

    let response = app
        .get("/api/companies/search?pageNumber=0&pageSize=10", "10.0.0.1")
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn devices_reject_duplicate_hardware_ids() {
    let app = TestApp::new();
    let device = json!({
        "tenantId": 1,
        "deviceId": 42,
        "deviceIp": "192.168.1.20",
        "devicePort": 4370,
        "name": "Main Gate"
    });

    let first = app.json("POST", "/api/devices", device.clone()).await;
    assert_eq!(first.status(), StatusCode::CREATED);

    let second = app.json("POST", "/api/devices", device).await;
    assert_eq!(second.status(), StatusCode::CONFLICT);

    let found = body_json(
        app.get(
            "/api/devices/search?pageNumber=1&pageSize=10&deviceIp=192.168.1",
            "10.0.0.1",
        )
        .await,
    )
    .await;
    assert_eq!(found["totalCount"], 1);
    assert_eq!(found["data"][0]["deviceId"], 42);
}

#[tokio::test]
async fn deleting_a_missing_company_is_not_found() {
    let app = TestApp::new();

    let response = app
        .send(
            Request::builder()
                .method("DELETE")
                .uri("/api/companies/99")
                .body(Body::empty())
                .unwrap(),
        )
        .await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(response).await["succeeded"], false);
}

#[tokio::test]
async fn ping_reports_the_store() {
    let app = TestApp::new();

    let body = body_json(app.get("/api/ping", "10.0.0.1").await).await;

    assert_eq!(body["succeeded"], true);
    assert_eq!(body["data"]["cacheStore"], "up");
}
