use axum::{Json, extract::State};
use serde::Serialize;
use tracing::warn;

use crate::AppState;
use crate::result::ApiResult;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Health {
    pub status: &'static str,
    pub cache_store: &'static str,
}

/// Liveness probe; also reports whether the cache store answers.
pub async fn ping(State(state): State<AppState>) -> Json<ApiResult<Health>> {
    let cache_store = match state.store.exists("health:ping").await {
        Ok(_) => "up",
        Err(e) => {
            warn!("Cache store health check failed: {}", e);
            "down"
        }
    };

    Json(ApiResult::success_with_message(
        Health {
            status: "up",
            cache_store,
        },
        "pong",
    ))
}
