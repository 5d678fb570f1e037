use axum::Json;
use axum::{
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::result::ApiResult;

/// Message returned to clients that exceed a rate-limit policy.
pub const TOO_MANY_REQUESTS_MESSAGE: &str = "Too many requests. Please try again later.";

/// Errors raised by a key-value cache store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("redis error: {0}")]
    Redis(#[from] redis::RedisError),
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    NotFound(String),
    #[error("validation failed")]
    Validation(Vec<String>),
    #[error("{0}")]
    Conflict(String),
    #[error("rate limit exceeded")]
    RateLimitExceeded { retry_after_secs: u64 },
    #[error("cache store unavailable: {0}")]
    CacheStore(#[from] StoreError),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

pub type AppResult<T> = Result<T, AppError>;

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            AppError::NotFound(message) => {
                (StatusCode::NOT_FOUND, ApiResult::<()>::failure(message))
            }
            AppError::Validation(errors) => (
                StatusCode::BAD_REQUEST,
                ApiResult::<()>::failure("One or more validation errors occurred.")
                    .with_errors(errors),
            ),
            AppError::Conflict(message) => {
                (StatusCode::CONFLICT, ApiResult::<()>::failure(message))
            }
            AppError::RateLimitExceeded { retry_after_secs } => {
                let mut response = (
                    StatusCode::TOO_MANY_REQUESTS,
                    Json(ApiResult::<()>::failure(TOO_MANY_REQUESTS_MESSAGE)),
                )
                    .into_response();
                response
                    .headers_mut()
                    .insert(header::RETRY_AFTER, HeaderValue::from(retry_after_secs));
                return response;
            }
            // store and database details stay in the logs
            AppError::CacheStore(e) => {
                tracing::error!("Cache store failure: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ApiResult::<()>::failure("Internal server error"),
                )
            }
            AppError::Database(e) => {
                tracing::error!("Database failure: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ApiResult::<()>::failure("Internal server error"),
                )
            }
        };

        (status, Json(body)).into_response()
    }
}
