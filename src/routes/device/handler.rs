use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};

use crate::AppState;
use crate::application::device::{CreateDevice, DeleteDevice, SearchDevices, UpdateDevice};
use crate::error::AppResult;
use crate::result::ApiResult;

#[axum::debug_handler]
pub async fn create_device(
    State(state): State<AppState>,
    Json(req): Json<CreateDevice>,
) -> AppResult<impl IntoResponse> {
    let device = state.mediator.send(req).await?;
    Ok((StatusCode::CREATED, Json(ApiResult::success(device))))
}

#[axum::debug_handler]
pub async fn update_device(
    State(state): State<AppState>,
    Json(req): Json<UpdateDevice>,
) -> AppResult<StatusCode> {
    state.mediator.send(req).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[axum::debug_handler]
pub async fn delete_device(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> AppResult<StatusCode> {
    state.mediator.send(DeleteDevice { id }).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[axum::debug_handler]
pub async fn search_devices(
    State(state): State<AppState>,
    Query(query): Query<SearchDevices>,
) -> AppResult<impl IntoResponse> {
    Ok(Json(state.mediator.send(query).await?))
}
