use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};

use crate::AppState;
use crate::application::company::{
    CreateCompany, DeleteCompany, ListCompanies, PaginatedCompanies, SearchCompanies,
    UpdateCompany,
};
use crate::error::AppResult;
use crate::result::ApiResult;

#[axum::debug_handler]
pub async fn create_company(
    State(state): State<AppState>,
    Json(req): Json<CreateCompany>,
) -> AppResult<impl IntoResponse> {
    let company = state.mediator.send(req).await?;
    Ok((StatusCode::CREATED, Json(ApiResult::success(company))))
}

#[axum::debug_handler]
pub async fn update_company(
    State(state): State<AppState>,
    Json(req): Json<UpdateCompany>,
) -> AppResult<StatusCode> {
    state.mediator.send(req).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[axum::debug_handler]
pub async fn delete_company(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> AppResult<StatusCode> {
    state.mediator.send(DeleteCompany { id }).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[axum::debug_handler]
pub async fn list_companies(
    State(state): State<AppState>,
    Query(query): Query<ListCompanies>,
) -> AppResult<impl IntoResponse> {
    let companies = state.mediator.send(query).await?;
    Ok(Json(ApiResult::success(companies)))
}

#[axum::debug_handler]
pub async fn paginated_companies(
    State(state): State<AppState>,
    Query(query): Query<PaginatedCompanies>,
) -> AppResult<impl IntoResponse> {
    Ok(Json(state.mediator.send(query).await?))
}

#[axum::debug_handler]
pub async fn search_companies(
    State(state): State<AppState>,
    Query(query): Query<SearchCompanies>,
) -> AppResult<impl IntoResponse> {
    Ok(Json(state.mediator.send(query).await?))
}
