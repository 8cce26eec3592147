// handlers/protected/permissions.rs - /api/v1/upms/permissions

use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::Json;
use uuid::Uuid;

use crate::app::AppState;
use crate::database::models::Permission;
use crate::middleware::{ApiResponse, ApiResult};
use crate::pagination::{Pagination, QueryResponse};
use crate::services::permission::{PermissionInput, PermissionQuery};

pub async fn list(
    State(state): State<AppState>,
    query: Result<Query<PermissionQuery>, QueryRejection>,
    page: Result<Query<Pagination>, QueryRejection>,
) -> ApiResult<QueryResponse<Permission>> {
    let (Query(query), Query(page)) = (query?, page?);
    Ok(ApiResponse::success(state.permissions.list(&query, &page).await?))
}

pub async fn create(
    State(state): State<AppState>,
    payload: Result<Json<PermissionInput>, JsonRejection>,
) -> ApiResult<Permission> {
    let Json(input) = payload?;
    Ok(ApiResponse::created(state.permissions.create(input).await?))
}

pub async fn update(
    State(state): State<AppState>,
    id: Result<Path<Uuid>, PathRejection>,
    payload: Result<Json<PermissionInput>, JsonRejection>,
) -> ApiResult<Permission> {
    let Path(id) = id?;
    let Json(input) = payload?;
    Ok(ApiResponse::success(state.permissions.update(id, input).await?))
}

pub async fn delete(State(state): State<AppState>, id: Result<Path<Uuid>, PathRejection>) -> ApiResult<()> {
    let Path(id) = id?;
    state.permissions.delete(id).await?;
    Ok(ApiResponse::no_content())
}
