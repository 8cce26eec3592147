// handlers/protected/positions.rs - /api/v1/users/positions

use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::Json;
use uuid::Uuid;

use crate::app::AppState;
use crate::database::models::Position;
use crate::middleware::{ApiResponse, ApiResult};
use crate::pagination::{Pagination, QueryResponse};
use crate::services::position::{PositionInput, PositionQuery, PositionRename};

pub async fn list(
    State(state): State<AppState>,
    query: Result<Query<PositionQuery>, QueryRejection>,
    page: Result<Query<Pagination>, QueryRejection>,
) -> ApiResult<QueryResponse<Position>> {
    let (Query(query), Query(page)) = (query?, page?);
    Ok(ApiResponse::success(state.positions.list(&query, &page).await?))
}

pub async fn create(State(state): State<AppState>, payload: Result<Json<PositionInput>, JsonRejection>) -> ApiResult<Position> {
    let Json(input) = payload?;
    Ok(ApiResponse::created(state.positions.create(input).await?))
}

/// PUT changes the name only.
pub async fn update(
    State(state): State<AppState>,
    id: Result<Path<Uuid>, PathRejection>,
    payload: Result<Json<PositionRename>, JsonRejection>,
) -> ApiResult<Position> {
    let Path(id) = id?;
    let Json(input) = payload?;
    Ok(ApiResponse::success(state.positions.rename(id, input).await?))
}

pub async fn delete(State(state): State<AppState>, id: Result<Path<Uuid>, PathRejection>) -> ApiResult<()> {
    let Path(id) = id?;
    state.positions.delete(id).await?;
    Ok(ApiResponse::no_content())
}
