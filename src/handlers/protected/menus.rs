// handlers/protected/menus.rs - /api/v1/upms/menus

use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::Json;
use uuid::Uuid;

use super::NameQuery;
use crate::app::AppState;
use crate::database::models::Menu;
use crate::middleware::{ApiResponse, ApiResult};
use crate::services::menu::MenuInput;
use crate::services::{NodeDetail, NodeListing};

pub async fn list(State(state): State<AppState>, query: Result<Query<NameQuery>, QueryRejection>) -> ApiResult<NodeListing<Menu>> {
    let Query(query) = query?;
    Ok(ApiResponse::success(state.menus.list(query.name.as_deref()).await?))
}

pub async fn create(State(state): State<AppState>, payload: Result<Json<MenuInput>, JsonRejection>) -> ApiResult<Menu> {
    let Json(input) = payload?;
    Ok(ApiResponse::created(state.menus.create(input).await?))
}

pub async fn get(State(state): State<AppState>, id: Result<Path<Uuid>, PathRejection>) -> ApiResult<NodeDetail<Menu>> {
    let Path(id) = id?;
    Ok(ApiResponse::success(state.menus.get(id).await?))
}

pub async fn update(
    State(state): State<AppState>,
    id: Result<Path<Uuid>, PathRejection>,
    payload: Result<Json<MenuInput>, JsonRejection>,
) -> ApiResult<Menu> {
    let Path(id) = id?;
    let Json(input) = payload?;
    Ok(ApiResponse::success(state.menus.update(id, input).await?))
}

pub async fn delete(State(state): State<AppState>, id: Result<Path<Uuid>, PathRejection>) -> ApiResult<()> {
    let Path(id) = id?;
    state.menus.delete(id).await?;
    Ok(ApiResponse::no_content())
}
