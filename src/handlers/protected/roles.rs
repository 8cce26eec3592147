// handlers/protected/roles.rs - /api/v1/upms/roles and its bindings

use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::Json;
use uuid::Uuid;

use crate::app::AppState;
use crate::database::models::{Menu, Role};
use crate::hierarchy::TreeNode;
use crate::middleware::{ApiResponse, ApiResult};
use crate::pagination::{Pagination, QueryResponse};
use crate::services::role::{AccountIds, MenuIds, RoleAccounts, RoleInput, RoleQuery};

pub async fn list(
    State(state): State<AppState>,
    query: Result<Query<RoleQuery>, QueryRejection>,
    page: Result<Query<Pagination>, QueryRejection>,
) -> ApiResult<QueryResponse<Role>> {
    let (Query(query), Query(page)) = (query?, page?);
    Ok(ApiResponse::success(state.roles.list(&query, &page).await?))
}

pub async fn create(State(state): State<AppState>, payload: Result<Json<RoleInput>, JsonRejection>) -> ApiResult<Role> {
    let Json(input) = payload?;
    Ok(ApiResponse::created(state.roles.create(input).await?))
}

pub async fn update(
    State(state): State<AppState>,
    id: Result<Path<Uuid>, PathRejection>,
    payload: Result<Json<RoleInput>, JsonRejection>,
) -> ApiResult<Role> {
    let Path(id) = id?;
    let Json(input) = payload?;
    Ok(ApiResponse::success(state.roles.rename(id, input).await?))
}

pub async fn delete(State(state): State<AppState>, id: Result<Path<Uuid>, PathRejection>) -> ApiResult<()> {
    let Path(id) = id?;
    state.roles.delete(id).await?;
    Ok(ApiResponse::no_content())
}

/// POST /:id/accounts `{"accountIds": [...]}`
pub async fn bind_accounts(
    State(state): State<AppState>,
    id: Result<Path<Uuid>, PathRejection>,
    payload: Result<Json<AccountIds>, JsonRejection>,
) -> ApiResult<RoleAccounts> {
    let Path(id) = id?;
    let Json(input) = payload?;
    Ok(ApiResponse::success(state.roles.bind_accounts(id, input).await?))
}

/// DELETE /:id/accounts `{"accountIds": [...]}`
pub async fn unbind_accounts(
    State(state): State<AppState>,
    id: Result<Path<Uuid>, PathRejection>,
    payload: Result<Json<AccountIds>, JsonRejection>,
) -> ApiResult<RoleAccounts> {
    let Path(id) = id?;
    let Json(input) = payload?;
    Ok(ApiResponse::success(state.roles.unbind_accounts(id, input).await?))
}

pub async fn menus(State(state): State<AppState>, id: Result<Path<Uuid>, PathRejection>) -> ApiResult<Vec<TreeNode<Menu>>> {
    let Path(id) = id?;
    Ok(ApiResponse::success(state.roles.menus(id).await?))
}

/// PUT /:id/menus `{"menuIds": [...]}` replaces every binding.
pub async fn set_menus(
    State(state): State<AppState>,
    id: Result<Path<Uuid>, PathRejection>,
    payload: Result<Json<MenuIds>, JsonRejection>,
) -> ApiResult<Vec<TreeNode<Menu>>> {
    let Path(id) = id?;
    let Json(input) = payload?;
    Ok(ApiResponse::success(state.roles.set_menus(id, input).await?))
}
