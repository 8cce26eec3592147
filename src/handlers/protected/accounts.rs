// handlers/protected/accounts.rs - /api/v1/users/accounts

use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::Json;
use uuid::Uuid;

use crate::app::AppState;
use crate::database::models::Account;
use crate::middleware::{ApiResponse, ApiResult};
use crate::pagination::{Pagination, QueryResponse};
use crate::services::account::{AccountCreated, AccountDetail, AccountInput, AccountQuery, PasswordReset};

/// GET with substring filters (userName, account, mobile, workNumber, email),
/// exact filters (isDisabled, isLeave, positionId, organizationId) and paging.
pub async fn list(
    State(state): State<AppState>,
    query: Result<Query<AccountQuery>, QueryRejection>,
    page: Result<Query<Pagination>, QueryRejection>,
) -> ApiResult<QueryResponse<Account>> {
    let (Query(query), Query(page)) = (query?, page?);
    Ok(ApiResponse::success(state.accounts.list(&query, &page).await?))
}

/// POST returns the generated initial password. It is shown only once.
pub async fn create(State(state): State<AppState>, payload: Result<Json<AccountInput>, JsonRejection>) -> ApiResult<AccountCreated> {
    let Json(input) = payload?;
    Ok(ApiResponse::created(state.accounts.create(input).await?))
}

pub async fn get(State(state): State<AppState>, id: Result<Path<Uuid>, PathRejection>) -> ApiResult<AccountDetail> {
    let Path(id) = id?;
    Ok(ApiResponse::success(state.accounts.get(id).await?))
}

pub async fn update(
    State(state): State<AppState>,
    id: Result<Path<Uuid>, PathRejection>,
    payload: Result<Json<AccountInput>, JsonRejection>,
) -> ApiResult<Account> {
    let Path(id) = id?;
    let Json(input) = payload?;
    Ok(ApiResponse::success(state.accounts.update(id, input).await?))
}

pub async fn delete(State(state): State<AppState>, id: Result<Path<Uuid>, PathRejection>) -> ApiResult<()> {
    let Path(id) = id?;
    state.accounts.delete(id).await?;
    Ok(ApiResponse::no_content())
}

/// POST /:id/password/reset
pub async fn reset_password(State(state): State<AppState>, id: Result<Path<Uuid>, PathRejection>) -> ApiResult<PasswordReset> {
    let Path(id) = id?;
    Ok(ApiResponse::success(state.accounts.reset_password(id).await?))
}
