// handlers/protected/organizations.rs - /api/v1/users/organizations

use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::Json;
use uuid::Uuid;

use super::NameQuery;
use crate::app::AppState;
use crate::database::models::Organization;
use crate::middleware::{ApiResponse, ApiResult};
use crate::services::organization::OrganizationInput;
use crate::services::{NodeDetail, NodeListing};

/// GET ?name= returns matches with their paths, otherwise the whole forest.
pub async fn list(State(state): State<AppState>, query: Result<Query<NameQuery>, QueryRejection>) -> ApiResult<NodeListing<Organization>> {
    let Query(query) = query?;
    Ok(ApiResponse::success(state.organizations.list(query.name.as_deref()).await?))
}

pub async fn create(
    State(state): State<AppState>,
    payload: Result<Json<OrganizationInput>, JsonRejection>,
) -> ApiResult<Organization> {
    let Json(input) = payload?;
    Ok(ApiResponse::created(state.organizations.create(input).await?))
}

pub async fn get(State(state): State<AppState>, id: Result<Path<Uuid>, PathRejection>) -> ApiResult<NodeDetail<Organization>> {
    let Path(id) = id?;
    Ok(ApiResponse::success(state.organizations.get(id).await?))
}

pub async fn update(
    State(state): State<AppState>,
    id: Result<Path<Uuid>, PathRejection>,
    payload: Result<Json<OrganizationInput>, JsonRejection>,
) -> ApiResult<Organization> {
    let Path(id) = id?;
    let Json(input) = payload?;
    Ok(ApiResponse::success(state.organizations.update(id, input).await?))
}

pub async fn delete(State(state): State<AppState>, id: Result<Path<Uuid>, PathRejection>) -> ApiResult<()> {
    let Path(id) = id?;
    state.organizations.delete(id).await?;
    Ok(ApiResponse::no_content())
}
