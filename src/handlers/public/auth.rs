// handlers/public/auth.rs - login, token refresh and password change

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;

use crate::app::AppState;
use crate::auth::TokenPair;
use crate::middleware::{ApiResponse, ApiResult};
use crate::services::account::{ChangePasswordRequest, LoginRequest, LoginResponse, RefreshRequest};

/// POST /api/v1/auth/login
///
/// Body `{"account", "password"}` with the password base64 encoded. Returns
/// an access and refresh token pair plus the account.
pub async fn login(State(state): State<AppState>, payload: Result<Json<LoginRequest>, JsonRejection>) -> ApiResult<LoginResponse> {
    let Json(request) = payload?;
    Ok(ApiResponse::success(state.accounts.login(request).await?))
}

/// POST /api/v1/auth/refresh
pub async fn refresh(State(state): State<AppState>, payload: Result<Json<RefreshRequest>, JsonRejection>) -> ApiResult<TokenPair> {
    let Json(request) = payload?;
    Ok(ApiResponse::success(state.accounts.refresh(request).await?))
}

/// POST /api/v1/auth/password
///
/// Public so that accounts flagged for a password change can still change it.
pub async fn change_password(
    State(state): State<AppState>,
    payload: Result<Json<ChangePasswordRequest>, JsonRejection>,
) -> ApiResult<()> {
    let Json(request) = payload?;
    state.accounts.change_password(request).await?;
    Ok(ApiResponse::no_content())
}
