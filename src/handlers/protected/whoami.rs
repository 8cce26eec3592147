// handlers/protected/whoami.rs - GET /api/v1/auth/whoami

use axum::extract::State;
use axum::Extension;

use crate::app::AppState;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::services::account::AccountDetail;

pub async fn whoami(State(state): State<AppState>, Extension(user): Extension<AuthUser>) -> ApiResult<AccountDetail> {
    tracing::debug!("whoami for {} ({:?})", user.account, user.roles);
    Ok(ApiResponse::success(state.accounts.get(user.account_id).await?))
}
