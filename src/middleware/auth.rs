use axum::{
    extract::{Request, State},
    http::{HeaderMap, StatusCode},
    middleware::Next,
    response::{Json, Response},
};
use uuid::Uuid;

use crate::app::AppState;
use crate::auth::{Claims, TokenKind};
use crate::error::ApiError;

/// Authenticated account context extracted from an access token
#[derive(Clone, Debug)]
pub struct AuthUser {
    pub account: String,
    pub account_id: Uuid,
    pub roles: Vec<String>,
}

impl From<Claims> for AuthUser {
    fn from(claims: Claims) -> Self {
        Self {
            account: claims.sub,
            account_id: claims.account_id,
            roles: claims.roles,
        }
    }
}

type Rejection = (StatusCode, Json<serde_json::Value>);

fn reject(api_error: ApiError) -> Rejection {
    (
        StatusCode::from_u16(api_error.status_code()).unwrap_or(StatusCode::UNAUTHORIZED),
        Json(api_error.to_json()),
    )
}

/// JWT authentication middleware. Only access tokens are accepted.
pub async fn jwt_auth_middleware(
    State(state): State<AppState>,
    headers: HeaderMap,
    mut request: Request,
    next: Next,
) -> Result<Response, Rejection> {
    let token = extract_jwt_from_headers(&headers).map_err(|msg| reject(ApiError::unauthorized(msg)))?;

    let claims = state
        .keys
        .validate(&token, TokenKind::Access)
        .map_err(|e| {
            tracing::debug!("Rejected bearer token: {}", e);
            reject(ApiError::from(e))
        })?;

    request.extensions_mut().insert(AuthUser::from(claims));

    Ok(next.run(request).await)
}

/// Extract JWT token from Authorization header
fn extract_jwt_from_headers(headers: &HeaderMap) -> Result<String, String> {
    let auth_header = headers
        .get(axum::http::header::AUTHORIZATION)
        .ok_or_else(|| "Missing Authorization header".to_string())?;

    let auth_str = auth_header
        .to_str()
        .map_err(|_| "Invalid Authorization header format".to_string())?;

    if let Some(token) = auth_str.strip_prefix("Bearer ") {
        if token.trim().is_empty() {
            return Err("Empty JWT token".to_string());
        }
        Ok(token.trim().to_string())
    } else {
        Err("Authorization header must use Bearer token format".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::Tables;
    use crate::testing::test_keys;
    use axum::body::Body;
    use axum::http::HeaderValue;
    use axum::routing::get;
    use axum::{middleware, Extension, Router};
    use tower::ServiceExt;

    fn guarded() -> Router {
        let state = AppState::new(Tables::memory(), test_keys(), 4, None);
        Router::new()
            .route("/me", get(|Extension(user): Extension<AuthUser>| async move { user.account }))
            .route_layer(middleware::from_fn_with_state(state.clone(), jwt_auth_middleware))
            .with_state(state)
    }

    async fn status_with(token: Option<&str>) -> StatusCode {
        let mut builder = axum::http::Request::builder().uri("/me");
        if let Some(token) = token {
            builder = builder.header("authorization", format!("Bearer {}", token));
        }
        guarded().oneshot(builder.body(Body::empty()).unwrap()).await.unwrap().status()
    }

    #[tokio::test]
    async fn access_tokens_pass_and_others_are_rejected() {
        let keys = test_keys();
        let access = keys.issue("alice", Uuid::new_v4(), &[], TokenKind::Access).unwrap();
        let refresh = keys.issue("alice", Uuid::new_v4(), &[], TokenKind::Refresh).unwrap();

        assert_eq!(status_with(Some(&access)).await, StatusCode::OK);
        assert_eq!(status_with(Some(&refresh)).await, StatusCode::UNAUTHORIZED);
        assert_eq!(status_with(Some("not-a-jwt")).await, StatusCode::UNAUTHORIZED);
        assert_eq!(status_with(None).await, StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn bearer_prefix_is_required() {
        let mut headers = HeaderMap::new();
        assert!(extract_jwt_from_headers(&headers).is_err());

        headers.insert("authorization", HeaderValue::from_static("Basic abc"));
        assert!(extract_jwt_from_headers(&headers).is_err());

        headers.insert("authorization", HeaderValue::from_static("Bearer   "));
        assert!(extract_jwt_from_headers(&headers).is_err());

        headers.insert("authorization", HeaderValue::from_static("Bearer abc.def.ghi"));
        assert_eq!(extract_jwt_from_headers(&headers).unwrap(), "abc.def.ghi");
    }
}
