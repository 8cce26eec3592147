use std::sync::Arc;

use axum::extract::{DefaultBodyLimit, State};
use axum::http::{HeaderValue, StatusCode};
use axum::response::{IntoResponse, Json};
use axum::routing::{get, post, put};
use axum::{middleware, Router};
use serde_json::{json, Value};
use sqlx::PgPool;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::auth::JwtKeys;
use crate::config::AppConfig;
use crate::database::{DatabaseManager, Tables};
use crate::handlers::{protected, public};
use crate::middleware::jwt_auth_middleware;
use crate::services::{AccountService, MenuService, OrganizationService, PermissionService, PositionService, RoleService};

/// Services shared by every handler. Built once from the chosen tables.
#[derive(Clone)]
pub struct AppState {
    pub organizations: Arc<OrganizationService>,
    pub menus: Arc<MenuService>,
    pub positions: Arc<PositionService>,
    pub accounts: Arc<AccountService>,
    pub roles: Arc<RoleService>,
    pub permissions: Arc<PermissionService>,
    pub keys: Arc<JwtKeys>,
    pub pool: Option<PgPool>,
}

impl AppState {
    pub fn new(tables: Tables, keys: JwtKeys, bcrypt_cost: u32, pool: Option<PgPool>) -> Self {
        let keys = Arc::new(keys);
        Self {
            organizations: Arc::new(OrganizationService::new(&tables)),
            menus: Arc::new(MenuService::new(&tables)),
            positions: Arc::new(PositionService::new(&tables)),
            accounts: Arc::new(AccountService::new(&tables, keys.clone(), bcrypt_cost)),
            roles: Arc::new(RoleService::new(&tables)),
            permissions: Arc::new(PermissionService::new(&tables)),
            keys,
            pool,
        }
    }
}

pub fn app(state: AppState, config: &AppConfig) -> Router {
    let protected_routes = Router::new()
        .merge(auth_routes())
        .merge(users_routes())
        .merge(upms_routes())
        .route_layer(middleware::from_fn_with_state(state.clone(), jwt_auth_middleware));

    Router::new()
        // Public
        .route("/", get(root))
        .route("/health", get(health))
        .merge(auth_public_routes())
        // Protected API
        .merge(protected_routes)
        // Global middleware
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors_layer(&config.security.cors_origins))
                .layer(DefaultBodyLimit::max(config.server.max_request_size_bytes)),
        )
        .with_state(state)
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    if origins.is_empty() || origins.iter().any(|o| o == "*") {
        return CorsLayer::permissive();
    }
    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| match o.parse::<HeaderValue>() {
            Ok(v) => Some(v),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin: {}", o);
                None
            }
        })
        .collect();
    CorsLayer::permissive().allow_origin(allowed)
}

fn auth_public_routes() -> Router<AppState> {
    use public::auth;

    Router::new()
        .route("/api/v1/auth/login", post(auth::login))
        .route("/api/v1/auth/refresh", post(auth::refresh))
        .route("/api/v1/auth/password", post(auth::change_password))
}

fn auth_routes() -> Router<AppState> {
    Router::new().route("/api/v1/auth/whoami", get(protected::whoami::whoami))
}

fn users_routes() -> Router<AppState> {
    use protected::{accounts, organizations, positions};

    Router::new()
        .route("/api/v1/users/organizations", get(organizations::list).post(organizations::create))
        .route(
            "/api/v1/users/organizations/:id",
            get(organizations::get).put(organizations::update).delete(organizations::delete),
        )
        .route("/api/v1/users/positions", get(positions::list).post(positions::create))
        .route("/api/v1/users/positions/:id", put(positions::update).delete(positions::delete))
        .route("/api/v1/users/accounts", get(accounts::list).post(accounts::create))
        .route(
            "/api/v1/users/accounts/:id",
            get(accounts::get).put(accounts::update).delete(accounts::delete),
        )
        .route("/api/v1/users/accounts/:id/password/reset", post(accounts::reset_password))
}

fn upms_routes() -> Router<AppState> {
    use protected::{menus, permissions, roles};

    Router::new()
        .route("/api/v1/upms/menus", get(menus::list).post(menus::create))
        .route("/api/v1/upms/menus/:id", get(menus::get).put(menus::update).delete(menus::delete))
        .route("/api/v1/upms/roles", get(roles::list).post(roles::create))
        .route("/api/v1/upms/roles/:id", put(roles::update).delete(roles::delete))
        .route(
            "/api/v1/upms/roles/:id/accounts",
            post(roles::bind_accounts).delete(roles::unbind_accounts),
        )
        .route("/api/v1/upms/roles/:id/menus", get(roles::menus).put(roles::set_menus))
        .route("/api/v1/upms/permissions", get(permissions::list).post(permissions::create))
        .route("/api/v1/upms/permissions/:id", put(permissions::update).delete(permissions::delete))
}

async fn root() -> Json<Value> {
    Json(json!({
        "success": true,
        "data": {
            "name": "UPMS API",
            "version": env!("CARGO_PKG_VERSION"),
            "description": "User and permission management backend",
            "endpoints": {
                "home": "/ (public)",
                "health": "/health (public)",
                "auth": "/api/v1/auth/login, /api/v1/auth/refresh, /api/v1/auth/password (public)",
                "whoami": "/api/v1/auth/whoami (protected)",
                "users": "/api/v1/users/{organizations,positions,accounts} (protected)",
                "upms": "/api/v1/upms/{menus,roles,permissions} (protected)",
            }
        }
    }))
}

async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let now = chrono::Utc::now();

    let Some(pool) = state.pool.as_ref() else {
        return (
            StatusCode::OK,
            Json(json!({
                "success": true,
                "data": { "status": "ok", "timestamp": now, "database": "memory" }
            })),
        );
    };

    match DatabaseManager::health_check(pool).await {
        Ok(_) => (
            StatusCode::OK,
            Json(json!({
                "success": true,
                "data": { "status": "ok", "timestamp": now, "database": "ok" }
            })),
        ),
        Err(e) => {
            tracing::error!("Health check failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "success": false,
                    "error": "database unavailable",
                    "data": { "status": "degraded", "timestamp": now }
                })),
            )
        }
    }
}
