// handlers/protected/mod.rs - endpoints behind jwt_auth_middleware
//
// Route prefixes: /api/v1/auth/whoami, /api/v1/users/*, /api/v1/upms/*
pub mod accounts;
pub mod menus;
pub mod organizations;
pub mod permissions;
pub mod positions;
pub mod roles;
pub mod whoami;

use serde::Deserialize;

/// `?name=` filter shared by the tree listings.
#[derive(Debug, Default, Deserialize)]
pub struct NameQuery {
    pub name: Option<String>,
}
