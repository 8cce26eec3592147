// handlers/public/mod.rs - endpoints reachable without a token
//
// Route prefix: /api/v1/auth
// Middleware: none
pub mod auth;
