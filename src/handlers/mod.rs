// handlers/mod.rs - two-tier handler layout
//
// Public (no auth) → Protected (access token required)
pub mod protected;
pub mod public;
