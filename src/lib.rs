pub mod app;
pub mod auth;
pub mod cli;
pub mod config;
pub mod database;
pub mod error;
pub mod filter;
pub mod handlers;
pub mod hierarchy;
pub mod middleware;
pub mod pagination;
pub mod services;

#[cfg(test)]
pub mod testing;
