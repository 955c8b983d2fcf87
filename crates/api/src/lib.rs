//! HTTP API: configuration, middleware, routes, and the axum bridge.

pub mod app;
pub mod config;
pub mod context;
pub mod middleware;
pub mod server;
