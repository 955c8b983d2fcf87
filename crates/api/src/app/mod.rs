//! HTTP API application wiring.
//!
//! - `services.rs`: shared collaborators (stores, token service)
//! - `routes/`: handlers, one file per area
//! - `dto.rs`: request/response bodies
//! - `errors.rs`: error rendering and domain error mapping

use std::sync::Arc;

use axum::http::StatusCode;

use reelpipe_pipeline::{Pipeline, RouteError, Router};

use crate::config::ApiConfig;
use crate::{middleware, server};

pub mod dto;
pub mod errors;
pub mod routes;
pub mod services;

pub use services::AppServices;

/// Assemble the full route table.
///
/// Order matters: root middleware, then routes and mounted routers in
/// registration order, then the global error handler.
pub fn build_pipeline(
    services: &AppServices,
    not_found_status: StatusCode,
) -> Result<Pipeline, RouteError> {
    let mut root = Router::new();
    root.use_middleware(middleware::request_logger)
        .use_middleware(middleware::request_time)
        .use_middleware(middleware::json_body)
        .use_middleware(middleware::form_body);
    root.use_at("/user/:id", middleware::log_request_type)?;

    root.get("/", routes::system::hello)?
        .get("/user/:id", routes::system::user)?
        .get("/async-error", routes::system::AsyncFailure)?
        .get("/example", routes::system::unavailable)?;
    routes::auth::register_routes(&mut root, services)?;

    root.mount("/movies", routes::movies::router(services.movies.clone())?)?
        .mount("/users", routes::users::router()?)?;

    root.catch(errors::json_error_handler("app"));

    tracing::debug!(routes = root.route_count(), "pipeline assembled");
    Ok(Pipeline::new(root).with_not_found_status(not_found_status))
}

/// Build the axum service (public entrypoint used by `main.rs`).
pub fn build_app(config: &ApiConfig, services: &AppServices) -> Result<axum::Router, RouteError> {
    let pipeline = build_pipeline(services, config.not_found_status)?;
    Ok(server::router(Arc::new(pipeline)))
}
