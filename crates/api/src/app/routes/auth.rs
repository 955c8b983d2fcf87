use std::sync::Arc;

use axum::http::StatusCode;
use chrono::Utc;

use reelpipe_auth::{JwtIssuer, UserStore};
use reelpipe_pipeline::{
    Chain, Flow, Handler, HandlerResult, HttpError, Method, RequestContext, RouteError, Router,
    handler_fn, reply,
};

use crate::app::dto::{Credentials, LoginResponse, body_as};
use crate::app::errors::auth_error_to_http;
use crate::app::services::AppServices;
use crate::context::AuthenticatedUser;
use crate::middleware::RequireBearer;

pub fn register_routes(router: &mut Router, services: &AppServices) -> Result<(), RouteError> {
    router
        .post("/register", register(services.users.clone()))?
        .post("/login", login(services.users.clone(), services.jwt.clone()))?
        .post("/logout", logout)?
        .route(
            Method::GET,
            "/profile",
            Chain::of(RequireBearer::new(services.jwt.clone())).then(profile),
        )?;
    Ok(())
}

fn register(users: Arc<UserStore>) -> impl Handler {
    handler_fn(move |ctx| {
        let creds: Credentials = body_as(ctx)?;
        users
            .register(&creds.username, &creds.password)
            .map_err(auth_error_to_http)?;
        Ok(Flow::Respond(reply::message(
            StatusCode::CREATED,
            "User created successfully",
        )))
    })
}

fn login(users: Arc<UserStore>, jwt: Arc<dyn JwtIssuer>) -> impl Handler {
    handler_fn(move |ctx| {
        let creds: Credentials = body_as(ctx)?;
        let user = users
            .authenticate(&creds.username, &creds.password)
            .ok_or_else(|| HttpError::unauthorized("Invalid credentials"))?;

        let token = jwt.issue(&user.username, Utc::now()).map_err(|e| {
            tracing::error!("token issue failed: {e}");
            HttpError::internal("Server error")
        })?;
        tracing::info!(username = %user.username, "user logged in");

        Ok(Flow::Respond(reply::json(
            StatusCode::OK,
            &LoginResponse {
                message: "Logged in successfully",
                token,
            },
        )?))
    })
}

/// Tokens are stateless; logging out is the client discarding its token.
fn logout(_ctx: &mut RequestContext) -> HandlerResult {
    Ok(Flow::Respond(reply::message(
        StatusCode::OK,
        "Logged out successfully",
    )))
}

fn profile(ctx: &mut RequestContext) -> HandlerResult {
    let user = ctx
        .get::<AuthenticatedUser>()
        .ok_or_else(|| HttpError::unauthorized("Access token required"))?;
    Ok(Flow::Respond(reply::message(
        StatusCode::OK,
        format!("Welcome, {}!", user.username()),
    )))
}
