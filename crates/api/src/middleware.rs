use std::sync::Arc;

use async_trait::async_trait;
use axum::http::{HeaderMap, header};
use chrono::Utc;
use serde_json::{Map, Value};

use reelpipe_auth::JwtValidator;
use reelpipe_pipeline::{Flow, Handler, HandlerResult, HttpError, RequestContext};

use crate::context::{AuthenticatedUser, RequestTime};

pub fn request_logger(ctx: &mut RequestContext) -> HandlerResult {
    tracing::info!(method = %ctx.method(), path = %ctx.path(), "LOGGED");
    Ok(Flow::Next)
}

pub fn request_time(ctx: &mut RequestContext) -> HandlerResult {
    ctx.insert(RequestTime::new(Utc::now()));
    Ok(Flow::Next)
}

/// Parse `application/json` bodies into the structured body slot.
pub fn json_body(ctx: &mut RequestContext) -> HandlerResult {
    if ctx.raw_body().is_empty() || !content_type_is(ctx, is_json) {
        return Ok(Flow::Next);
    }

    let body: Value = serde_json::from_slice(ctx.raw_body()).map_err(|e| {
        tracing::debug!(error = %e, "rejecting malformed JSON body");
        HttpError::bad_request("Malformed JSON body")
    })?;
    ctx.set_body(body);
    Ok(Flow::Next)
}

/// Parse `application/x-www-form-urlencoded` bodies into a flat object of strings.
pub fn form_body(ctx: &mut RequestContext) -> HandlerResult {
    if ctx.raw_body().is_empty()
        || !content_type_is(ctx, |mime| mime == "application/x-www-form-urlencoded")
    {
        return Ok(Flow::Next);
    }

    let pairs: Vec<(String, String)> = serde_urlencoded::from_bytes(ctx.raw_body())
        .map_err(|_| HttpError::bad_request("Malformed form body"))?;
    let fields: Map<String, Value> = pairs
        .into_iter()
        .map(|(k, v)| (k, Value::String(v)))
        .collect();
    ctx.set_body(Value::Object(fields));
    Ok(Flow::Next)
}

/// Movies router timing: logs when the request reached the router.
pub fn log_time(ctx: &mut RequestContext) -> HandlerResult {
    let at = ctx
        .get::<RequestTime>()
        .map(RequestTime::at)
        .unwrap_or_else(Utc::now);
    tracing::info!(path = %ctx.path(), "Time: {}", at.to_rfc3339());
    Ok(Flow::Next)
}

/// Scoped to `/user/:id`.
pub fn log_request_type(ctx: &mut RequestContext) -> HandlerResult {
    tracing::info!("Request Type: {}", ctx.method());
    Ok(Flow::Next)
}

fn content_type_is(ctx: &RequestContext, pred: impl Fn(&str) -> bool) -> bool {
    ctx.header(header::CONTENT_TYPE)
        .and_then(|ct| ct.split(';').next())
        .map(|mime| pred(&mime.trim().to_ascii_lowercase()))
        .unwrap_or(false)
}

fn is_json(mime: &str) -> bool {
    mime == "application/json" || mime.ends_with("+json")
}

/// Requires a valid bearer token; attaches [`AuthenticatedUser`].
///
/// A missing token raises 401, an unverifiable one 403.
#[derive(Clone)]
pub struct RequireBearer {
    jwt: Arc<dyn JwtValidator>,
}

impl RequireBearer {
    pub fn new(jwt: Arc<dyn JwtValidator>) -> Self {
        Self { jwt }
    }
}

#[async_trait]
impl Handler for RequireBearer {
    async fn call(&self, ctx: &mut RequestContext) -> HandlerResult {
        let token = extract_bearer(ctx.headers())
            .ok_or_else(|| HttpError::unauthorized("Access token required"))?;

        let claims = self.jwt.validate(token, Utc::now()).map_err(|e| {
            tracing::debug!(error = %e, "bearer token rejected");
            HttpError::forbidden("Invalid or expired token")
        })?;

        ctx.insert(AuthenticatedUser::new(claims));
        Ok(Flow::Next)
    }
}

fn extract_bearer(headers: &HeaderMap) -> Option<&str> {
    let header = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = header.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }

    let token = token.trim();
    (!token.is_empty()).then_some(token)
}
