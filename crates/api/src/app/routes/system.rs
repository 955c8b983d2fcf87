use async_trait::async_trait;
use axum::http::StatusCode;

use reelpipe_pipeline::{Flow, Handler, HandlerResult, HttpError, RequestContext, reply};

use crate::context::RequestTime;

pub fn hello(ctx: &mut RequestContext) -> HandlerResult {
    let requested_at = ctx.get::<RequestTime>().map(RequestTime::millis).unwrap_or_default();
    Ok(Flow::Respond(reply::html(
        StatusCode::OK,
        format!("Hello World!<br><small>Requested at: {requested_at}</small>"),
    )))
}

pub fn user(_ctx: &mut RequestContext) -> HandlerResult {
    Ok(Flow::Respond(reply::text(StatusCode::OK, "USER")))
}

/// Raises after suspending, to exercise error capture across an await.
pub struct AsyncFailure;

#[async_trait]
impl Handler for AsyncFailure {
    async fn call(&self, _ctx: &mut RequestContext) -> HandlerResult {
        tokio::task::yield_now().await;
        Err(HttpError::new("Async error occurred!"))
    }
}

pub fn unavailable(_ctx: &mut RequestContext) -> HandlerResult {
    Err(HttpError::with_status(
        StatusCode::SERVICE_UNAVAILABLE,
        "Data not available",
    ))
}
