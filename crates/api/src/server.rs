//! Bridge between axum and the request pipeline.
//!
//! axum owns sockets and HTTP framing; every request is handed to
//! [`Pipeline::dispatch`] through a single fallback handler.

use std::sync::Arc;

use axum::{
    Router,
    body::{Body, Bytes},
    extract::{
        DefaultBodyLimit, State,
        rejection::{BytesRejection, FailedToBufferBody},
    },
    http::{StatusCode, request::Parts},
    response::Response,
};

use reelpipe_pipeline::{Pipeline, reply};

/// Largest request body read into memory (100 KiB).
pub const MAX_BODY_BYTES: usize = 100 * 1024;

pub fn router(pipeline: Arc<Pipeline>) -> Router {
    Router::new()
        .fallback(dispatch)
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .with_state(pipeline)
}

async fn dispatch(
    State(pipeline): State<Arc<Pipeline>>,
    parts: Parts,
    body: Result<Bytes, BytesRejection>,
) -> Response {
    let bytes = match body {
        Ok(bytes) => bytes,
        Err(rejection) => {
            tracing::warn!(error = %rejection, path = %parts.uri.path(), "request body rejected");
            return body_rejection(&rejection).map(Body::from);
        }
    };

    pipeline
        .dispatch(axum::http::Request::from_parts(parts, bytes))
        .await
        .map(Body::from)
}

fn body_rejection(rejection: &BytesRejection) -> reply::Response {
    match rejection {
        BytesRejection::FailedToBufferBody(FailedToBufferBody::LengthLimitError(_)) => {
            reply::message(StatusCode::PAYLOAD_TOO_LARGE, "Request body too large")
        }
        _ => reply::message(StatusCode::BAD_REQUEST, "Failed to read request body"),
    }
}
