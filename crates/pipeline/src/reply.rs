//! Response type and constructors used by handlers.

use bytes::Bytes;
use http::{header, HeaderValue, StatusCode};
use serde::Serialize;

use crate::error::HttpError;

/// A finished response.
pub type Response = http::Response<Bytes>;

const TEXT_PLAIN: &str = "text/plain; charset=utf-8";
const TEXT_HTML: &str = "text/html; charset=utf-8";
const APPLICATION_JSON: &str = "application/json";

fn with_body(status: StatusCode, content_type: &'static str, body: Bytes) -> Response {
    let mut res = http::Response::new(body);
    *res.status_mut() = status;
    res.headers_mut()
        .insert(header::CONTENT_TYPE, HeaderValue::from_static(content_type));
    res
}

pub fn text(status: StatusCode, body: impl Into<String>) -> Response {
    with_body(status, TEXT_PLAIN, Bytes::from(body.into()))
}

pub fn html(status: StatusCode, body: impl Into<String>) -> Response {
    with_body(status, TEXT_HTML, Bytes::from(body.into()))
}

/// Serialize `value` as the JSON body.
pub fn json<T: Serialize + ?Sized>(status: StatusCode, value: &T) -> Result<Response, HttpError> {
    let body = serde_json::to_vec(value)
        .map_err(|e| HttpError::internal(format!("failed to encode response: {e}")))?;
    Ok(with_body(status, APPLICATION_JSON, Bytes::from(body)))
}

/// `{"message": ...}` body, the shape used for every error and acknowledgement.
pub fn message(status: StatusCode, message: impl Into<String>) -> Response {
    let body = serde_json::json!({ "message": message.into() }).to_string();
    with_body(status, APPLICATION_JSON, Bytes::from(body))
}
