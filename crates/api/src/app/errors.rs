use reelpipe_auth::AuthError;
use reelpipe_pipeline::{ErrorHandler, HttpError, error_handler_fn, reply};

/// Render any raised error as `{"message": ...}` with its status.
///
/// `scope` only tags the log line so router-local handling is visible.
pub fn json_error_handler(scope: &'static str) -> impl ErrorHandler {
    error_handler_fn(move |err: &HttpError, ctx| {
        if err.status().is_server_error() {
            tracing::error!(
                scope,
                status = err.status().as_u16(),
                method = %ctx.method(),
                path = %ctx.path(),
                "{}",
                err.message()
            );
        } else {
            tracing::warn!(
                scope,
                status = err.status().as_u16(),
                path = %ctx.path(),
                "{}",
                err.message()
            );
        }
        Ok(reply::message(err.status(), err.message()))
    })
}

pub fn auth_error_to_http(err: AuthError) -> HttpError {
    match err {
        AuthError::Domain(e) => HttpError::bad_request(e.detail()),
        AuthError::Hash(msg) => {
            tracing::error!("password hashing failed: {msg}");
            HttpError::internal("Server error")
        }
    }
}
