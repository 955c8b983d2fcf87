//! Pipeline error model: raised request errors and route registration errors.

use http::{Method, StatusCode};
use thiserror::Error;

/// Coarse classification of a raised error.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// Bad or missing input (400).
    ClientError,
    /// The addressed record does not exist (404).
    NotFound,
    /// No credential was presented (401).
    Unauthorized,
    /// A credential was presented but rejected (403).
    Forbidden,
    /// Uncaught internal fault (500).
    ServerFault,
    /// Any other explicitly chosen status.
    Custom,
}

impl ErrorKind {
    pub fn from_status(status: StatusCode) -> Self {
        match status {
            StatusCode::BAD_REQUEST => Self::ClientError,
            StatusCode::NOT_FOUND => Self::NotFound,
            StatusCode::UNAUTHORIZED => Self::Unauthorized,
            StatusCode::FORBIDDEN => Self::Forbidden,
            StatusCode::INTERNAL_SERVER_ERROR => Self::ServerFault,
            _ => Self::Custom,
        }
    }
}

/// An error raised by a handler: a human-readable message plus a status code.
///
/// The status defaults to 500 when constructed with [`HttpError::new`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct HttpError {
    kind: ErrorKind,
    status: StatusCode,
    message: String,
}

impl HttpError {
    /// An error with the default status (500).
    pub fn new(message: impl Into<String>) -> Self {
        Self::with_status(StatusCode::INTERNAL_SERVER_ERROR, message)
    }

    pub fn with_status(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::from_status(status),
            status,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::with_status(StatusCode::BAD_REQUEST, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::with_status(StatusCode::NOT_FOUND, message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::with_status(StatusCode::UNAUTHORIZED, message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::with_status(StatusCode::FORBIDDEN, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(message)
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Route table construction errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RouteError {
    #[error("path pattern must not be empty")]
    EmptyPattern,

    #[error("path pattern must start with '/': {0}")]
    MissingLeadingSlash(String),

    #[error("parameter segment without a name in {0}")]
    UnnamedParam(String),

    #[error("a path component may hold at most one parameter: {0}")]
    MisplacedParam(String),

    #[error("parameter `{name}` appears twice in {pattern}")]
    DuplicateParam { name: String, pattern: String },

    #[error("route {method} {pattern} has an empty handler chain")]
    EmptyChain { method: Method, pattern: String },
}
