//! `reelpipe-pipeline`: ordered request pipeline (middleware, routing, error chains).
//!
//! A [`Pipeline`] owns a root [`Router`]. Each inbound request gets its own
//! [`RequestContext`] and is walked through the router stack in registration
//! order:
//!
//! - middleware runs for every request whose path matches its mount prefix,
//! - the first route whose method and path match runs its handler chain,
//! - mounted routers receive the path remainder below their prefix,
//! - a raised [`HttpError`] skips the remaining normal handlers and is offered
//!   to the error handlers of the innermost router first, then its parents.
//!
//! The crate is transport-agnostic: requests and responses are plain
//! `http` types with a [`bytes::Bytes`] body.

pub mod context;
pub mod dispatch;
pub mod error;
pub mod handler;
pub mod path;
pub mod reply;
pub mod router;

pub use context::{Phase, RequestContext};
pub use dispatch::Pipeline;
pub use error::{ErrorKind, HttpError, RouteError};
pub use handler::{
    error_handler_fn, handler_fn, BoxedErrorHandler, BoxedHandler, Chain, ErrorHandler, Flow,
    Handler, HandlerResult,
};
pub use path::{Params, PathPattern};
pub use reply::Response;
pub use router::Router;

pub use http::{Method, StatusCode};
