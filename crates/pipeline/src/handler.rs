//! Handler contracts: normal-path handlers and error handlers.

use std::sync::Arc;

use async_trait::async_trait;

use crate::context::RequestContext;
use crate::error::HttpError;
use crate::reply::Response;

/// What a normal-path handler decided.
#[derive(Debug)]
pub enum Flow {
    /// Pass control to the next handler (context mutations are kept).
    Next,
    /// Terminate the pipeline with this response.
    Respond(Response),
}

/// `Ok(Flow)` to continue or respond, `Err` to raise.
pub type HandlerResult = Result<Flow, HttpError>;

/// One position in a handler chain.
///
/// Plain functions and closures of shape
/// `Fn(&mut RequestContext) -> HandlerResult` implement this trait; handlers
/// that need to await implement it directly.
#[async_trait]
pub trait Handler: Send + Sync + 'static {
    async fn call(&self, ctx: &mut RequestContext) -> HandlerResult;
}

#[async_trait]
impl<F> Handler for F
where
    F: Fn(&mut RequestContext) -> HandlerResult + Send + Sync + 'static,
{
    async fn call(&self, ctx: &mut RequestContext) -> HandlerResult {
        (self)(ctx)
    }
}

/// Pin a closure to the handler signature (helps closure type inference).
pub fn handler_fn<F>(f: F) -> F
where
    F: Fn(&mut RequestContext) -> HandlerResult + Send + Sync + 'static,
{
    f
}

pub type BoxedHandler = Arc<dyn Handler>;

/// A handler authorized to run only after an error was raised.
///
/// It cannot continue the normal chain: it either produces the final
/// response or passes an error (the same one or a replacement) outward.
pub trait ErrorHandler: Send + Sync + 'static {
    fn handle(&self, err: &HttpError, ctx: &RequestContext) -> Result<Response, HttpError>;
}

impl<F> ErrorHandler for F
where
    F: Fn(&HttpError, &RequestContext) -> Result<Response, HttpError> + Send + Sync + 'static,
{
    fn handle(&self, err: &HttpError, ctx: &RequestContext) -> Result<Response, HttpError> {
        (self)(err, ctx)
    }
}

pub fn error_handler_fn<F>(f: F) -> F
where
    F: Fn(&HttpError, &RequestContext) -> Result<Response, HttpError> + Send + Sync + 'static,
{
    f
}

pub type BoxedErrorHandler = Arc<dyn ErrorHandler>;

/// An ordered, non-empty-at-registration list of handlers.
#[derive(Clone, Default)]
pub struct Chain {
    handlers: Vec<BoxedHandler>,
}

impl Chain {
    pub fn new() -> Self {
        Self::default()
    }

    /// A chain with a single handler.
    pub fn of<H: Handler>(handler: H) -> Self {
        Self::new().then(handler)
    }

    pub fn then<H: Handler>(mut self, handler: H) -> Self {
        self.handlers.push(Arc::new(handler));
        self
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    pub(crate) fn handlers(&self) -> &[BoxedHandler] {
        &self.handlers
    }
}

impl core::fmt::Debug for Chain {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Chain")
            .field("handlers", &self.handlers.len())
            .finish()
    }
}
