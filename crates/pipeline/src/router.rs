//! Router: an ordered stack of middleware, routes and mounted sub-routers.

use std::sync::Arc;

use http::Method;

use crate::error::RouteError;
use crate::handler::{BoxedErrorHandler, BoxedHandler, Chain, ErrorHandler, Handler};
use crate::path::PathPattern;

pub(crate) struct Route {
    pub(crate) method: Method,
    pub(crate) pattern: PathPattern,
    pub(crate) chain: Chain,
}

pub(crate) enum Layer {
    Middleware {
        mount: Option<PathPattern>,
        handler: BoxedHandler,
    },
    Route(Route),
    Mount {
        prefix: PathPattern,
        router: Router,
    },
}

pub(crate) struct ParamHook {
    pub(crate) name: String,
    pub(crate) handler: BoxedHandler,
}

/// An ordered route table plus its middleware and error-handling chain.
///
/// Entries run in registration order. The table is built once and is
/// read-only after it is handed to a [`crate::Pipeline`].
#[derive(Default)]
pub struct Router {
    pub(crate) stack: Vec<Layer>,
    pub(crate) param_hooks: Vec<ParamHook>,
    pub(crate) error_handlers: Vec<BoxedErrorHandler>,
}

impl Router {
    pub fn new() -> Self {
        Self::default()
    }

    /// Middleware that runs for every request reaching this router.
    pub fn use_middleware<H: Handler>(&mut self, handler: H) -> &mut Self {
        self.stack.push(Layer::Middleware {
            mount: None,
            handler: Arc::new(handler),
        });
        self
    }

    /// Middleware that runs only when the path starts with `pattern`.
    pub fn use_at<H: Handler>(&mut self, pattern: &str, handler: H) -> Result<&mut Self, RouteError> {
        let mount = PathPattern::parse(pattern)?;
        self.stack.push(Layer::Middleware {
            mount: Some(mount),
            handler: Arc::new(handler),
        });
        Ok(self)
    }

    /// Register a handler chain for `(method, pattern)`.
    ///
    /// Registering the same pair twice replaces the earlier chain in place;
    /// the route keeps its original position in the table.
    pub fn route(&mut self, method: Method, pattern: &str, chain: Chain) -> Result<&mut Self, RouteError> {
        let pattern = PathPattern::parse(pattern)?;
        if chain.is_empty() {
            return Err(RouteError::EmptyChain {
                method,
                pattern: pattern.as_str().to_string(),
            });
        }

        let existing = self.stack.iter_mut().find_map(|layer| match layer {
            Layer::Route(r) if r.method == method && r.pattern == pattern => Some(r),
            _ => None,
        });
        if let Some(route) = existing {
            tracing::warn!(%method, pattern = %pattern, "route registered twice; last registration wins");
            route.chain = chain;
            return Ok(self);
        }

        self.stack.push(Layer::Route(Route {
            method,
            pattern,
            chain,
        }));
        Ok(self)
    }

    pub fn get<H: Handler>(&mut self, pattern: &str, handler: H) -> Result<&mut Self, RouteError> {
        self.route(Method::GET, pattern, Chain::of(handler))
    }

    pub fn post<H: Handler>(&mut self, pattern: &str, handler: H) -> Result<&mut Self, RouteError> {
        self.route(Method::POST, pattern, Chain::of(handler))
    }

    pub fn put<H: Handler>(&mut self, pattern: &str, handler: H) -> Result<&mut Self, RouteError> {
        self.route(Method::PUT, pattern, Chain::of(handler))
    }

    pub fn delete<H: Handler>(&mut self, pattern: &str, handler: H) -> Result<&mut Self, RouteError> {
        self.route(Method::DELETE, pattern, Chain::of(handler))
    }

    /// Mount a sub-router below `prefix`. The sub-router sees the path
    /// remainder; its error handlers run before this router's.
    pub fn mount(&mut self, prefix: &str, router: Router) -> Result<&mut Self, RouteError> {
        let prefix = PathPattern::parse(prefix)?;
        self.stack.push(Layer::Mount { prefix, router });
        Ok(self)
    }

    /// Hook run before a matched route's chain whenever the route captured
    /// parameter `name`. Hooks run in registration order.
    pub fn param<H: Handler>(&mut self, name: &str, handler: H) -> &mut Self {
        self.param_hooks.push(ParamHook {
            name: name.to_string(),
            handler: Arc::new(handler),
        });
        self
    }

    /// Append an error handler to this router's error-handling chain.
    pub fn catch<E: ErrorHandler>(&mut self, handler: E) -> &mut Self {
        self.error_handlers.push(Arc::new(handler));
        self
    }

    /// Number of routes registered directly on this router.
    /// Whether this router itself registers `method` on exactly `pattern`.
    pub(crate) fn has_route(&self, method: &Method, pattern: &PathPattern) -> bool {
        self.stack.iter().any(|layer| {
            matches!(layer, Layer::Route(r) if r.method == *method && r.pattern == *pattern)
        })
    }

    pub fn route_count(&self) -> usize {
        self.stack
            .iter()
            .filter(|layer| matches!(layer, Layer::Route(_)))
            .count()
    }
}

impl core::fmt::Debug for Router {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Router")
            .field("layers", &self.stack.len())
            .field("routes", &self.route_count())
            .field("error_handlers", &self.error_handlers.len())
            .finish()
    }
}
