//! Request dispatch: walks the router stack and resolves exactly one response.

use std::any::Any;
use std::panic::AssertUnwindSafe;

use bytes::Bytes;
use futures::future::{BoxFuture, FutureExt};
use http::{Method, StatusCode};

use crate::context::{Phase, RequestContext};
use crate::error::HttpError;
use crate::handler::{BoxedHandler, Flow, Handler, HandlerResult};
use crate::reply::{self, Response};
use crate::router::{Layer, Route, Router};

/// How a router walk ended.
enum Outcome {
    Responded(Response),
    /// Nothing in this router (or below) matched the request.
    Unmatched,
    /// An error was raised and no error handler in this router resolved it.
    Raised(HttpError),
}

/// The assembled request pipeline. Immutable; share it behind an `Arc`.
#[derive(Debug)]
pub struct Pipeline {
    root: Router,
    not_found_status: StatusCode,
}

impl Pipeline {
    pub fn new(root: Router) -> Self {
        Self {
            root,
            not_found_status: StatusCode::NOT_FOUND,
        }
    }

    /// Status used when no route matches (default 404).
    pub fn with_not_found_status(mut self, status: StatusCode) -> Self {
        self.not_found_status = status;
        self
    }

    /// Run one request to completion.
    pub async fn dispatch(&self, request: http::Request<Bytes>) -> Response {
        let mut ctx = RequestContext::new(request);
        let response = self.dispatch_context(&mut ctx).await;
        ctx.set_phase(Phase::ResponseSent);
        response
    }

    async fn dispatch_context(&self, ctx: &mut RequestContext) -> Response {
        ctx.set_phase(Phase::MatchingRoute);
        tracing::debug!(method = %ctx.method(), path = %ctx.path(), "dispatching request");

        let path = ctx.path().to_string();
        let mut response = match self.walk(&self.root, ctx, path).await {
            Outcome::Responded(res) => res,
            Outcome::Unmatched => {
                tracing::debug!(method = %ctx.method(), path = %ctx.path(), "no route matched");
                reply::text(
                    self.not_found_status,
                    format!("Cannot {} {}", ctx.method(), ctx.path()),
                )
            }
            Outcome::Raised(err) => {
                tracing::error!(
                    status = err.status().as_u16(),
                    path = %ctx.path(),
                    "unhandled error: {}",
                    err.message()
                );
                reply::message(err.status(), err.message())
            }
        };

        if ctx.method() == Method::HEAD {
            *response.body_mut() = Bytes::new();
        }
        response
    }

    fn walk<'a>(
        &'a self,
        router: &'a Router,
        ctx: &'a mut RequestContext,
        path: String,
    ) -> BoxFuture<'a, Outcome> {
        async move {
            for layer in &router.stack {
                match layer {
                    Layer::Middleware { mount, handler } => {
                        let mount_params = match mount {
                            None => None,
                            Some(pattern) => match pattern.match_prefix(&path) {
                                Some(m) => Some(m.params),
                                None => continue,
                            },
                        };

                        let saved = mount_params.map(|params| {
                            let mut merged = ctx.params().clone();
                            merged.extend(params);
                            ctx.replace_params(merged)
                        });

                        ctx.set_phase(Phase::RunningNormalChain);
                        let result = self.invoke(handler.as_ref(), ctx).await;

                        if let Some(previous) = saved {
                            ctx.replace_params(previous);
                        }

                        match result {
                            Ok(Flow::Next) => continue,
                            Ok(Flow::Respond(res)) => return Outcome::Responded(res),
                            Err(err) => return self.recover(router, ctx, err),
                        }
                    }
                    Layer::Route(route) => {
                        if !method_matches(&route.method, ctx.method()) {
                            continue;
                        }
                        // An explicit HEAD route on the same pattern beats the GET fallback.
                        if route.method != ctx.method()
                            && router.has_route(ctx.method(), &route.pattern)
                        {
                            continue;
                        }
                        let Some(params) = route.pattern.matches(&path) else {
                            continue;
                        };
                        ctx.params_mut().extend(params);

                        return match self.run_route(router, route, ctx).await {
                            Ok(res) => Outcome::Responded(res),
                            Err(err) => self.recover(router, ctx, err),
                        };
                    }
                    Layer::Mount { prefix, router: sub } => {
                        let Some(m) = prefix.match_prefix(&path) else {
                            continue;
                        };

                        let mut merged = ctx.params().clone();
                        merged.extend(m.params);
                        let saved_params = ctx.replace_params(merged);
                        let saved_paths = ctx.enter_mount(&m.matched, m.remainder.clone());

                        let outcome = self.walk(sub, ctx, m.remainder).await;

                        ctx.leave_mount(saved_paths);
                        match outcome {
                            Outcome::Unmatched => {
                                ctx.replace_params(saved_params);
                                continue;
                            }
                            Outcome::Responded(res) => return Outcome::Responded(res),
                            Outcome::Raised(err) => return self.recover(router, ctx, err),
                        }
                    }
                }
            }
            Outcome::Unmatched
        }
        .boxed()
    }

    /// Run param hooks, then the route chain. A chain that finishes without
    /// responding is a logic fault.
    async fn run_route(
        &self,
        router: &Router,
        route: &Route,
        ctx: &mut RequestContext,
    ) -> Result<Response, HttpError> {
        ctx.set_phase(Phase::RunningNormalChain);

        let hooks: Vec<&BoxedHandler> = router
            .param_hooks
            .iter()
            .filter(|hook| route.pattern.param_names().any(|name| name == hook.name))
            .map(|hook| &hook.handler)
            .collect();

        for handler in hooks.into_iter().chain(route.chain.handlers()) {
            match self.invoke(handler.as_ref(), ctx).await? {
                Flow::Next => continue,
                Flow::Respond(res) => return Ok(res),
            }
        }

        tracing::error!(
            method = %route.method,
            pattern = %route.pattern,
            "handler chain completed without a response"
        );
        Err(HttpError::internal(format!(
            "handler chain for {} {} completed without a response",
            route.method, route.pattern
        )))
    }

    /// Invoke one handler, converting a panic into a raised 500.
    async fn invoke(&self, handler: &dyn Handler, ctx: &mut RequestContext) -> HandlerResult {
        if ctx.phase() == Phase::ResponseSent {
            tracing::error!(path = %ctx.path(), "handler invoked after the response was sent");
            return Err(HttpError::internal("handler invoked after the response was sent"));
        }

        match AssertUnwindSafe(handler.call(ctx)).catch_unwind().await {
            Ok(result) => result,
            Err(payload) => {
                let message = panic_message(payload.as_ref());
                tracing::error!(path = %ctx.path(), "handler panicked: {message}");
                Err(HttpError::internal(message))
            }
        }
    }

    /// Offer `err` to this router's error handlers, in order.
    fn recover(&self, router: &Router, ctx: &mut RequestContext, mut err: HttpError) -> Outcome {
        ctx.set_phase(Phase::RunningErrorChain);

        for handler in &router.error_handlers {
            ctx.set_error(err.clone());
            let attempt = std::panic::catch_unwind(AssertUnwindSafe(|| handler.handle(&err, ctx)));
            match attempt {
                Ok(Ok(res)) => return Outcome::Responded(res),
                Ok(Err(next)) => err = next,
                Err(payload) => {
                    let message = panic_message(payload.as_ref());
                    tracing::error!(path = %ctx.path(), "error handler panicked: {message}");
                    err = HttpError::internal(message);
                }
            }
        }

        ctx.set_error(err.clone());
        Outcome::Raised(err)
    }
}

fn method_matches(route: &Method, request: &Method) -> bool {
    route == request || (route == Method::GET && request == Method::HEAD)
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "handler panicked".to_string()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;
    use crate::handler::{error_handler_fn, handler_fn, Chain};

    fn request(method: Method, uri: &str) -> http::Request<Bytes> {
        http::Request::builder()
            .method(method)
            .uri(uri)
            .body(Bytes::new())
            .unwrap()
    }

    fn body_json(res: &Response) -> serde_json::Value {
        serde_json::from_slice(res.body()).unwrap()
    }

    /// Records the order in which handlers ran.
    #[derive(Clone, Default)]
    struct Trace(Arc<Mutex<Vec<&'static str>>>);

    impl Trace {
        fn step(&self, name: &'static str) -> impl Fn(&mut RequestContext) -> HandlerResult + use<> {
            let log = self.0.clone();
            move |_ctx: &mut RequestContext| {
                log.lock().unwrap().push(name);
                Ok(Flow::Next)
            }
        }

        fn respond(&self, name: &'static str) -> impl Fn(&mut RequestContext) -> HandlerResult + use<> {
            let log = self.0.clone();
            move |_ctx: &mut RequestContext| {
                log.lock().unwrap().push(name);
                Ok(Flow::Respond(reply::text(StatusCode::OK, name)))
            }
        }

        fn steps(&self) -> Vec<&'static str> {
            self.0.lock().unwrap().clone()
        }
    }

    #[tokio::test]
    async fn runs_middleware_then_route_chain_in_order() {
        let trace = Trace::default();
        let mut root = Router::new();
        root.use_middleware(trace.step("global"));
        root.route(
            Method::GET,
            "/profile",
            Chain::of(trace.step("auth")).then(trace.respond("profile")),
        )
        .unwrap();

        let res = Pipeline::new(root).dispatch(request(Method::GET, "/profile")).await;
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(trace.steps(), vec!["global", "auth", "profile"]);
    }

    #[tokio::test]
    async fn unmatched_path_is_not_found_without_route_handlers() {
        let trace = Trace::default();
        let mut root = Router::new();
        root.use_middleware(trace.step("global"));
        root.get("/movies", trace.respond("movies")).unwrap();

        let res = Pipeline::new(root).dispatch(request(Method::GET, "/nope")).await;
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
        assert_eq!(res.body().as_ref(), b"Cannot GET /nope");
        assert_eq!(trace.steps(), vec!["global"]);
    }

    #[tokio::test]
    async fn not_found_status_is_configurable() {
        let pipeline = Pipeline::new(Router::new()).with_not_found_status(StatusCode::GONE);
        let res = pipeline.dispatch(request(Method::GET, "/")).await;
        assert_eq!(res.status(), StatusCode::GONE);
    }

    #[tokio::test]
    async fn method_must_match() {
        let trace = Trace::default();
        let mut root = Router::new();
        root.post("/movies", trace.respond("create")).unwrap();

        let res = Pipeline::new(root).dispatch(request(Method::GET, "/movies")).await;
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
        assert!(trace.steps().is_empty());
    }

    #[tokio::test]
    async fn first_registered_match_wins() {
        let trace = Trace::default();
        let mut root = Router::new();
        root.get("/movies/:id", trace.respond("param")).unwrap();
        root.get("/movies/new", trace.respond("literal")).unwrap();

        let res = Pipeline::new(root).dispatch(request(Method::GET, "/movies/new")).await;
        assert_eq!(res.body().as_ref(), b"param");
    }

    #[tokio::test]
    async fn params_are_visible_to_first_route_handler() {
        let mut root = Router::new();
        root.get(
            "/movies/:id",
            handler_fn(|ctx| {
                let id = ctx.param("id").unwrap_or_default().to_string();
                Ok(Flow::Respond(reply::text(StatusCode::OK, id)))
            }),
        )
        .unwrap();

        let res = Pipeline::new(root).dispatch(request(Method::GET, "/movies/103")).await;
        assert_eq!(res.body().as_ref(), b"103");
    }

    #[tokio::test]
    async fn raised_error_skips_remaining_handlers() {
        let trace = Trace::default();
        let mut root = Router::new();
        root.route(
            Method::GET,
            "/example",
            Chain::of(handler_fn(|_ctx| {
                Err(HttpError::with_status(StatusCode::SERVICE_UNAVAILABLE, "Data not available"))
            }))
            .then(trace.respond("unreachable")),
        )
        .unwrap();

        let res = Pipeline::new(root).dispatch(request(Method::GET, "/example")).await;
        assert_eq!(res.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body_json(&res)["message"], "Data not available");
        assert!(trace.steps().is_empty());
    }

    #[tokio::test]
    async fn unspecified_status_defaults_to_500() {
        let mut root = Router::new();
        root.get("/", handler_fn(|_ctx| Err(HttpError::new("Async error occurred!"))))
            .unwrap();

        let res = Pipeline::new(root).dispatch(request(Method::GET, "/")).await;
        assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body_json(&res)["message"], "Async error occurred!");
    }

    #[tokio::test]
    async fn nearest_error_handler_wins() {
        let mut movies = Router::new();
        movies
            .get("/:id", handler_fn(|_ctx| Err(HttpError::not_found("Not found the movie"))))
            .unwrap();
        movies.catch(error_handler_fn(|err, _ctx| {
            Ok(reply::message(err.status(), format!("movies: {}", err.message())))
        }));

        let mut root = Router::new();
        root.mount("/movies", movies).unwrap();
        root.catch(error_handler_fn(|_err, _ctx| {
            Ok(reply::message(StatusCode::IM_A_TEAPOT, "root"))
        }));

        let res = Pipeline::new(root).dispatch(request(Method::GET, "/movies/99")).await;
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_json(&res)["message"], "movies: Not found the movie");
    }

    #[tokio::test]
    async fn error_handler_can_pass_outward() {
        let mut inner = Router::new();
        inner
            .get("/", handler_fn(|_ctx| Err(HttpError::bad_request("bad"))))
            .unwrap();
        inner.catch(error_handler_fn(|err, _ctx| {
            Err(HttpError::with_status(err.status(), format!("wrapped {}", err.message())))
        }));

        let seen = Arc::new(Mutex::new(None));
        let mut root = Router::new();
        root.mount("/inner", inner).unwrap();
        let seen_in_handler = seen.clone();
        root.catch(error_handler_fn(move |err, ctx| {
            *seen_in_handler.lock().unwrap() = ctx.error().map(|e| e.message().to_string());
            Ok(reply::message(err.status(), err.message()))
        }));

        let res = Pipeline::new(root).dispatch(request(Method::GET, "/inner")).await;
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(&res)["message"], "wrapped bad");
        assert_eq!(seen.lock().unwrap().as_deref(), Some("wrapped bad"));
    }

    #[tokio::test]
    async fn panics_become_500_and_reach_error_chain() {
        let mut root = Router::new();
        root.get(
            "/panic",
            handler_fn(|_ctx| -> HandlerResult { panic!("Synchronous error occurred!") }),
        )
        .unwrap();
        root.catch(error_handler_fn(|err, _ctx| {
            Ok(reply::message(err.status(), format!("caught: {}", err.message())))
        }));

        let res = Pipeline::new(root).dispatch(request(Method::GET, "/panic")).await;
        assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body_json(&res)["message"], "caught: Synchronous error occurred!");
    }

    #[tokio::test]
    async fn panicking_error_handler_falls_back_to_default() {
        let mut root = Router::new();
        root.get("/", handler_fn(|_ctx| Err(HttpError::bad_request("bad"))))
            .unwrap();
        root.catch(error_handler_fn(|_err, _ctx| -> Result<Response, HttpError> {
            panic!("error handler blew up")
        }));

        let res = Pipeline::new(root).dispatch(request(Method::GET, "/")).await;
        assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body_json(&res)["message"], "error handler blew up");
    }

    #[tokio::test]
    async fn chain_without_response_is_a_logic_fault() {
        let trace = Trace::default();
        let mut root = Router::new();
        root.get("/silent", trace.step("silent")).unwrap();

        let res = Pipeline::new(root).dispatch(request(Method::GET, "/silent")).await;
        assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(
            body_json(&res)["message"]
                .as_str()
                .unwrap()
                .contains("completed without a response")
        );
    }

    #[tokio::test]
    async fn mounted_router_sees_remainder_and_base_path() {
        let mut movies = Router::new();
        movies
            .get(
                "/:id",
                handler_fn(|ctx| {
                    let body = format!("{}|{}|{}", ctx.base_path(), ctx.route_path(), ctx.path());
                    Ok(Flow::Respond(reply::text(StatusCode::OK, body)))
                }),
            )
            .unwrap();

        let mut root = Router::new();
        root.mount("/movies", movies).unwrap();

        let res = Pipeline::new(root).dispatch(request(Method::GET, "/movies/101")).await;
        assert_eq!(res.body().as_ref(), b"/movies|/101|/movies/101");
    }

    #[tokio::test]
    async fn unmatched_mount_falls_through_to_later_entries() {
        let trace = Trace::default();
        let mut movies = Router::new();
        movies.use_middleware(trace.step("movies-mw"));
        movies.get("/", trace.respond("movie-list")).unwrap();

        let mut root = Router::new();
        root.mount("/movies", movies).unwrap();
        root.get("/movies/top", trace.respond("top")).unwrap();

        let res = Pipeline::new(root).dispatch(request(Method::GET, "/movies/top")).await;
        assert_eq!(res.body().as_ref(), b"top");
        assert_eq!(trace.steps(), vec!["movies-mw", "top"]);
    }

    #[tokio::test]
    async fn path_scoped_middleware_only_runs_under_its_prefix() {
        let trace = Trace::default();
        let mut root = Router::new();
        root.use_at("/user/:id", trace.step("user-mw")).unwrap();
        root.get("/user/:id", trace.respond("user")).unwrap();
        root.get("/", trace.respond("home")).unwrap();

        let pipeline = Pipeline::new(root);
        pipeline.dispatch(request(Method::GET, "/")).await;
        pipeline.dispatch(request(Method::GET, "/user/1")).await;
        assert_eq!(trace.steps(), vec!["home", "user-mw", "user"]);
    }

    #[tokio::test]
    async fn param_hooks_run_before_route_chain() {
        #[derive(Clone)]
        struct Loaded(String);

        let mut users = Router::new();
        users.param(
            "id",
            handler_fn(|ctx| {
                let id = ctx.param("id").unwrap_or_default().to_string();
                ctx.insert(Loaded(format!("user-{id}")));
                Ok(Flow::Next)
            }),
        );
        users
            .get(
                "/:id",
                handler_fn(|ctx| {
                    let loaded = ctx.get::<Loaded>().map(|l| l.0.clone()).unwrap_or_default();
                    Ok(Flow::Respond(reply::text(StatusCode::OK, loaded)))
                }),
            )
            .unwrap();
        users
            .get("/", handler_fn(|ctx| {
                let loaded = ctx.get::<Loaded>().is_some();
                Ok(Flow::Respond(reply::text(StatusCode::OK, loaded.to_string())))
            }))
            .unwrap();

        let mut root = Router::new();
        root.mount("/users", users).unwrap();
        let pipeline = Pipeline::new(root);

        let res = pipeline.dispatch(request(Method::GET, "/users/7")).await;
        assert_eq!(res.body().as_ref(), b"user-7");
        let res = pipeline.dispatch(request(Method::GET, "/users")).await;
        assert_eq!(res.body().as_ref(), b"false");
    }

    #[tokio::test]
    async fn head_matches_get_and_drops_body() {
        let mut root = Router::new();
        root.get("/", handler_fn(|_ctx| Ok(Flow::Respond(reply::text(StatusCode::OK, "Hello")))))
            .unwrap();

        let res = Pipeline::new(root).dispatch(request(Method::HEAD, "/")).await;
        assert_eq!(res.status(), StatusCode::OK);
        assert!(res.body().is_empty());
    }

    #[tokio::test]
    async fn explicit_head_route_beats_earlier_get() {
        let trace = Trace::default();
        let mut root = Router::new();
        root.get("/movies", trace.respond("get")).unwrap();
        root.route(Method::HEAD, "/movies", Chain::of(trace.respond("head")))
            .unwrap();
        let pipeline = Pipeline::new(root);

        pipeline.dispatch(request(Method::HEAD, "/movies")).await;
        pipeline.dispatch(request(Method::GET, "/movies")).await;
        assert_eq!(trace.steps(), vec!["head", "get"]);
    }

    #[tokio::test]
    async fn handler_after_response_sent_is_rejected() {
        let pipeline = Pipeline::new(Router::new());
        let mut ctx = RequestContext::new(request(Method::GET, "/"));
        ctx.set_phase(Phase::ResponseSent);

        let trace = Trace::default();
        let handler = trace.respond("late");
        let result = pipeline.invoke(&handler, &mut ctx).await;
        assert!(result.is_err());
        assert!(trace.steps().is_empty());
    }

    #[tokio::test]
    async fn concurrent_dispatches_do_not_share_context() {
        #[derive(Clone)]
        struct Seen(String);

        let mut root = Router::new();
        root.use_middleware(handler_fn(|ctx| {
            let path = ctx.path().to_string();
            ctx.insert(Seen(path));
            Ok(Flow::Next)
        }));
        root.get(
            "/:n",
            handler_fn(|ctx| {
                let seen = ctx.get::<Seen>().map(|s| s.0.clone()).unwrap_or_default();
                Ok(Flow::Respond(reply::text(StatusCode::OK, seen)))
            }),
        )
        .unwrap();

        let pipeline = Arc::new(Pipeline::new(root));
        let mut tasks = Vec::new();
        for n in 0..16 {
            let pipeline = pipeline.clone();
            tasks.push(tokio::spawn(async move {
                let res = pipeline.dispatch(request(Method::GET, &format!("/{n}"))).await;
                (n, res)
            }));
        }
        for task in tasks {
            let (n, res) = task.await.unwrap();
            assert_eq!(res.body().as_ref(), format!("/{n}").as_bytes());
        }
    }
}
