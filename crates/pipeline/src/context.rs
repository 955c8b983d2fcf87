//! Per-request context threaded through every handler.

use std::collections::BTreeMap;

use bytes::Bytes;
use http::{Extensions, HeaderMap, Method, Uri};
use serde_json::Value;

use crate::error::HttpError;
use crate::path::Params;

/// Where a request is in its lifecycle.
///
/// `Received → MatchingRoute → RunningNormalChain ⇄ RunningErrorChain → ResponseSent`
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Phase {
    Received,
    MatchingRoute,
    RunningNormalChain,
    RunningErrorChain,
    ResponseSent,
}

/// Mutable state owned by exactly one request.
///
/// Created when the request enters the pipeline and dropped once the response
/// is produced. Never shared between requests.
#[derive(Debug)]
pub struct RequestContext {
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    raw_body: Bytes,
    base_path: String,
    route_path: String,
    params: Params,
    query: BTreeMap<String, String>,
    body: Option<Value>,
    extensions: Extensions,
    error: Option<HttpError>,
    phase: Phase,
}

impl RequestContext {
    pub fn new(request: http::Request<Bytes>) -> Self {
        let (parts, raw_body) = request.into_parts();
        let query = parse_query(parts.uri.query());
        let route_path = parts.uri.path().to_string();

        Self {
            method: parts.method,
            uri: parts.uri,
            headers: parts.headers,
            raw_body,
            base_path: String::new(),
            route_path,
            params: Params::new(),
            query,
            body: None,
            extensions: parts.extensions,
            error: None,
            phase: Phase::Received,
        }
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn uri(&self) -> &Uri {
        &self.uri
    }

    /// Full request path, independent of router mounting.
    pub fn path(&self) -> &str {
        self.uri.path()
    }

    /// Prefix consumed by the mounted routers the request is currently inside.
    pub fn base_path(&self) -> &str {
        &self.base_path
    }

    /// Path relative to the router currently running.
    pub fn route_path(&self) -> &str {
        &self.route_path
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Header value as a string, if present and valid UTF-8.
    pub fn header(&self, name: impl http::header::AsHeaderName) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    pub fn raw_body(&self) -> &Bytes {
        &self.raw_body
    }

    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(String::as_str)
    }

    pub fn params(&self) -> &Params {
        &self.params
    }

    pub fn query(&self) -> &BTreeMap<String, String> {
        &self.query
    }

    pub fn query_param(&self, name: &str) -> Option<&str> {
        self.query.get(name).map(String::as_str)
    }

    /// Parsed body; `None` unless a body-parsing stage ran.
    pub fn body(&self) -> Option<&Value> {
        self.body.as_ref()
    }

    pub fn set_body(&mut self, body: Value) {
        self.body = Some(body);
    }

    /// Attach a typed field for later handlers (identity, timestamps, ...).
    pub fn insert<T: Clone + Send + Sync + 'static>(&mut self, value: T) -> Option<T> {
        self.extensions.insert(value)
    }

    pub fn get<T: Send + Sync + 'static>(&self) -> Option<&T> {
        self.extensions.get::<T>()
    }

    pub fn extensions(&self) -> &Extensions {
        &self.extensions
    }

    /// The error currently being handled, once a stage has raised.
    pub fn error(&self) -> Option<&HttpError> {
        self.error.as_ref()
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub(crate) fn set_phase(&mut self, phase: Phase) {
        if self.phase == Phase::ResponseSent {
            tracing::error!(
                from = ?self.phase,
                to = ?phase,
                path = %self.uri.path(),
                "phase change after response was sent"
            );
            return;
        }
        tracing::trace!(from = ?self.phase, to = ?phase, "request phase");
        self.phase = phase;
    }

    pub(crate) fn set_error(&mut self, error: HttpError) {
        self.error = Some(error);
    }

    pub(crate) fn params_mut(&mut self) -> &mut Params {
        &mut self.params
    }

    pub(crate) fn replace_params(&mut self, params: Params) -> Params {
        std::mem::replace(&mut self.params, params)
    }

    /// Enter a mounted router: `matched` joins the base path, `remainder`
    /// becomes the route path. Returns the previous `(base, route)` pair.
    pub(crate) fn enter_mount(&mut self, matched: &str, remainder: String) -> (String, String) {
        let base = if matched == "/" {
            self.base_path.clone()
        } else {
            format!("{}{}", self.base_path, matched)
        };
        let prev_base = std::mem::replace(&mut self.base_path, base);
        let prev_route = std::mem::replace(&mut self.route_path, remainder);
        (prev_base, prev_route)
    }

    pub(crate) fn leave_mount(&mut self, previous: (String, String)) {
        self.base_path = previous.0;
        self.route_path = previous.1;
    }
}

fn parse_query(query: Option<&str>) -> BTreeMap<String, String> {
    let Some(query) = query else {
        return BTreeMap::new();
    };
    match serde_urlencoded::from_str::<Vec<(String, String)>>(query) {
        Ok(pairs) => pairs.into_iter().collect(),
        Err(e) => {
            tracing::debug!("ignoring malformed query string: {e}");
            BTreeMap::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx(uri: &str) -> RequestContext {
        let req = http::Request::builder()
            .method(Method::GET)
            .uri(uri)
            .header("authorization", "Bearer abc")
            .body(Bytes::new())
            .unwrap();
        RequestContext::new(req)
    }

    #[test]
    fn starts_received_with_no_body_or_error() {
        let c = ctx("/movies");
        assert_eq!(c.phase(), Phase::Received);
        assert!(c.body().is_none());
        assert!(c.error().is_none());
        assert_eq!(c.route_path(), "/movies");
        assert_eq!(c.base_path(), "");
    }

    #[test]
    fn parses_query_string() {
        let c = ctx("/users?name=Kyle&x=1");
        assert_eq!(c.query_param("name"), Some("Kyle"));
        assert_eq!(c.query().len(), 2);
    }

    #[test]
    fn header_lookup_is_case_insensitive() {
        let c = ctx("/");
        assert_eq!(c.header("Authorization"), Some("Bearer abc"));
    }

    #[test]
    fn typed_fields_round_trip() {
        #[derive(Clone, Debug, PartialEq)]
        struct Stamp(i64);

        let mut c = ctx("/");
        assert!(c.get::<Stamp>().is_none());
        c.insert(Stamp(42));
        assert_eq!(c.get::<Stamp>(), Some(&Stamp(42)));
    }

    #[test]
    fn mount_bookkeeping_restores_paths() {
        let mut c = ctx("/movies/101");
        let prev = c.enter_mount("/movies", "/101".to_string());
        assert_eq!(c.base_path(), "/movies");
        assert_eq!(c.route_path(), "/101");
        c.leave_mount(prev);
        assert_eq!(c.base_path(), "");
        assert_eq!(c.route_path(), "/movies/101");
    }

    #[test]
    fn sent_phase_is_terminal() {
        let mut c = ctx("/");
        c.set_phase(Phase::ResponseSent);
        c.set_phase(Phase::RunningNormalChain);
        assert_eq!(c.phase(), Phase::ResponseSent);
    }
}
