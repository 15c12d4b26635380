//! Request routing — map URL patterns and HTTP methods to handler functions.
//!
//! This module provides [`Router`], which dispatches incoming HTTP requests to handler
//! functions based on the request method and URL path. Two pattern styles are supported:
//!
//! | Pattern                | Example match   | Captured params |
//! |------------------------|-----------------|-----------------|
//! | `/students`            | `/students`     | *(none)*        |
//! | `/students/:id`        | `/students/ann` | `id → "ann"`    |
//! | `/students/:id(\d+)`   | `/students/42`  | `id → "42"`     |
//!
//! Paths are matched exactly: `/students/` does not match `/students`, and a
//! `(\d+)` parameter only matches a non-empty run of ASCII digits.
//!
//! Routes are matched in registration order; the first route whose method and pattern both
//! match the incoming request wins. Unmatched requests go to the fallback handler.

use std::pin::Pin;
use std::sync::Arc;

use crate::context::{Context, PathParams};
use crate::middleware::{Middleware, MiddlewareHandler, Next, from_middleware};
use crate::{Method, Request, Response, StatusCode};

/// Type-erased, heap-allocated async handler that processes a [`Context`] and returns a
/// [`Response`].
///
/// Handlers are stored behind `Arc<dyn Fn(…)>` so they can be cloned and shared across
/// tasks without copying the underlying closure. In practice you never construct this
/// type directly — use [`Router::get`], [`Router::post`], and the other method-specific
/// helpers instead.
pub type Handler =
    Arc<dyn Fn(Context) -> Pin<Box<dyn Future<Output = Response> + Send>> + Send + Sync + 'static>;

/// Conversion trait for async handler functions.
///
/// Any `Fn(Context) -> impl Future<Output = Response> + Send` that is also
/// `Send + Sync + 'static` implements this trait automatically via the blanket impl
/// below.
pub trait IntoHandler: Send + Sync + 'static {
    /// Call the handler with the given context, boxing the returned future.
    fn call(&self, ctx: Context) -> Pin<Box<dyn Future<Output = Response> + Send>>;
}

impl<T, F> IntoHandler for T
where
    T: Fn(Context) -> F + Send + Sync + 'static,
    F: Future<Output = Response> + Send + 'static,
{
    fn call(&self, ctx: Context) -> Pin<Box<dyn Future<Output = Response> + Send>> {
        Box::pin((self)(ctx))
    }
}

fn into_handler(handler: impl IntoHandler) -> Handler {
    Arc::new(move |ctx| handler.call(ctx))
}

// A single path segment: a literal, or a named capture (`:name`) optionally
// restricted to ASCII digits (`:name(\d+)`).
#[derive(Debug, Clone)]
enum Segment {
    Static(String),
    Parameter { name: String, digits_only: bool },
}

impl Segment {
    fn parse(raw: &str) -> Self {
        match raw.strip_prefix(':') {
            Some(capture) => match capture.strip_suffix(r"(\d+)") {
                Some(name) => Segment::Parameter {
                    name: name.to_string(),
                    digits_only: true,
                },
                None => Segment::Parameter {
                    name: capture.to_string(),
                    digits_only: false,
                },
            },
            None => Segment::Static(raw.to_string()),
        }
    }
}

// Compiled representation of a route pattern string.
#[derive(Debug, Clone)]
enum Pattern {
    // Matches one exact path string, e.g. `/students`.
    Exact(String),
    // Matches a fixed number of segments where some may be named captures, e.g. `/students/:id`.
    Parameterized { segments: Vec<Segment> },
}

impl Pattern {
    /// Parse a route pattern string into a `Pattern`.
    ///
    /// A pattern containing `:` compiles to [`Pattern::Parameterized`]; anything
    /// else is an exact literal.
    fn parse(pattern: &str) -> Self {
        if pattern.contains(':') {
            let segments = pattern
                .trim_start_matches('/')
                .split('/')
                .map(Segment::parse)
                .collect();
            return Pattern::Parameterized { segments };
        }

        Pattern::Exact(pattern.to_string())
    }

    // Try to match `path` against this pattern, returning extracted [`PathParams`] on success.
    fn matches(&self, path: &str) -> Option<PathParams> {
        match self {
            Pattern::Exact(p) => (p == path).then(PathParams::new),
            Pattern::Parameterized { segments } => {
                let path_segments: Vec<&str> = path.strip_prefix('/')?.split('/').collect();
                if segments.len() != path_segments.len() {
                    return None;
                }

                let mut params = PathParams::new();
                for (seg, path_seg) in segments.iter().zip(path_segments) {
                    match seg {
                        Segment::Static(s) => {
                            if s != path_seg {
                                return None;
                            }
                        }
                        Segment::Parameter { name, digits_only } => {
                            if path_seg.is_empty() {
                                return None;
                            }
                            if *digits_only && !path_seg.bytes().all(|b| b.is_ascii_digit()) {
                                return None;
                            }
                            params.insert(name.clone(), path_seg.to_string());
                        }
                    }
                }

                Some(params)
            }
        }
    }
}

// A single registered route binding a method + pattern to a handler.
struct Route {
    method: Method,
    pattern: Pattern,
    handler: Handler,
}

impl Route {
    fn new(method: Method, pattern: &str, handler: Handler) -> Self {
        Self {
            method,
            pattern: Pattern::parse(pattern),
            handler,
        }
    }

    // Returns `Some(params)` when both the HTTP method and path pattern match, `None` otherwise.
    fn matches(&self, method: &Method, path: &str) -> Option<PathParams> {
        if &self.method == method {
            self.pattern.matches(path)
        } else {
            None
        }
    }
}

/// HTTP request router that dispatches requests to registered handler functions.
///
/// Routes are evaluated in registration order; the first route whose HTTP method and path
/// pattern both match the incoming request is used. When no route matches, the fallback
/// handler runs (a bare `404 Not Found` unless replaced with [`Router::fallback`]).
/// Middleware registered with [`Router::layer`] wraps both.
///
/// # Examples
///
/// ```rust,no_run
/// use roster::{Router, Response, StatusCode};
/// use roster::context::Context;
///
/// let mut router = Router::new();
///
/// router.get("/ping", |_ctx| async { Response::new(StatusCode::Ok) });
///
/// router.get(r"/students/:id(\d+)", |ctx: Context| async move {
///     let id = ctx.params().get("id").unwrap_or("unknown").to_owned();
///     Response::new(StatusCode::Ok).body(id)
/// });
/// ```
pub struct Router {
    routes: Vec<Route>,
    middlewares: Arc<[MiddlewareHandler]>,
    fallback: Handler,
}

impl Default for Router {
    fn default() -> Self {
        Self::new()
    }
}

impl Router {
    /// Create a new, empty `Router` with no registered routes.
    pub fn new() -> Self {
        Self {
            routes: Vec::new(),
            middlewares: Arc::from(Vec::<MiddlewareHandler>::new()),
            fallback: into_handler(|_ctx: Context| async { Response::new(StatusCode::NotFound) }),
        }
    }

    /// Register a handler for `GET` requests matching `path`.
    pub fn get(&mut self, path: &str, handler: impl IntoHandler) {
        self.add_route(Method::Get, path, handler);
    }

    /// Register a handler for `POST` requests matching `path`.
    pub fn post(&mut self, path: &str, handler: impl IntoHandler) {
        self.add_route(Method::Post, path, handler);
    }

    /// Register a handler for `PUT` requests matching `path`.
    pub fn put(&mut self, path: &str, handler: impl IntoHandler) {
        self.add_route(Method::Put, path, handler);
    }

    /// Register a handler for `PATCH` requests matching `path`.
    pub fn patch(&mut self, path: &str, handler: impl IntoHandler) {
        self.add_route(Method::Patch, path, handler);
    }

    /// Register a handler for `DELETE` requests matching `path`.
    pub fn delete(&mut self, path: &str, handler: impl IntoHandler) {
        self.add_route(Method::Delete, path, handler);
    }

    /// Replace the handler that answers requests no route matches.
    pub fn fallback(&mut self, handler: impl IntoHandler) {
        self.fallback = into_handler(handler);
    }

    /// Append a middleware to the stack. Middleware runs in registration order,
    /// outermost first, around every request including fallback ones.
    pub fn layer<M>(&mut self, middleware: M)
    where
        M: Middleware + 'static,
    {
        self.middlewares = self
            .middlewares
            .iter()
            .cloned()
            .chain(std::iter::once(from_middleware(Arc::new(middleware))))
            .collect();
    }

    fn add_route(&mut self, method: Method, path: &str, handler: impl IntoHandler) {
        self.routes
            .push(Route::new(method, path, into_handler(handler)));
    }

    /// Dispatch `request` through the middleware stack to the first matching
    /// route, or to the fallback handler.
    pub async fn route(&self, request: Request) -> Response {
        let matched = self.routes.iter().find_map(|route| {
            route
                .matches(request.method(), request.path())
                .map(|params| (route.handler.clone(), params))
        });

        let (endpoint, params) =
            matched.unwrap_or_else(|| (self.fallback.clone(), PathParams::new()));

        let ctx = Context::with_params(request, params);
        Next::new(self.middlewares.clone(), endpoint).run(ctx).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::middleware::LoggerMiddleware;

    fn make_request(method: &str, path: &str) -> Request {
        let raw = format!("{method} {path} HTTP/1.1\r\nHost: localhost\r\n\r\n");
        let (req, _) = Request::parse(raw.as_bytes()).unwrap();
        req
    }

    // ── Pattern::parse ────────────────────────────────────────────────────────

    #[test]
    fn pattern_parse_exact() {
        assert!(matches!(Pattern::parse("/health"), Pattern::Exact(s) if s == "/health"));
    }

    #[test]
    fn pattern_parse_parameterized() {
        match Pattern::parse("/students/:id") {
            Pattern::Parameterized { segments } => {
                assert_eq!(segments.len(), 2);
                assert!(matches!(&segments[0], Segment::Static(s) if s == "students"));
                assert!(matches!(
                    &segments[1],
                    Segment::Parameter { name, digits_only: false } if name == "id"
                ));
            }
            other => panic!("expected Parameterized, got {other:?}"),
        }
    }

    #[test]
    fn pattern_parse_digits_constraint() {
        match Pattern::parse(r"/students/:id(\d+)") {
            Pattern::Parameterized { segments } => {
                assert!(matches!(
                    &segments[1],
                    Segment::Parameter { name, digits_only: true } if name == "id"
                ));
            }
            other => panic!("expected Parameterized, got {other:?}"),
        }
    }

    // ── Pattern::matches ──────────────────────────────────────────────────────

    #[test]
    fn exact_match_is_literal() {
        let pat = Pattern::parse("/students");
        assert!(pat.matches("/students").is_some());
        assert!(pat.matches("/students/").is_none());
        assert!(pat.matches("/student").is_none());
    }

    #[test]
    fn param_extracts_value() {
        let pat = Pattern::parse("/students/:id");
        let params = pat.matches("/students/ann").unwrap();
        assert_eq!(params.get("id"), Some("ann"));
    }

    #[test]
    fn param_wrong_segment_count() {
        let pat = Pattern::parse("/students/:id");
        assert!(pat.matches("/students").is_none());
        assert!(pat.matches("/students/").is_none());
        assert!(pat.matches("/students/4/extra").is_none());
        assert!(pat.matches("/students/4/").is_none());
    }

    #[test]
    fn param_wrong_static_segment() {
        let pat = Pattern::parse("/students/:id");
        assert!(pat.matches("/courses/42").is_none());
    }

    #[test]
    fn digits_param_rejects_non_digits() {
        let pat = Pattern::parse(r"/students/:id(\d+)");
        assert_eq!(pat.matches("/students/0042").unwrap().get("id"), Some("0042"));
        assert!(pat.matches("/students/abc").is_none());
        assert!(pat.matches("/students/-1").is_none());
        assert!(pat.matches("/students/1.5").is_none());
    }

    // ── Router ────────────────────────────────────────────────────────────────

    #[tokio::test]
    async fn router_empty_returns_404() {
        let router = Router::new();
        let res = router.route(make_request("GET", "/")).await;
        assert_eq!(res.status(), StatusCode::NotFound);
    }

    #[tokio::test]
    async fn router_method_must_match() {
        let mut router = Router::new();
        router.get("/hello", |_ctx| async { Response::new(StatusCode::Ok) });
        let res = router.route(make_request("POST", "/hello")).await;
        assert_eq!(res.status(), StatusCode::NotFound);
    }

    #[tokio::test]
    async fn router_first_matching_route_wins() {
        let mut router = Router::new();
        router.get("/path", |_ctx| async { Response::new(StatusCode::Ok) });
        router.get("/path", |_ctx| async {
            Response::new(StatusCode::Created)
        });
        let res = router.route(make_request("GET", "/path")).await;
        assert_eq!(res.status(), StatusCode::Ok);
    }

    #[tokio::test]
    async fn router_parameterized_route_receives_params() {
        let mut router = Router::new();
        router.get(r"/students/:id(\d+)", |ctx: Context| async move {
            let id = ctx.params().get("id").unwrap_or("").to_owned();
            Response::new(StatusCode::Ok).body(id)
        });
        let res = router.route(make_request("GET", "/students/42")).await;
        assert_eq!(res.status(), StatusCode::Ok);
        assert_eq!(res.body_ref(), b"42");
    }

    #[tokio::test]
    async fn router_custom_fallback() {
        let mut router = Router::new();
        router.fallback(|_ctx| async { Response::new(StatusCode::BadRequest) });
        let res = router.route(make_request("DELETE", "/nowhere")).await;
        assert_eq!(res.status(), StatusCode::BadRequest);
    }

    #[tokio::test]
    async fn router_method_variants_registered() {
        let mut router = Router::new();
        router.put("/r", |_ctx| async { Response::new(StatusCode::Ok) });
        router.patch("/r", |_ctx| async { Response::new(StatusCode::Ok) });
        router.delete("/r", |_ctx| async { Response::new(StatusCode::Ok) });
        router.post("/r", |_ctx| async { Response::new(StatusCode::Created) });
        for method in ["PUT", "PATCH", "DELETE"] {
            assert_eq!(
                router.route(make_request(method, "/r")).await.status(),
                StatusCode::Ok
            );
        }
        assert_eq!(
            router.route(make_request("POST", "/r")).await.status(),
            StatusCode::Created
        );
    }

    #[tokio::test]
    async fn router_layer_wraps_routes() {
        let mut router = Router::new();
        router.layer(LoggerMiddleware);
        router.get("/hello", |_ctx| async { Response::new(StatusCode::Ok) });
        let res = router.route(make_request("GET", "/hello")).await;
        assert_eq!(res.status(), StatusCode::Ok);
        let res = router.route(make_request("GET", "/missing")).await;
        assert_eq!(res.status(), StatusCode::NotFound);
    }
}
