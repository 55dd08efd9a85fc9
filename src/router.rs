//! Radix-tree request router.
//!
//! One tree per HTTP method, O(path-length) lookup. [`Router::dispatch`] is
//! the single entry point for a request: the server calls it per connection
//! request, and tests call it directly without a socket.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use matchit::Router as MatchitRouter;
use tracing::info;

use crate::handler::{BoxedHandler, Handler};
use crate::method::Method;
use crate::request::Request;
use crate::response::Response;
use crate::status::Status;

/// The application router.
///
/// Build it once at startup; pass it to [`Server::serve`](crate::Server::serve).
/// Each registration returns `self` so calls chain naturally.
pub struct Router {
    routes: HashMap<Method, MatchitRouter<BoxedHandler>>,
    fallback: Option<BoxedHandler>,
}

impl Router {
    pub fn new() -> Self {
        Self { routes: HashMap::new(), fallback: None }
    }

    /// Register a handler for a method + path pair. Returns `self` for chaining.
    ///
    /// Path parameters use `{name}` syntax and `req.param("name")` retrieves
    /// them. Static segments win over parameters, so `/post/create/` and
    /// `/post/{slug}/` coexist.
    ///
    /// # Panics
    ///
    /// Panics if `path` conflicts with an already registered route. Routes
    /// are fixed at startup, so this is a programming error.
    pub fn on(mut self, method: Method, path: &str, handler: impl Handler) -> Self {
        self.routes
            .entry(method)
            .or_default()
            .insert(path, handler.into_boxed_handler())
            .unwrap_or_else(|e| panic!("invalid route `{path}`: {e}"));
        self
    }

    pub fn get(self, path: &str, handler: impl Handler) -> Self {
        self.on(Method::Get, path, handler)
    }

    pub fn post(self, path: &str, handler: impl Handler) -> Self {
        self.on(Method::Post, path, handler)
    }

    /// Handler for requests no route matches. Defaults to a bare `404`.
    pub fn fallback(mut self, handler: impl Handler) -> Self {
        self.fallback = Some(handler.into_boxed_handler());
        self
    }

    /// Routes one request and produces one response.
    ///
    /// A path registered under a different method answers `405`; a path
    /// registered nowhere goes to the fallback.
    pub async fn dispatch(&self, req: Request) -> Response {
        let started = Instant::now();
        let method = req.method();
        let path = req.path().to_owned();

        let response = match self.lookup(method, &path) {
            Some((handler, params)) => handler.call(req.with_params(params)).await,
            None if self.matches_other_method(method, &path) => {
                Response::status(Status::MethodNotAllowed)
            }
            None => match &self.fallback {
                Some(fallback) => fallback.call(req).await,
                None => Response::status(Status::NotFound),
            },
        };

        info!(
            method = %method,
            path = %path,
            status = response.status_code().code(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "request",
        );
        response
    }

    fn lookup(
        &self,
        method: Method,
        path: &str,
    ) -> Option<(BoxedHandler, HashMap<String, String>)> {
        let tree = self.routes.get(&method)?;
        let matched = tree.at(path).ok()?;
        let handler = Arc::clone(matched.value);
        // Path segments arrive percent-encoded; non-ASCII slugs need decoding.
        let params = matched.params.iter()
            .map(|(k, v)| {
                let value = urlencoding::decode(v).map_or_else(|_| v.to_owned(), |d| d.into_owned());
                (k.to_owned(), value)
            })
            .collect();
        Some((handler, params))
    }

    fn matches_other_method(&self, method: Method, path: &str) -> bool {
        self.routes.iter()
            .any(|(m, tree)| *m != method && tree.at(path).is_ok())
    }
}

impl Default for Router {
    fn default() -> Self { Self::new() }
}
