//! Radix-tree request router.
//!
//! One tree per HTTP method, O(path-length) lookup. A route does not carry a
//! handler — it names the middleware service the dispatch cycle should run.
//! Resolving the name to a pipe is the application's job.

use std::collections::HashMap;

use http::Method;
use matchit::Router as MatchitRouter;

/// What a matched route resolves to.
#[derive(Clone, Debug)]
pub struct Route {
    middleware: String,
}

impl Route {
    /// A route dispatching the middleware service registered as `service`.
    pub fn middleware(service: impl Into<String>) -> Self {
        Self { middleware: service.into() }
    }

    /// Name of the middleware service this route dispatches.
    pub fn service(&self) -> &str {
        &self.middleware
    }
}

/// The application router.
///
/// Build it once at startup; pass it to [`Application::new`]. Each
/// [`Router::on`] call returns `self` so registrations chain naturally.
///
/// Path parameters use `{name}` syntax and surface through
/// [`Request::param`](crate::Request::param):
///
/// ```rust
/// use viaduct::{Method, Route, Router};
///
/// Router::new()
///     .on(Method::GET, "/middleware", Route::middleware("Reporting"))
///     .on(Method::POST, "/jobs/{id}", Route::middleware("Jobs"));
/// ```
///
/// [`Application::new`]: crate::Application::new
pub struct Router {
    routes: HashMap<Method, MatchitRouter<Route>>,
}

impl Router {
    pub fn new() -> Self {
        Self { routes: HashMap::new() }
    }

    /// Registers a route for a method + path pair. Returns `self` for
    /// chaining.
    ///
    /// # Panics
    ///
    /// Panics if `path` is not a valid route pattern — a startup
    /// configuration error.
    pub fn on(mut self, method: Method, path: &str, route: Route) -> Self {
        self.routes
            .entry(method)
            .or_default()
            .insert(path, route)
            .unwrap_or_else(|e| panic!("invalid route `{path}`: {e}"));
        self
    }

    pub(crate) fn lookup(
        &self,
        method: &Method,
        path: &str,
    ) -> Option<(Route, HashMap<String, String>)> {
        let tree = self.routes.get(method)?;
        let matched = tree.at(path).ok()?;
        let params = matched
            .params
            .iter()
            .map(|(k, v)| (k.to_owned(), v.to_owned()))
            .collect();
        Some((matched.value.clone(), params))
    }
}

impl Default for Router {
    fn default() -> Self {
        Self::new()
    }
}
