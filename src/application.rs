//! The application: routes, named middleware services, and the per-request
//! dispatch cycle.

use std::collections::HashMap;
use std::sync::Arc;

use http::StatusCode;
use tracing::debug;

use crate::controller::{Dispatchable, MiddlewareController};
use crate::error::Error;
use crate::event::AppEvent;
use crate::events::{EventManager, SharedEventManager};
use crate::middleware::MiddlewarePipe;
use crate::request::Request;
use crate::response::Response;
use crate::router::Router;

/// Routes plus the middleware services they dispatch.
///
/// ```rust
/// use viaduct::{Application, Method, MiddlewarePipe, Route, Router};
///
/// let app = Application::new(
///     Router::new().on(Method::GET, "/middleware", Route::middleware("Reporting")),
/// )
/// .service("Reporting", MiddlewarePipe::new());
/// ```
///
/// [`handle`](Application::handle) runs one complete request cycle; the
/// [`Server`](crate::Server) calls it per incoming request, and tests call
/// it directly with synthetic requests.
pub struct Application {
    router: Router,
    services: HashMap<String, Arc<MiddlewarePipe>>,
    shared_events: Arc<SharedEventManager>,
}

impl Application {
    pub fn new(router: Router) -> Self {
        Self {
            router,
            services: HashMap::new(),
            shared_events: Arc::new(SharedEventManager::new()),
        }
    }

    /// Registers a middleware pipe under a service name routes refer to.
    /// Returns `self` for chaining.
    pub fn service(mut self, name: impl Into<String>, pipe: MiddlewarePipe) -> Self {
        self.services.insert(name.into(), Arc::new(pipe));
        self
    }

    /// The process-wide listener registry. Attach here — keyed by controller
    /// identifier — to observe dispatch events across every request cycle.
    pub fn shared_events(&self) -> Arc<SharedEventManager> {
        Arc::clone(&self.shared_events)
    }

    /// Runs one full dispatch cycle: route lookup, service resolution,
    /// controller construction, dispatch.
    ///
    /// A route miss is an application-level outcome (`404`), not an error.
    /// A route naming an unregistered service is
    /// [`Error::UnknownService`] — a configuration mistake, surfaced to the
    /// caller rather than masked.
    pub fn handle(&self, mut request: Request) -> Result<Response, Error> {
        let Some((route, params)) = self.router.lookup(request.method(), request.path()) else {
            return Ok(Response::status(StatusCode::NOT_FOUND));
        };
        request.set_params(params);

        let pipe = self
            .services
            .get(route.service())
            .cloned()
            .ok_or_else(|| Error::UnknownService(route.service().to_owned()))?;

        debug!(path = %request.path(), service = %route.service(), "dispatching middleware pipeline");

        // One controller, event manager, and event per cycle; all are
        // dropped when the response goes back up the stack.
        let events = EventManager::with_shared(Arc::clone(&self.shared_events));
        let mut controller =
            MiddlewareController::new(pipe, Response::default(), events, AppEvent::new());
        controller.dispatch(&request, Response::default())
    }
}
