//! The middleware-dispatching controller.
//!
//! [`MiddlewareController`] adapts a [`MiddlewarePipe`] into a framework
//! dispatch target: the dispatch lifecycle events wrap pipeline execution,
//! so listeners observe, short-circuit, or recover the cycle without the
//! pipe knowing they exist.

use std::sync::Arc;

use crate::error::{BoxError, Error};
use crate::event::AppEvent;
use crate::events::EventManager;
use crate::middleware::MiddlewarePipe;
use crate::request::DispatchRequest;
use crate::response::Response;

/// A target the framework's dispatch machinery can invoke.
pub trait Dispatchable {
    /// Processes one request to completion and produces the response.
    fn dispatch(
        &mut self,
        request: &dyn DispatchRequest,
        response: Response,
    ) -> Result<Response, Error>;
}

/// Controller that dispatches a middleware pipe through the event system.
///
/// Construction wires two things into the supplied [`EventManager`]:
///
/// - the controller's [current](MiddlewareController::IDENTIFIER) and
///   [deprecated](MiddlewareController::LEGACY_IDENTIFIER) identifiers, as
///   two explicit registrations, so shared listeners keyed on either name
///   fire;
/// - the pipeline invocation itself, as a `dispatch` listener at
///   [`EventManager::DEFAULT_PRIORITY`]. Attach above that priority to run
///   before the pipe, below it to run after.
///
/// A controller lives for one dispatch cycle: the application builds it with
/// a fresh event manager and event, calls [`dispatch`](Dispatchable::dispatch)
/// once, and discards it.
pub struct MiddlewareController {
    events: EventManager,
    event: AppEvent,
}

impl MiddlewareController {
    /// Identifier shared-event listeners target this controller by.
    pub const IDENTIFIER: &'static str = "viaduct::controller::MiddlewareController";

    /// Identifier from the 0.1 module layout. Deprecated, kept registered so
    /// listeners keyed on it keep firing.
    pub const LEGACY_IDENTIFIER: &'static str = "viaduct::dispatch::MiddlewareController";

    /// Builds the controller around `pipe`, using a clone of
    /// `response_prototype` as the base response on every pipe invocation.
    pub fn new(
        pipe: Arc<MiddlewarePipe>,
        response_prototype: Response,
        mut events: EventManager,
        event: AppEvent,
    ) -> Self {
        events.add_identifiers([Self::IDENTIFIER, Self::LEGACY_IDENTIFIER]);

        let pipe_listener = move |event: &mut AppEvent| -> crate::events::ListenerResult {
            let result = {
                let request = event.request().ok_or("dispatch event carries no request")?;
                pipe.process(request, response_prototype.clone())?
            };
            event.set_result(result.clone());
            Ok(Some(result))
        };
        events.attach(AppEvent::DISPATCH, pipe_listener, EventManager::DEFAULT_PRIORITY);

        Self { events, event }
    }

    pub fn events(&self) -> &EventManager {
        &self.events
    }

    /// Mutable access for attaching further listeners after construction.
    pub fn events_mut(&mut self) -> &mut EventManager {
        &mut self.events
    }

    /// The lifecycle event this controller mutates across dispatch calls.
    pub fn event(&self) -> &AppEvent {
        &self.event
    }

    /// Error branch: re-enters the event system under `dispatch.error`. The
    /// last listener to return a response overrides the outcome; otherwise
    /// the original failure propagates. A failing dispatch-error listener
    /// wins over the original failure.
    fn recover(&mut self, error: BoxError) -> Result<Response, Error> {
        self.event.set_name(AppEvent::DISPATCH_ERROR);
        self.event.set_error(error);

        let recovered = self.events.trigger(&mut self.event).map_err(Error::Pipeline)?;
        match recovered.last() {
            Some(substitute) => {
                let substitute = substitute.clone();
                self.event.set_result(substitute.clone());
                Ok(substitute)
            }
            None => {
                let original = self
                    .event
                    .take_error()
                    .unwrap_or_else(|| "middleware pipeline failed".into());
                Err(Error::Pipeline(original))
            }
        }
    }
}

impl Dispatchable for MiddlewareController {
    fn dispatch(
        &mut self,
        request: &dyn DispatchRequest,
        response: Response,
    ) -> Result<Response, Error> {
        // Wrong request type is a programming error upstream; refuse before
        // any event fires or the pipe runs.
        let Some(http) = request.as_http() else {
            return Err(Error::UnexpectedRequest { given: request.kind() });
        };

        self.event.set_name(AppEvent::DISPATCH);
        self.event.set_target(Self::IDENTIFIER);
        self.event.set_request(http.clone());
        self.event.set_response(response);

        // Stop at the first listener that produces a response — normally the
        // pipe itself at default priority, earlier when a higher-priority
        // listener short-circuits.
        let triggered = match self.events.trigger_until(&mut self.event, |_| true) {
            Ok(triggered) => triggered,
            Err(error) => return self.recover(error),
        };

        if triggered.stopped() {
            if let Some(short_circuit) = triggered.last() {
                let short_circuit = short_circuit.clone();
                self.event.set_result(short_circuit.clone());
                return Ok(short_circuit);
            }
        }
        self.event
            .result()
            .cloned()
            .ok_or_else(|| Error::Pipeline("dispatch completed without a result".into()))
    }
}
