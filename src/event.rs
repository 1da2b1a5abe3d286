//! The dispatch lifecycle event.

use crate::error::BoxError;
use crate::request::Request;
use crate::response::Response;

/// Mutable value object carried through one dispatch cycle.
///
/// A controller owns exactly one `AppEvent` and mutates it in place on every
/// [`dispatch`](crate::Dispatchable::dispatch) call — there is no per-call
/// event allocation. Listeners receive `&mut AppEvent` and may read the
/// request/response, store a result, or stop propagation.
///
/// The target identifies the controller the event was fired from, by the
/// identifier it registered on the event manager.
#[derive(Debug, Default)]
pub struct AppEvent {
    name: &'static str,
    target: Option<&'static str>,
    request: Option<Request>,
    response: Option<Response>,
    result: Option<Response>,
    error: Option<BoxError>,
    stopped: bool,
}

impl AppEvent {
    /// Fired once per request cycle, immediately before the core handling
    /// logic runs.
    pub const DISPATCH: &'static str = "dispatch";

    /// Fired when core handling logic fails, giving listeners a chance to
    /// substitute a result.
    pub const DISPATCH_ERROR: &'static str = "dispatch.error";

    pub fn new() -> Self {
        Self::default()
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn set_name(&mut self, name: &'static str) {
        self.name = name;
    }

    pub fn target(&self) -> Option<&'static str> {
        self.target
    }

    pub fn set_target(&mut self, target: &'static str) {
        self.target = Some(target);
    }

    pub fn request(&self) -> Option<&Request> {
        self.request.as_ref()
    }

    pub fn set_request(&mut self, request: Request) {
        self.request = Some(request);
    }

    pub fn response(&self) -> Option<&Response> {
        self.response.as_ref()
    }

    pub fn set_response(&mut self, response: Response) {
        self.response = Some(response);
    }

    /// The result of the cycle so far — set by the pipeline listener on
    /// success, or by the controller when a listener short-circuits or a
    /// dispatch-error listener substitutes a recovery response.
    pub fn result(&self) -> Option<&Response> {
        self.result.as_ref()
    }

    pub fn set_result(&mut self, result: Response) {
        self.result = Some(result);
    }

    /// Error detail attached while the `dispatch.error` event is in flight.
    pub fn error(&self) -> Option<&(dyn std::error::Error + Send + Sync)> {
        self.error.as_deref()
    }

    pub fn set_error(&mut self, error: BoxError) {
        self.error = Some(error);
    }

    /// Removes and returns the stored error detail.
    pub fn take_error(&mut self) -> Option<BoxError> {
        self.error.take()
    }

    /// Tells the trigger loop to skip every remaining listener.
    pub fn stop_propagation(&mut self, stop: bool) {
        self.stopped = stop;
    }

    pub fn propagation_stopped(&self) -> bool {
        self.stopped
    }
}
