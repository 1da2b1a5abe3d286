//! Ordered middleware chain.

use crate::error::BoxError;
use crate::request::Request;
use crate::response::Response;

use super::{Middleware, Next};

/// An ordered chain of middleware, run front to back.
///
/// Build it once with chained [`pipe`](MiddlewarePipe::pipe) calls, register
/// it as a named service on the application, and the dispatch cycle invokes
/// it with the request and a base response. Each unit decides whether to
/// delegate to the rest of the chain; when the chain runs dry the base
/// response comes back as-is.
#[derive(Default)]
pub struct MiddlewarePipe {
    stack: Vec<Box<dyn Middleware>>,
}

impl MiddlewarePipe {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a unit to the end of the chain. Returns `self` so pipes build
    /// up the same way routes do.
    pub fn pipe(mut self, middleware: impl Middleware + 'static) -> Self {
        self.stack.push(Box::new(middleware));
        self
    }

    /// Runs the chain over `request`, threading `response` through as the
    /// base response.
    pub fn process(&self, request: &Request, response: Response) -> Result<Response, BoxError> {
        Next::new(&self.stack).run(request, response)
    }
}
