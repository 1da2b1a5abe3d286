//! Middleware layer.
//!
//! A middleware unit sees the incoming request, the response built so far,
//! and a [`Next`] handle to the rest of the pipe. It can mutate the response
//! and delegate onward, or produce a response of its own and never call
//! `next` — the classic short-circuit.
//!
//! Units are assembled into a [`MiddlewarePipe`] and dispatched as a named
//! service through the controller layer; the pipe itself knows nothing about
//! routing or events.
//!
//! ```rust
//! use viaduct::{BoxError, MiddlewarePipe, Next, Request, Response};
//!
//! fn trailer(req: &Request, res: Response, next: Next<'_>) -> Result<Response, BoxError> {
//!     let mut res = next.run(req, res)?;
//!     res.write(b"\n-- served by viaduct\n");
//!     Ok(res)
//! }
//!
//! let pipe = MiddlewarePipe::new().pipe(trailer);
//! ```

mod pipe;

pub use pipe::MiddlewarePipe;

use crate::error::BoxError;
use crate::request::Request;
use crate::response::Response;

/// One unit of a middleware pipe.
///
/// Implemented automatically for any function or closure with the matching
/// signature, so plain `fn` items are middleware:
///
/// ```text
/// fn unit(request: &Request, response: Response, next: Next<'_>) -> Result<Response, BoxError>
/// ```
pub trait Middleware: Send + Sync {
    /// Handles the request, given the response produced so far and the rest
    /// of the pipe.
    fn process(
        &self,
        request: &Request,
        response: Response,
        next: Next<'_>,
    ) -> Result<Response, BoxError>;
}

impl<F> Middleware for F
where
    F: for<'a> Fn(&Request, Response, Next<'a>) -> Result<Response, BoxError> + Send + Sync,
{
    fn process(
        &self,
        request: &Request,
        response: Response,
        next: Next<'_>,
    ) -> Result<Response, BoxError> {
        self(request, response, next)
    }
}

/// Handle to the remainder of a pipe.
///
/// Consumed by [`run`](Next::run): a middleware delegates at most once. An
/// exhausted pipe returns the base response untouched.
pub struct Next<'a> {
    remaining: &'a [Box<dyn Middleware>],
}

impl<'a> Next<'a> {
    pub(crate) fn new(remaining: &'a [Box<dyn Middleware>]) -> Self {
        Self { remaining }
    }

    /// Runs the rest of the pipe.
    pub fn run(self, request: &Request, response: Response) -> Result<Response, BoxError> {
        match self.remaining.split_first() {
            Some((current, rest)) => current.process(request, response, Next::new(rest)),
            None => Ok(response),
        }
    }
}
