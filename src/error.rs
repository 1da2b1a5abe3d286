//! Unified error type.

use std::fmt;
use std::io;

/// Boxed dynamic error crossing the listener and middleware seams.
///
/// Middleware and event listeners can fail with anything; the dispatch cycle
/// only ever inspects the failure through `std::error::Error`, so a boxed
/// trait object is the whole contract.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// The error type returned by viaduct's fallible operations.
///
/// Application-level outcomes (404, 422, etc.) are expressed as HTTP
/// [`Response`](crate::Response) values, not as `Error`s. This type surfaces
/// dispatch-cycle failures and infrastructure failures: a request the
/// controller cannot dispatch, a route pointing at an unregistered service,
/// an unrecovered pipeline failure, or socket-level trouble.
#[derive(Debug)]
pub enum Error {
    /// Binding to a port or accepting a connection failed.
    Io(io::Error),
    /// `dispatch` was handed a request with no HTTP view. Signals a
    /// misconfigured route or dispatch chain upstream, never a recoverable
    /// pipeline outcome.
    UnexpectedRequest {
        /// The `kind()` of the request that was actually given.
        given: &'static str,
    },
    /// A route named a middleware service that was never registered.
    UnknownService(String),
    /// The pipeline failed and no dispatch-error listener substituted a
    /// result.
    Pipeline(BoxError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "io: {e}"),
            Self::UnexpectedRequest { given } => {
                write!(f, "cannot dispatch: expected an HTTP request, got a {given} request")
            }
            Self::UnknownService(name) => {
                write!(f, "route names middleware service `{name}`, which is not registered")
            }
            Self::Pipeline(e) => write!(f, "middleware pipeline failed: {e}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            Self::Pipeline(e) => Some(&**e as &(dyn std::error::Error + 'static)),
            _ => None,
        }
    }
}

impl From<io::Error> for Error {
    fn from(e: io::Error) -> Self {
        Self::Io(e)
    }
}
