//! # viaduct
//!
//! Event-driven HTTP dispatch for named middleware pipelines.
//! Nothing more. Nothing less.
//!
//! ## The shape
//!
//! A route does not point at a handler — it names a middleware service. The
//! application resolves the name to a [`MiddlewarePipe`] and dispatches it
//! through a [`MiddlewareController`], and the controller wraps the pipe in
//! the framework lifecycle: a `dispatch` event fires around pipeline
//! execution, a `dispatch.error` event fires when the pipe fails. Listeners
//! can observe the cycle, short-circuit it with their own response, or
//! substitute a result after a failure — without the pipe knowing any of
//! them exist.
//!
//! The pieces:
//!
//! - **Pipes** — ordered middleware chains, registered by name
//! - **Controller** — dispatches a pipe through the event system, keeping
//!   its deprecated identifier registered so old listeners keep firing
//! - **Events** — priority-ordered listeners with stop-propagation
//!   short-circuit, per-request and shared across the process
//! - **Edge** — matchit routing, hyper serving, graceful shutdown
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use viaduct::{
//!     Application, BoxError, Method, MiddlewarePipe, Next, Request, Response, Route, Router,
//!     Server,
//! };
//!
//! #[tokio::main]
//! async fn main() {
//!     let router = Router::new()
//!         .on(Method::GET, "/middleware", Route::middleware("Hello"));
//!
//!     let app = Application::new(router)
//!         .service("Hello", MiddlewarePipe::new().pipe(hello));
//!
//!     Server::bind("0.0.0.0:3000").serve(app).await.unwrap();
//! }
//!
//! fn hello(_req: &Request, mut res: Response, _next: Next<'_>) -> Result<Response, BoxError> {
//!     res.write(b"hello from viaduct\n");
//!     Ok(res)
//! }
//! ```

mod application;
mod controller;
mod error;
mod event;
mod events;
mod request;
mod response;
mod router;
mod server;

pub mod middleware;

pub use application::Application;
pub use controller::{Dispatchable, MiddlewareController};
pub use error::{BoxError, Error};
pub use event::AppEvent;
pub use events::{EventManager, ListenerResult, SharedEventManager, Triggered};
pub use middleware::{Middleware, MiddlewarePipe, Next};
pub use request::{DispatchRequest, Request};
pub use response::{ContentType, Response, ResponseBuilder};
pub use router::{Route, Router};
pub use server::Server;

pub use http::{Method, StatusCode};
