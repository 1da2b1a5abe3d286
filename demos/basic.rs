//! Minimal viaduct example — a middleware pipe dispatched through the event
//! lifecycle.
//!
//! Run with:
//!   RUST_LOG=debug cargo run --example basic
//!
//! Try:
//!   curl http://localhost:3000/middleware

use viaduct::{
    AppEvent, Application, BoxError, Method, MiddlewareController, MiddlewarePipe, Next, Request,
    Response, Route, Router, Server,
};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let router = Router::new().on(Method::GET, "/middleware", Route::middleware("Greeting"));

    let app = Application::new(router)
        .service("Greeting", MiddlewarePipe::new().pipe(request_line).pipe(greeting));

    // Shared listener, keyed by the controller identifier: sees the dispatch
    // event of every request cycle.
    app.shared_events().attach(
        MiddlewareController::IDENTIFIER,
        AppEvent::DISPATCH,
        |event| {
            if let Some(request) = event.request() {
                tracing::info!(path = %request.path(), "dispatch observed");
            }
            Ok(None)
        },
        100,
    );

    Server::bind("0.0.0.0:3000").serve(app).await.expect("server error");
}

// Writes the request line into the body, then hands off to the rest of the
// pipe.
fn request_line(req: &Request, mut res: Response, next: Next<'_>) -> Result<Response, BoxError> {
    res.write(format!("{} {}\n", req.method(), req.path()));
    next.run(req, res)
}

fn greeting(_req: &Request, mut res: Response, _next: Next<'_>) -> Result<Response, BoxError> {
    res.write(b"hello from viaduct\n");
    Ok(res)
}
