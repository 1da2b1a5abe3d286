//! Full request-cycle tests: route lookup, service resolution, controller
//! dispatch, lifecycle events.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use viaduct::{
    AppEvent, Application, BoxError, Error, Method, Middleware, MiddlewareController,
    MiddlewarePipe, Next, Request, Response, Route, Router, StatusCode,
};

fn get(path: &str) -> Request {
    Request::new(Method::GET, path.parse().unwrap())
}

struct FixedResponse {
    calls: Arc<AtomicUsize>,
}

impl Middleware for FixedResponse {
    fn process(
        &self,
        _request: &Request,
        _response: Response,
        _next: Next<'_>,
    ) -> Result<Response, BoxError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(Response::builder().status(StatusCode::ACCEPTED).text("fixed"))
    }
}

struct SelfNaming;

impl Middleware for SelfNaming {
    fn process(
        &self,
        _request: &Request,
        mut response: Response,
        _next: Next<'_>,
    ) -> Result<Response, BoxError> {
        response.write(std::any::type_name::<Self>());
        Ok(response)
    }
}

struct Failing;

impl Middleware for Failing {
    fn process(
        &self,
        _request: &Request,
        _response: Response,
        _next: Next<'_>,
    ) -> Result<Response, BoxError> {
        Err("pipe burst".into())
    }
}

fn app_with(name: &str, pipe: MiddlewarePipe) -> Application {
    Application::new(Router::new().on(Method::GET, "/middleware", Route::middleware(name)))
        .service(name, pipe)
}

#[test]
fn middleware_route_dispatches_the_registered_pipe_exactly_once() {
    let calls = Arc::new(AtomicUsize::new(0));
    let app = app_with(
        "Fixed",
        MiddlewarePipe::new().pipe(FixedResponse { calls: Arc::clone(&calls) }),
    );

    let response = app.handle(get("/middleware")).unwrap();

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(response.status_code(), StatusCode::ACCEPTED);
    assert_eq!(response.body(), b"fixed");
}

#[test]
fn middleware_can_write_its_own_type_name_into_the_body() {
    let app = app_with("Named", MiddlewarePipe::new().pipe(SelfNaming));

    let response = app.handle(get("/middleware")).unwrap();

    let body = String::from_utf8(response.body().to_vec()).unwrap();
    assert!(body.contains("SelfNaming"), "body was: {body}");
}

#[test]
fn shared_listeners_fire_under_current_and_deprecated_identifiers() {
    let calls = Arc::new(AtomicUsize::new(0));
    let app = app_with(
        "Fixed",
        MiddlewarePipe::new().pipe(FixedResponse { calls: Arc::clone(&calls) }),
    );

    let current = Arc::new(AtomicUsize::new(0));
    let legacy = Arc::new(AtomicUsize::new(0));
    let shared = app.shared_events();
    {
        let current = Arc::clone(&current);
        shared.attach(
            MiddlewareController::IDENTIFIER,
            AppEvent::DISPATCH,
            move |_| {
                current.fetch_add(1, Ordering::SeqCst);
                Ok(None)
            },
            100,
        );
    }
    {
        let legacy = Arc::clone(&legacy);
        shared.attach(
            MiddlewareController::LEGACY_IDENTIFIER,
            AppEvent::DISPATCH,
            move |_| {
                legacy.fetch_add(1, Ordering::SeqCst);
                Ok(None)
            },
            100,
        );
    }

    app.handle(get("/middleware")).unwrap();

    assert_eq!(current.load(Ordering::SeqCst), 1);
    assert_eq!(legacy.load(Ordering::SeqCst), 1);
}

#[test]
fn route_params_reach_the_pipe() {
    fn echo_id(req: &Request, mut res: Response, _next: Next<'_>) -> Result<Response, BoxError> {
        res.write(req.param("id").unwrap_or("missing"));
        Ok(res)
    }

    let app = Application::new(
        Router::new().on(Method::GET, "/jobs/{id}", Route::middleware("Jobs")),
    )
    .service("Jobs", MiddlewarePipe::new().pipe(echo_id));

    let response = app.handle(get("/jobs/42")).unwrap();

    assert_eq!(response.body(), b"42");
}

#[test]
fn unknown_route_is_a_404() {
    let app = app_with("Fixed", MiddlewarePipe::new());

    let response = app.handle(get("/nope")).unwrap();

    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
}

#[test]
fn route_to_unregistered_service_is_an_error() {
    let app = Application::new(
        Router::new().on(Method::GET, "/middleware", Route::middleware("Ghost")),
    );

    let error = app.handle(get("/middleware")).unwrap_err();

    match error {
        Error::UnknownService(name) => assert_eq!(name, "Ghost"),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn dispatch_error_listener_recovers_the_cycle_end_to_end() {
    let app = app_with("Failing", MiddlewarePipe::new().pipe(Failing));
    app.shared_events().attach(
        MiddlewareController::IDENTIFIER,
        AppEvent::DISPATCH_ERROR,
        |_| Ok(Some(Response::status(StatusCode::SERVICE_UNAVAILABLE))),
        1,
    );

    let response = app.handle(get("/middleware")).unwrap();

    assert_eq!(response.status_code(), StatusCode::SERVICE_UNAVAILABLE);
}

#[test]
fn unrecovered_pipe_failure_surfaces_as_a_pipeline_error() {
    let app = app_with("Failing", MiddlewarePipe::new().pipe(Failing));

    let error = app.handle(get("/middleware")).unwrap_err();

    match error {
        Error::Pipeline(e) => assert_eq!(e.to_string(), "pipe burst"),
        other => panic!("unexpected error: {other}"),
    }
}
