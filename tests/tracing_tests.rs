use std::io;
use std::sync::{Arc, Mutex};
use trellis_router::{
    Container, Dispatcher, Handler, HandlerResponse, RequestContext, Router,
};

use http::Method;
use serde_json::json;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::EnvFilter;

/// Collects formatted log lines so tests can assert on emitted events.
#[derive(Clone, Default)]
struct Capture {
    buf: Arc<Mutex<Vec<u8>>>,
}

impl Capture {
    fn contents(&self) -> String {
        String::from_utf8_lossy(&self.buf.lock().unwrap()).into_owned()
    }
}

impl io::Write for Capture {
    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        self.buf.lock().unwrap().extend_from_slice(data);
        Ok(data.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for Capture {
    type Writer = Capture;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

fn init(capture: &Capture) -> tracing::subscriber::DefaultGuard {
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new("trellis_router=debug"))
        .with_writer(capture.clone())
        .without_time()
        .with_ansi(false)
        .finish();
    tracing::subscriber::set_default(subscriber)
}

fn noop() -> Handler {
    Handler::from_fn(|_| HandlerResponse::ok(json!(null)))
}

#[test]
fn matching_emits_structured_events() {
    let capture = Capture::default();
    let _guard = init(&capture);

    let mut router = Router::new();
    router.build().get("/users/{id}", noop());

    let dispatcher = Dispatcher::new(Arc::new(Container::new()));
    let res = router.handle(&RequestContext::new(Method::GET, "/users/42"), &dispatcher);
    assert_eq!(res.status, 200);

    let log = capture.contents();
    assert!(log.contains("route match attempt"), "log was: {log}");
    assert!(log.contains("route matched"), "log was: {log}");
    assert!(log.contains("/users/42"), "log was: {log}");
}

#[test]
fn a_miss_and_a_skipped_middleware_are_logged() {
    let capture = Capture::default();
    let _guard = init(&capture);

    let mut router = Router::new();
    router.build().middleware(["ghost"]).get("/x", noop());

    let dispatcher = Dispatcher::new(Arc::new(Container::new()));
    router.handle(&RequestContext::new(Method::GET, "/x"), &dispatcher);
    router.handle(&RequestContext::new(Method::GET, "/nowhere"), &dispatcher);

    let log = capture.contents();
    assert!(log.contains("middleware not registered"), "log was: {log}");
    assert!(log.contains("ghost"), "log was: {log}");
    assert!(log.contains("no route matched"), "log was: {log}");
}

#[test]
fn a_guard_rejected_candidate_is_logged_before_falling_through() {
    let capture = Capture::default();
    let _guard = init(&capture);

    let mut router = Router::new();
    router.build().ssl().get("/dup", noop());
    router.build().get("/dup", noop());

    let dispatcher = Dispatcher::new(Arc::new(Container::new()));
    let res = router.handle(&RequestContext::new(Method::GET, "/dup"), &dispatcher);
    assert_eq!(res.status, 200);

    let log = capture.contents();
    assert!(log.contains("candidate rejected by guards"), "log was: {log}");
    assert!(log.contains("route matched"), "log was: {log}");
}
