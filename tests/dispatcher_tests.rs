use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use trellis_router::{
    Container, Controller, DispatchError, Dispatcher, Handler, HandlerResponse, Middleware,
    PathParams, RequestContext, RequestLogMiddleware, Router, RouterConfig,
};

use http::Method;
use serde_json::json;

struct Recorder {
    label: &'static str,
    log: Arc<Mutex<Vec<&'static str>>>,
}

impl Middleware for Recorder {
    fn handle(&self, _req: &RequestContext) -> anyhow::Result<()> {
        self.log.lock().unwrap().push(self.label);
        Ok(())
    }
}

struct Rejector;

impl Middleware for Rejector {
    fn handle(&self, _req: &RequestContext) -> anyhow::Result<()> {
        anyhow::bail!("request rejected")
    }
}

struct UserController;

impl Controller for UserController {
    fn invoke(
        &self,
        action: &str,
        params: &PathParams,
    ) -> Result<HandlerResponse, DispatchError> {
        match action {
            "show" => Ok(HandlerResponse::ok(
                json!({ "id": params[0].1.clone(), "controller": "user" }),
            )),
            other => Err(DispatchError::UnknownAction {
                controller: "UserController".to_string(),
                action: other.to_string(),
            }),
        }
    }
}

struct GreetingController {
    greeting: Arc<String>,
}

impl Controller for GreetingController {
    fn invoke(
        &self,
        action: &str,
        _params: &PathParams,
    ) -> Result<HandlerResponse, DispatchError> {
        match action {
            "index" => Ok(HandlerResponse::ok(json!({ "message": self.greeting.as_str() }))),
            other => Err(DispatchError::UnknownAction {
                controller: "GreetingController".to_string(),
                action: other.to_string(),
            }),
        }
    }
}

fn register_recorder(dispatcher: &mut Dispatcher, label: &'static str, log: &Arc<Mutex<Vec<&'static str>>>) {
    let log = Arc::clone(log);
    dispatcher.register_middleware(label, move |_| {
        Ok(Arc::new(Recorder {
            label,
            log: Arc::clone(&log),
        }) as Arc<dyn Middleware>)
    });
}

#[test]
fn global_middleware_runs_before_route_middleware() {
    let log = Arc::new(Mutex::new(Vec::new()));

    let mut dispatcher = Dispatcher::new(Arc::new(Container::new()));
    register_recorder(&mut dispatcher, "global", &log);
    register_recorder(&mut dispatcher, "auth", &log);
    dispatcher.add_global_middleware("global");

    let mut router = Router::new();
    router
        .build()
        .middleware(["auth"])
        .get("/x", Handler::from_fn(|_| HandlerResponse::ok(json!(null))));

    let req = RequestContext::new(Method::GET, "/x");
    let res = router.handle(&req, &dispatcher);
    assert_eq!(res.status, 200);
    assert_eq!(*log.lock().unwrap(), ["global", "auth"]);
}

#[test]
fn config_seeds_the_global_chain_in_order() {
    let log = Arc::new(Mutex::new(Vec::new()));

    let mut dispatcher = Dispatcher::new(Arc::new(Container::new()));
    register_recorder(&mut dispatcher, "first", &log);
    register_recorder(&mut dispatcher, "second", &log);

    let config = RouterConfig::from_toml_str(
        r#"default_middleware = ["first", "second"]"#,
    )
    .unwrap();
    dispatcher.apply_config(&config);

    let mut router = Router::new();
    router
        .build()
        .get("/x", Handler::from_fn(|_| HandlerResponse::ok(json!(null))));

    router.handle(&RequestContext::new(Method::GET, "/x"), &dispatcher);
    assert_eq!(*log.lock().unwrap(), ["first", "second"]);
}

#[test]
fn middleware_failure_aborts_the_request() {
    let log = Arc::new(Mutex::new(Vec::new()));

    let mut dispatcher = Dispatcher::new(Arc::new(Container::new()));
    dispatcher.register_middleware("deny", |_| Ok(Arc::new(Rejector) as Arc<dyn Middleware>));
    register_recorder(&mut dispatcher, "after", &log);

    let calls = Arc::new(AtomicUsize::new(0));
    let handler_calls = Arc::clone(&calls);
    let mut router = Router::new();
    router.build().middleware(["deny", "after"]).get(
        "/x",
        Handler::from_fn(move |_| {
            handler_calls.fetch_add(1, Ordering::SeqCst);
            HandlerResponse::ok(json!(null))
        }),
    );

    let res = router.handle(&RequestContext::new(Method::GET, "/x"), &dispatcher);
    assert_eq!(res.status, 500);
    // Neither the later middleware nor the handler ran.
    assert!(log.lock().unwrap().is_empty());
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[test]
fn unregistered_middleware_is_skipped() {
    let log = Arc::new(Mutex::new(Vec::new()));

    let mut dispatcher = Dispatcher::new(Arc::new(Container::new()));
    register_recorder(&mut dispatcher, "present", &log);

    let mut router = Router::new();
    router.build().middleware(["ghost", "present"]).get(
        "/x",
        Handler::from_fn(|_| HandlerResponse::ok(json!(null))),
    );

    let res = router.handle(&RequestContext::new(Method::GET, "/x"), &dispatcher);
    assert_eq!(res.status, 200);
    assert_eq!(*log.lock().unwrap(), ["present"]);
}

#[test]
fn built_in_request_log_middleware_passes_requests_through() {
    let mut dispatcher = Dispatcher::new(Arc::new(Container::new()));
    dispatcher.register_middleware("request_log", |_| {
        Ok(Arc::new(RequestLogMiddleware) as Arc<dyn Middleware>)
    });
    dispatcher.add_global_middleware("request_log");

    let mut router = Router::new();
    router
        .build()
        .get("/x", Handler::from_fn(|_| HandlerResponse::ok(json!(null))));

    let res = router.handle(&RequestContext::new(Method::GET, "/x"), &dispatcher);
    assert_eq!(res.status, 200);
}

#[test]
fn controller_handler_dispatches_by_name_and_action() {
    let mut dispatcher = Dispatcher::new(Arc::new(Container::new()));
    dispatcher.register_controller("UserController", |_| {
        Ok(Arc::new(UserController) as Arc<dyn Controller>)
    });

    let mut router = Router::new();
    router
        .build()
        .get("/users/{id}", Handler::controller("UserController", "show"));

    let res = router.handle(&RequestContext::new(Method::GET, "/users/42"), &dispatcher);
    assert_eq!(res.status, 200);
    assert_eq!(res.body["id"], "42");
    assert_eq!(res.body["controller"], "user");
}

#[test]
fn module_scoped_controllers_use_qualified_keys() {
    let mut dispatcher = Dispatcher::new(Arc::new(Container::new()));
    dispatcher.register_controller("admin::UserController", |_| {
        Ok(Arc::new(UserController) as Arc<dyn Controller>)
    });

    let mut router = Router::new();
    router
        .build()
        .module("admin")
        .get("/users/{id}", Handler::controller("UserController", "show"));

    let res = router.handle(&RequestContext::new(Method::GET, "/users/7"), &dispatcher);
    assert_eq!(res.status, 200);
    assert_eq!(res.body["id"], "7");
}

#[test]
fn unregistered_controller_takes_the_error_path() {
    let dispatcher = Dispatcher::new(Arc::new(Container::new()));

    let mut router = Router::new();
    router
        .build()
        .get("/users", Handler::controller("GhostController", "index"));
    router.error(|_| HandlerResponse::error(404, "no such page"));

    let res = router.handle(&RequestContext::new(Method::GET, "/users"), &dispatcher);
    assert_eq!(res.status, 404);
    assert_eq!(res.body["error"], "no such page");
}

#[test]
fn unknown_action_takes_the_error_path() {
    let mut dispatcher = Dispatcher::new(Arc::new(Container::new()));
    dispatcher.register_controller("UserController", |_| {
        Ok(Arc::new(UserController) as Arc<dyn Controller>)
    });

    let mut router = Router::new();
    router
        .build()
        .get("/users", Handler::controller("UserController", "vanish"));

    let res = router.handle(&RequestContext::new(Method::GET, "/users"), &dispatcher);
    assert_eq!(res.status, 404);
}

#[test]
fn controller_factories_pull_dependencies_from_the_container() {
    let mut container = Container::new();
    container.set_instance("greeting", "hello from the container".to_string());

    let mut dispatcher = Dispatcher::new(Arc::new(container));
    dispatcher.register_controller("GreetingController", |c| {
        Ok(Arc::new(GreetingController {
            greeting: c.get::<String>("greeting")?,
        }) as Arc<dyn Controller>)
    });

    let mut router = Router::new();
    router
        .build()
        .get("/hello", Handler::controller("GreetingController", "index"));

    let res = router.handle(&RequestContext::new(Method::GET, "/hello"), &dispatcher);
    assert_eq!(res.status, 200);
    assert_eq!(res.body["message"], "hello from the container");
}
