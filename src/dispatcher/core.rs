//! Handler types and the dispatch engine.

use crate::container::Container;
use crate::error::{ContainerError, DispatchError};
use crate::middleware::Middleware;
use crate::request::{HeaderVec, RequestContext};
use crate::router::{PathParams, RouteMatch};
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, warn};

type DirectFn = dyn Fn(&PathParams) -> HandlerResponse + Send + Sync;

/// What a route dispatches to.
///
/// Either a direct function invoked with the captured path parameters, or
/// a controller action resolved through the dispatcher's registry and the
/// container. No string parsing happens at dispatch time; the controller
/// reference is data from the moment of registration.
#[derive(Clone)]
pub enum Handler {
    Direct(Arc<DirectFn>),
    Controller { name: String, action: String },
}

impl Handler {
    pub fn from_fn<F>(f: F) -> Self
    where
        F: Fn(&PathParams) -> HandlerResponse + Send + Sync + 'static,
    {
        Handler::Direct(Arc::new(f))
    }

    #[must_use]
    pub fn controller(name: &str, action: &str) -> Self {
        Handler::Controller {
            name: name.to_string(),
            action: action.to_string(),
        }
    }
}

impl fmt::Debug for Handler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Handler::Direct(_) => write!(f, "Direct(..)"),
            Handler::Controller { name, action } => {
                write!(f, "Controller({name}::{action})")
            }
        }
    }
}

/// A dispatchable controller: one instance, many named actions.
///
/// Implementations route `action` to their own methods and return
/// [`DispatchError::UnknownAction`] for anything they do not expose.
pub trait Controller: Send + Sync {
    fn invoke(&self, action: &str, params: &PathParams)
        -> Result<HandlerResponse, DispatchError>;
}

/// Response produced by a handler: status, headers, JSON body.
#[derive(Debug, Clone, Serialize)]
pub struct HandlerResponse {
    pub status: u16,
    #[serde(skip_serializing)]
    pub headers: HeaderVec,
    pub body: Value,
}

impl HandlerResponse {
    #[must_use]
    pub fn new(status: u16, headers: HeaderVec, body: Value) -> Self {
        Self {
            status,
            headers,
            body,
        }
    }

    /// JSON response with the content-type header set.
    #[must_use]
    pub fn json(status: u16, body: Value) -> Self {
        let mut headers = HeaderVec::new();
        headers.push((Arc::from("content-type"), "application/json".to_string()));
        Self {
            status,
            headers,
            body,
        }
    }

    /// 200 JSON response.
    #[must_use]
    pub fn ok(body: Value) -> Self {
        Self::json(200, body)
    }

    #[must_use]
    pub fn error(status: u16, message: &str) -> Self {
        Self::json(status, serde_json::json!({ "error": message }))
    }

    #[must_use]
    pub fn get_header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Add or replace a header (case-insensitive on the name).
    pub fn set_header(&mut self, name: &str, value: String) {
        self.headers.retain(|(k, _)| !k.eq_ignore_ascii_case(name));
        self.headers.push((Arc::from(name), value));
    }
}

type ControllerFactory =
    Arc<dyn Fn(&Container) -> Result<Arc<dyn Controller>, ContainerError> + Send + Sync>;
type MiddlewareFactory =
    Arc<dyn Fn(&Container) -> Result<Arc<dyn Middleware>, ContainerError> + Send + Sync>;

/// Executes matched routes: global middleware, then route middleware, then
/// the handler, all resolved through the container.
pub struct Dispatcher {
    container: Arc<Container>,
    controllers: HashMap<String, ControllerFactory>,
    middleware: HashMap<String, MiddlewareFactory>,
    global_middleware: Vec<String>,
}

impl Dispatcher {
    #[must_use]
    pub fn new(container: Arc<Container>) -> Self {
        Self {
            container,
            controllers: HashMap::new(),
            middleware: HashMap::new(),
            global_middleware: Vec::new(),
        }
    }

    #[must_use]
    pub fn container(&self) -> &Container {
        &self.container
    }

    /// Seed the global middleware chain from configuration.
    pub fn apply_config(&mut self, config: &crate::RouterConfig) {
        self.global_middleware
            .extend(config.default_middleware.iter().cloned());
    }

    /// Append a middleware name to the global chain. Global middleware
    /// runs before any route-specific middleware, in configured order.
    pub fn add_global_middleware(&mut self, name: &str) {
        self.global_middleware.push(name.to_string());
    }

    /// Register the factory that produces `name`'s controller instance.
    /// Instances are produced per dispatch; share state through the
    /// container's shared bindings instead.
    pub fn register_controller<F>(&mut self, name: &str, factory: F)
    where
        F: Fn(&Container) -> Result<Arc<dyn Controller>, ContainerError> + Send + Sync + 'static,
    {
        if self
            .controllers
            .insert(name.to_string(), Arc::new(factory))
            .is_some()
        {
            warn!(controller = name, "replaced existing controller registration");
        } else {
            info!(
                controller = name,
                total = self.controllers.len(),
                "controller registered"
            );
        }
    }

    /// Register the factory that produces the middleware bound to `name`.
    pub fn register_middleware<F>(&mut self, name: &str, factory: F)
    where
        F: Fn(&Container) -> Result<Arc<dyn Middleware>, ContainerError> + Send + Sync + 'static,
    {
        if self
            .middleware
            .insert(name.to_string(), Arc::new(factory))
            .is_some()
        {
            warn!(middleware = name, "replaced existing middleware registration");
        }
    }

    /// Execute the matched route.
    ///
    /// Global middleware runs first, then the route's own middleware, then
    /// the handler. A middleware failure aborts the request; side effects
    /// already performed are not undone.
    pub fn dispatch(
        &self,
        matched: &RouteMatch<'_>,
        req: &RequestContext,
    ) -> Result<HandlerResponse, DispatchError> {
        self.run_middleware(&self.global_middleware, req)?;
        self.run_middleware(&matched.route.middleware, req)?;

        match &matched.route.handler {
            Handler::Direct(f) => {
                debug!(path = %req.path(), "invoking direct handler");
                Ok(f(&matched.path_params))
            }
            Handler::Controller { name, action } => {
                let key = controller_key(matched.route.module.as_deref(), name);
                let factory = self
                    .controllers
                    .get(&key)
                    .ok_or_else(|| DispatchError::ControllerNotFound(key.clone()))?;
                let controller = factory(&self.container)?;
                debug!(controller = %key, action = %action, "invoking controller action");
                controller.invoke(action, &matched.path_params)
            }
        }
    }

    fn run_middleware(&self, names: &[String], req: &RequestContext) -> Result<(), DispatchError> {
        for name in names {
            let Some(factory) = self.middleware.get(name) else {
                // Unregistered names are skipped, mirroring the tolerant
                // class-exists gate this contract inherited.
                warn!(middleware = %name, "middleware not registered, skipping");
                continue;
            };
            let mw = factory(&self.container)?;
            debug!(middleware = %name, "running middleware");
            mw.handle(req).map_err(|source| DispatchError::Middleware {
                name: name.clone(),
                source,
            })?;
        }
        Ok(())
    }
}

/// Controller registry key: module-qualified when the route has a module.
fn controller_key(module: Option<&str>, name: &str) -> String {
    match module {
        Some(module) => format!("{module}::{name}"),
        None => name.to_string(),
    }
}
