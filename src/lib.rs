//! Trellis Router
//!
//! A route table, matcher, and dispatch kernel for HTTP services. Routes
//! are registered through a fluent builder (prefixes, groups, guards,
//! middleware, names), compiled into anchored regexes, and matched in
//! registration order. Dispatch resolves handlers — direct closures or
//! controller actions — through a dependency container, running global and
//! route middleware first.
//!
//! ```
//! use std::sync::Arc;
//! use trellis_router::{
//!     Container, Dispatcher, Handler, HandlerResponse, RequestContext, Router,
//! };
//!
//! let mut router = Router::new();
//! router.build().prefix("users").get(
//!     "/{id}",
//!     Handler::from_fn(|params| {
//!         HandlerResponse::ok(serde_json::json!({ "id": params[0].1.clone() }))
//!     }),
//! );
//!
//! let dispatcher = Dispatcher::new(Arc::new(Container::new()));
//! let req = RequestContext::new(http::Method::GET, "/users/42");
//! let res = router.handle(&req, &dispatcher);
//! assert_eq!(res.status, 200);
//! assert_eq!(res.body["id"], "42");
//! ```

pub mod config;
pub mod container;
pub mod dispatcher;
pub mod error;
pub mod middleware;
pub mod request;
pub mod router;

pub use config::RouterConfig;
pub use container::Container;
pub use dispatcher::{Controller, Dispatcher, Handler, HandlerResponse};
pub use error::{ContainerError, DispatchError};
pub use middleware::{Middleware, RequestLogMiddleware};
pub use request::{HeaderVec, RequestContext, Scheme, MAX_INLINE_HEADERS};
pub use router::{
    PathParams, RegisteredRoute, Route, RouteBuilder, RouteMatch, Router, MAX_INLINE_PARAMS,
};
