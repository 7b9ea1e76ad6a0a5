//! Route records and the matching engine.
//!
//! Routes are scanned in registration order; the first route whose pattern
//! matches and whose guard checks (method, IP, domain, SSL) all pass wins.
//! A candidate that fails a guard is skipped and the scan continues, so the
//! same path registered under several methods resolves by method and a
//! request failing every candidate's guards is simply unmatched.

use crate::dispatcher::{Dispatcher, Handler, HandlerResponse};
use crate::error::DispatchError;
use crate::request::{RequestContext, Scheme};
use crate::RouterConfig;
use http::Method;
use smallvec::SmallVec;
use std::collections::HashMap;
use std::net::IpAddr;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use super::builder::RouteBuilder;
use super::pattern::{expand_template, CompiledPattern};

/// Maximum number of path parameters before heap allocation. Typical route
/// tables stay well under this.
pub const MAX_INLINE_PARAMS: usize = 8;

/// Stack-allocated parameter storage, `(name, value)` in capture order.
/// Names come from the static route table, so they are `Arc<str>`.
pub type PathParams = SmallVec<[(Arc<str>, String); MAX_INLINE_PARAMS]>;

/// One registered route: method, compiled pattern, handler, and guards.
/// Immutable once registration (including any `constrain`/`name` chained
/// immediately after it) is done.
#[derive(Clone)]
pub struct Route {
    pub method: Method,
    pub uri_template: String,
    pub pattern: CompiledPattern,
    pub handler: Handler,
    pub module: Option<String>,
    pub middleware: Vec<String>,
    /// Host allow-list; empty accepts any host.
    pub domains: Vec<String>,
    /// Client IP allow-list; empty accepts any peer.
    pub allowed_ips: Vec<IpAddr>,
    pub require_ssl: bool,
    pub name: Option<String>,
}

impl std::fmt::Debug for Route {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Route")
            .field("method", &self.method)
            .field("uri_template", &self.uri_template)
            .field("pattern", &self.pattern.as_str())
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

/// Result of matching a request against the table.
#[derive(Debug)]
pub struct RouteMatch<'r> {
    pub route: &'r Route,
    /// Path parameters in left-to-right capture order.
    pub path_params: PathParams,
}

impl RouteMatch<'_> {
    /// Get a path parameter by name. Last write wins when the same name
    /// appears at several path depths.
    #[inline]
    #[must_use]
    pub fn get_path_param(&self, name: &str) -> Option<&str> {
        self.path_params
            .iter()
            .rfind(|(k, _)| k.as_ref() == name)
            .map(|(_, v)| v.as_str())
    }
}

type ErrorCallback = Arc<dyn Fn(&Router) -> HandlerResponse + Send + Sync>;

/// Ordered route table with guard evaluation and reverse URL lookup.
pub struct Router {
    pub(crate) routes: Vec<Route>,
    pub(crate) names: HashMap<String, String>,
    error_callback: Option<ErrorCallback>,
    honor_method_override: bool,
}

impl Default for Router {
    fn default() -> Self {
        Self::new()
    }
}

impl Router {
    #[must_use]
    pub fn new() -> Self {
        Self {
            routes: Vec::new(),
            names: HashMap::new(),
            error_callback: None,
            honor_method_override: true,
        }
    }

    #[must_use]
    pub fn with_config(config: &RouterConfig) -> Self {
        let mut router = Self::new();
        router.honor_method_override = config.method_override;
        router
    }

    /// Start a registration scope at global defaults.
    pub fn build(&mut self) -> RouteBuilder<'_> {
        RouteBuilder::new(self)
    }

    /// Install the callback invoked (with the router) when a request does
    /// not resolve to a dispatchable handler.
    pub fn error<F>(&mut self, callback: F)
    where
        F: Fn(&Router) -> HandlerResponse + Send + Sync + 'static,
    {
        self.error_callback = Some(Arc::new(callback));
    }

    /// Registered routes, in registration order.
    #[must_use]
    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    /// Name → raw URI template index for reverse lookup.
    #[must_use]
    pub fn names(&self) -> &HashMap<String, String> {
        &self.names
    }

    /// Print the table to stdout. Debugging aid.
    pub fn dump_routes(&self) {
        println!("[routes] count={}", self.routes.len());
        for route in &self.routes {
            println!(
                "[route] {} {} -> {:?}{}",
                route.method,
                route.uri_template,
                route.handler,
                route
                    .name
                    .as_deref()
                    .map(|n| format!(" ({n})"))
                    .unwrap_or_default()
            );
        }
    }

    /// Generate a path from a named route's raw template. Returns `None`
    /// for an unknown name; the result carries no leading slash.
    #[must_use]
    pub fn url(&self, name: &str, params: &[(&str, &str)]) -> Option<String> {
        self.names
            .get(name)
            .map(|template| expand_template(template, params))
    }

    /// Find the first route whose pattern matches and whose guards pass.
    ///
    /// Candidates whose guards fail are skipped and the scan continues, so
    /// a later route with the same pattern can still serve the request.
    #[must_use]
    pub fn match_route(&self, req: &RequestContext) -> Option<RouteMatch<'_>> {
        debug!(method = %req.method(), path = %req.path(), "route match attempt");

        for route in &self.routes {
            let Some(params) = route.pattern.matches(req.path()) else {
                continue;
            };

            if !self.check_guards(route, req) {
                debug!(
                    method = %req.method(),
                    path = %req.path(),
                    route_pattern = %route.uri_template,
                    "candidate rejected by guards, trying next route"
                );
                continue;
            }

            info!(
                method = %req.method(),
                path = %req.path(),
                route_pattern = %route.uri_template,
                path_params = ?params,
                "route matched"
            );
            return Some(RouteMatch {
                route,
                path_params: params,
            });
        }

        warn!(method = %req.method(), path = %req.path(), "no route matched");
        None
    }

    /// Match, guard, and dispatch one request to completion.
    ///
    /// No match (including guard failure on every candidate) takes the
    /// error path:
    /// the error callback when installed, a plain 404 otherwise. An
    /// unresolvable controller takes the identical path; any other
    /// dispatch failure terminates the request as a 500 diagnostic
    /// response.
    pub fn handle(&self, req: &RequestContext, dispatcher: &Dispatcher) -> HandlerResponse {
        let Some(matched) = self.match_route(req) else {
            return self.error_response(req);
        };

        match dispatcher.dispatch(&matched, req) {
            Ok(response) => response,
            Err(
                err @ (DispatchError::ControllerNotFound(_) | DispatchError::UnknownAction { .. }),
            ) => {
                error!(error = %err, path = %req.path(), "handler resolution failed");
                self.error_response(req)
            }
            Err(err) => {
                error!(error = %err, path = %req.path(), "request dispatch failed");
                HandlerResponse::error(500, &err.to_string())
            }
        }
    }

    fn error_response(&self, req: &RequestContext) -> HandlerResponse {
        if let Some(callback) = &self.error_callback {
            return callback(self);
        }
        let err = DispatchError::NotFound {
            method: req.method().clone(),
            path: req.path().to_string(),
        };
        warn!(error = %err, "emitting 404");
        HandlerResponse::error(404, "Not Found")
    }

    fn check_guards(&self, route: &Route, req: &RequestContext) -> bool {
        self.check_method(route, req)
            && check_ip(route, req)
            && check_domain(route, req)
            && check_ssl(route, req)
    }

    fn check_method(&self, route: &Route, req: &RequestContext) -> bool {
        route.method == req.effective_method(self.honor_method_override)
    }
}

fn check_ip(route: &Route, req: &RequestContext) -> bool {
    if route.allowed_ips.is_empty() {
        return true;
    }
    req.client_ip()
        .is_some_and(|ip| route.allowed_ips.contains(&ip))
}

fn check_domain(route: &Route, req: &RequestContext) -> bool {
    if route.domains.is_empty() {
        return true;
    }
    req.host()
        .is_some_and(|host| route.domains.iter().any(|d| d == host))
}

fn check_ssl(route: &Route, req: &RequestContext) -> bool {
    !route.require_ssl || req.scheme() == Scheme::Https
}
