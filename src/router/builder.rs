//! Fluent route registration.
//!
//! A [`RouteBuilder`] accumulates an explicit [`ScopeConfig`] value —
//! prefix, middleware, module, guards, name prefix — and snapshots it into
//! each route at registration time. `group` hands the callback a child
//! builder carrying a copy of the accumulated scope; when it returns, the
//! builder is back at global defaults no matter how deep the nesting went.
//! That flat reset is deliberate policy, not an accident of shared state.

use crate::dispatcher::Handler;
use http::Method;
use std::net::IpAddr;

use super::core::{Route, Router};
use super::pattern::CompiledPattern;

/// Builder state snapshotted into each registered route.
#[derive(Debug, Clone)]
pub struct ScopeConfig {
    prefix: String,
    middleware: Vec<String>,
    module: Option<String>,
    domains: Vec<String>,
    ips: Vec<IpAddr>,
    ssl: bool,
    name_prefix: Option<String>,
}

impl Default for ScopeConfig {
    fn default() -> Self {
        Self {
            prefix: "/".to_string(),
            middleware: Vec::new(),
            module: None,
            domains: Vec::new(),
            ips: Vec::new(),
            ssl: false,
            name_prefix: None,
        }
    }
}

/// Registration surface borrowed from a [`Router`].
pub struct RouteBuilder<'r> {
    router: &'r mut Router,
    scope: ScopeConfig,
}

impl<'r> RouteBuilder<'r> {
    pub(crate) fn new(router: &'r mut Router) -> Self {
        Self {
            router,
            scope: ScopeConfig::default(),
        }
    }

    /// Set the path prefix for subsequently registered routes. Replaces
    /// any earlier prefix wholesale.
    pub fn prefix(&mut self, prefix: &str) -> &mut Self {
        self.scope.prefix = format!("/{}", prefix.trim_matches('/'));
        self
    }

    /// Append middleware names to the scope.
    pub fn middleware<I, S>(&mut self, names: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.scope.middleware.extend(names.into_iter().map(Into::into));
        self
    }

    /// Tag subsequent routes with a module; controller lookups become
    /// module-qualified (`module::Controller`).
    pub fn module(&mut self, module: &str) -> &mut Self {
        self.scope.module = Some(module.to_string());
        self
    }

    /// Restrict subsequent routes to the given hosts.
    pub fn domain<I, S>(&mut self, domains: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.scope.domains = domains.into_iter().map(Into::into).collect();
        self
    }

    /// Restrict subsequent routes to the given client addresses.
    pub fn ip<I>(&mut self, ips: I) -> &mut Self
    where
        I: IntoIterator<Item = IpAddr>,
    {
        self.scope.ips = ips.into_iter().collect();
        self
    }

    /// Require TLS for subsequent routes.
    pub fn ssl(&mut self) -> &mut Self {
        self.scope.ssl = true;
        self
    }

    /// Prefix for route names assigned inside this scope, joined with `.`.
    pub fn name_prefix(&mut self, prefix: &str) -> &mut Self {
        self.scope.name_prefix = Some(prefix.to_string());
        self
    }

    /// Run `f` against a child builder carrying a copy of the accumulated
    /// scope. After the call this builder registers at global defaults,
    /// independent of nesting depth.
    pub fn group<F>(&mut self, f: F)
    where
        F: FnOnce(&mut RouteBuilder<'_>),
    {
        let scope = std::mem::take(&mut self.scope);
        let mut scoped = RouteBuilder {
            router: &mut *self.router,
            scope,
        };
        f(&mut scoped);
    }

    pub fn get(&mut self, pattern: &str, handler: Handler) -> RegisteredRoute<'_, 'r> {
        self.add(Method::GET, pattern, handler)
    }

    pub fn post(&mut self, pattern: &str, handler: Handler) -> RegisteredRoute<'_, 'r> {
        self.add(Method::POST, pattern, handler)
    }

    pub fn put(&mut self, pattern: &str, handler: Handler) -> RegisteredRoute<'_, 'r> {
        self.add(Method::PUT, pattern, handler)
    }

    pub fn patch(&mut self, pattern: &str, handler: Handler) -> RegisteredRoute<'_, 'r> {
        self.add(Method::PATCH, pattern, handler)
    }

    pub fn delete(&mut self, pattern: &str, handler: Handler) -> RegisteredRoute<'_, 'r> {
        self.add(Method::DELETE, pattern, handler)
    }

    pub fn options(&mut self, pattern: &str, handler: Handler) -> RegisteredRoute<'_, 'r> {
        self.add(Method::OPTIONS, pattern, handler)
    }

    /// Register the same pattern and handler under several methods.
    pub fn methods(&mut self, methods: &[Method], pattern: &str, handler: Handler) {
        for method in methods {
            let _ = self.add(method.clone(), pattern, handler.clone());
        }
    }

    fn add(&mut self, method: Method, pattern: &str, handler: Handler) -> RegisteredRoute<'_, 'r> {
        let template = join_prefix(&self.scope.prefix, pattern);
        let compiled = CompiledPattern::compile(&template);

        self.router.routes.push(Route {
            method,
            uri_template: template,
            pattern: compiled,
            handler,
            module: self.scope.module.clone(),
            middleware: self.scope.middleware.clone(),
            domains: self.scope.domains.clone(),
            allowed_ips: self.scope.ips.clone(),
            require_ssl: self.scope.ssl,
            name: None,
        });

        let index = self.router.routes.len() - 1;
        RegisteredRoute {
            builder: self,
            index,
        }
    }
}

/// Handle to the just-registered route, for chaining `constrain`/`name`
/// immediately after registration.
pub struct RegisteredRoute<'b, 'r> {
    builder: &'b mut RouteBuilder<'r>,
    index: usize,
}

impl RegisteredRoute<'_, '_> {
    /// Apply placeholder constraints to this route, recompiling its
    /// pattern from the URI template. Placeholders not named keep the
    /// default `[^/]+` fragment.
    pub fn constrain(self, constraints: &[(&str, &str)]) -> Self {
        let route = &mut self.builder.router.routes[self.index];
        route.pattern = CompiledPattern::compile_with(&route.uri_template, constraints);
        self
    }

    /// Name this route (prefixed by the scope's name prefix, joined with
    /// `.`) and record its raw template for reverse URL generation. Last
    /// registration wins on a name collision.
    pub fn name(self, name: &str) -> Self {
        let full = match &self.builder.scope.name_prefix {
            Some(prefix) => format!("{prefix}.{name}"),
            None => name.to_string(),
        };

        let route = &mut self.builder.router.routes[self.index];
        route.name = Some(full.clone());
        let raw = route.uri_template.trim_start_matches('/').to_string();
        self.builder.router.names.insert(full, raw);
        self
    }
}

/// Join the scope prefix and a route pattern the way registration expects:
/// a root prefix appends the trimmed pattern directly, a root pattern
/// collapses to the prefix itself, anything else concatenates as given.
fn join_prefix(prefix: &str, pattern: &str) -> String {
    if pattern == "/" || prefix == "/" {
        format!("{}{}", prefix, pattern.trim_matches('/'))
    } else {
        format!("{prefix}{pattern}")
    }
}
