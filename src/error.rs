//! Error taxonomy for the routing and dispatch pipeline.
//!
//! Every variant is fatal for the request that triggered it: nothing is
//! retried and middleware side effects already performed are not undone.
//! [`DispatchError::NotFound`], [`DispatchError::ControllerNotFound`] and
//! [`DispatchError::UnknownAction`] are routed through the router's error
//! callback; everything else terminates the request with a diagnostic
//! response.

use http::Method;
use thiserror::Error;

/// Failures produced by the [`Container`](crate::Container).
#[derive(Debug, Error)]
pub enum ContainerError {
    /// `get` was called with a name that has no binding.
    #[error("service '{0}' is not registered")]
    ServiceNotFound(String),

    /// A binding exists under the name but holds a different concrete type.
    #[error("service '{name}' is not a '{expected}'")]
    TypeMismatch {
        name: String,
        expected: &'static str,
    },

    /// `resolve` was called for a type with no constructor and no provider
    /// mapping.
    #[error("no constructor or provider registered for type '{0}'")]
    Unresolvable(&'static str),
}

/// Failures produced while matching or dispatching a request.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// No route matched the request, or the first structural match failed
    /// its guard checks.
    #[error("no route matched {method} {path}")]
    NotFound { method: Method, path: String },

    /// The matched route names a controller that is not in the registry.
    #[error("controller '{0}' is not registered")]
    ControllerNotFound(String),

    /// The controller exists but does not expose the requested action.
    #[error("controller '{controller}' has no action '{action}'")]
    UnknownAction { controller: String, action: String },

    /// A middleware reported a failure; the request is aborted.
    #[error("middleware '{name}' failed")]
    Middleware {
        name: String,
        #[source]
        source: anyhow::Error,
    },

    /// The container could not produce a controller or middleware instance.
    #[error(transparent)]
    Container(#[from] ContainerError),
}
