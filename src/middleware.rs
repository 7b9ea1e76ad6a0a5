//! Pre-dispatch middleware.
//!
//! A middleware is a named, side-effecting step resolved through the
//! dispatcher's registry and run before the handler: global middleware
//! first, then the matched route's own list. There is deliberately no
//! next/chain primitive — a middleware either performs its side effects or
//! fails, and a failure aborts the request.

use crate::request::RequestContext;
use tracing::info;

pub trait Middleware: Send + Sync {
    fn handle(&self, req: &RequestContext) -> anyhow::Result<()>;
}

/// Built-in middleware that logs the inbound request line.
pub struct RequestLogMiddleware;

impl Middleware for RequestLogMiddleware {
    fn handle(&self, req: &RequestContext) -> anyhow::Result<()> {
        info!(
            method = %req.method(),
            path = %req.path(),
            scheme = %req.scheme(),
            "request received"
        );
        Ok(())
    }
}
