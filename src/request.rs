//! Inbound request representation consumed by the matcher and guards.
//!
//! The crate does not parse HTTP itself; the surrounding server hands over
//! an already-parsed method, path, and the handful of headers the guards
//! care about (host, method override). The path is normalized once at
//! construction: the query string is stripped, surrounding slashes are
//! trimmed, and the result is re-rooted with a single leading slash.

use http::Method;
use smallvec::SmallVec;
use std::fmt;
use std::net::IpAddr;
use std::sync::Arc;

/// Maximum inline headers before heap allocation. Most requests carry far
/// fewer headers than this into the routing layer.
pub const MAX_INLINE_HEADERS: usize = 16;

/// Stack-allocated header storage. Names are `Arc<str>` so repeated names
/// (Host, X-HTTP-Method-Override) clone as an atomic increment.
pub type HeaderVec = SmallVec<[(Arc<str>, String); MAX_INLINE_HEADERS]>;

/// Request scheme as seen by the SSL guard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scheme {
    Http,
    Https,
}

impl fmt::Display for Scheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scheme::Http => write!(f, "http"),
            Scheme::Https => write!(f, "https"),
        }
    }
}

/// One inbound request: method, normalized path, and the request metadata
/// the guards evaluate.
#[derive(Debug, Clone)]
pub struct RequestContext {
    method: Method,
    path: String,
    headers: HeaderVec,
    client_ip: Option<IpAddr>,
    scheme: Scheme,
}

impl RequestContext {
    /// Create a context for `method` and `path`. The path may carry a query
    /// string and stray slashes; both are normalized away.
    #[must_use]
    pub fn new(method: Method, path: &str) -> Self {
        Self {
            method,
            path: normalize_path(path),
            headers: HeaderVec::new(),
            client_ip: None,
            scheme: Scheme::Http,
        }
    }

    /// Attach a header (builder style).
    #[must_use]
    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.push((Arc::from(name), value.into()));
        self
    }

    /// Attach the peer address the IP guard checks against.
    #[must_use]
    pub fn with_client_ip(mut self, ip: IpAddr) -> Self {
        self.client_ip = Some(ip);
        self
    }

    /// Mark the request as arriving over TLS.
    #[must_use]
    pub fn secure(mut self) -> Self {
        self.scheme = Scheme::Https;
        self
    }

    #[must_use]
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Normalized request path, always starting with `/`.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    #[must_use]
    pub fn scheme(&self) -> Scheme {
        self.scheme
    }

    #[must_use]
    pub fn client_ip(&self) -> Option<IpAddr> {
        self.client_ip
    }

    /// Get a header by name (case-insensitive per RFC 7230).
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Host the domain guard checks against.
    #[must_use]
    pub fn host(&self) -> Option<&str> {
        self.header("host")
    }

    /// The method the method guard compares against.
    ///
    /// HEAD is served by GET routes. When `honor_override` is on, a POST
    /// carrying `X-HTTP-Method-Override: PUT|PATCH|DELETE` is remapped to
    /// the override; the header is ignored on every other wire method.
    #[must_use]
    pub fn effective_method(&self, honor_override: bool) -> Method {
        if self.method == Method::HEAD {
            return Method::GET;
        }
        if honor_override && self.method == Method::POST {
            if let Some(value) = self.header("x-http-method-override") {
                for candidate in [Method::PUT, Method::PATCH, Method::DELETE] {
                    if value.eq_ignore_ascii_case(candidate.as_str()) {
                        return candidate;
                    }
                }
            }
        }
        self.method.clone()
    }
}

/// Strip the query string and trim slashes, re-rooting with a single `/`.
pub(crate) fn normalize_path(raw: &str) -> String {
    let without_query = match raw.find(|c| c == '?' || c == '#') {
        Some(idx) => &raw[..idx],
        None => raw,
    };
    format!("/{}", without_query.trim_matches('/'))
}
