//! Runtime configuration.
//!
//! ```toml
//! # router.toml
//! default_middleware = ["request_log", "csrf"]
//! method_override = true
//! ```
//!
//! `default_middleware` names the global middleware chain the dispatcher
//! runs before any route-specific middleware. `method_override` controls
//! whether the matcher honors `X-HTTP-Method-Override` on POST requests
//! (on by default).

use anyhow::Context;
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RouterConfig {
    /// Global middleware names, run in order on every dispatched request.
    pub default_middleware: Vec<String>,
    /// Honor `X-HTTP-Method-Override` on POST requests.
    pub method_override: bool,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            default_middleware: Vec::new(),
            method_override: true,
        }
    }
}

impl RouterConfig {
    pub fn from_toml_str(content: &str) -> anyhow::Result<Self> {
        toml::from_str(content).context("parsing router config")
    }

    pub fn from_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading router config {}", path.display()))?;
        Self::from_toml_str(&content)
    }
}
