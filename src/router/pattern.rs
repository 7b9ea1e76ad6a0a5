//! URI template compilation.
//!
//! A template like `/users/{id}/posts/{post}` compiles into an anchored
//! regex (`^/users/([^/]+)/posts/([^/]+)$`) plus the ordered parameter
//! names. Placeholder segments accept three bracket styles, `{id}`, `[id]`
//! and `(id)`, and default to matching one or more non-slash characters
//! unless a constraint supplies a tighter fragment.

use super::core::PathParams;
use once_cell::sync::Lazy;
use regex::Regex;
use std::sync::Arc;

/// A whole segment wrapped in one of the accepted bracket styles.
static PLACEHOLDER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[\[{(](.+)[\]})]$").expect("placeholder regex is valid"));

/// Compiled matcher for one route. Derived deterministically from the URI
/// template at registration time and immutable afterwards.
#[derive(Debug, Clone)]
pub struct CompiledPattern {
    regex: Regex,
    params: Vec<Arc<str>>,
}

impl CompiledPattern {
    /// Compile with the default `[^/]+` fragment for every placeholder.
    #[must_use]
    pub fn compile(template: &str) -> Self {
        Self::compile_with(template, &[])
    }

    /// Compile with per-placeholder regex fragments. Unconstrained
    /// placeholders keep the default fragment; constrained fragments stay
    /// capturing groups so parameter extraction is unaffected.
    ///
    /// # Panics
    ///
    /// Panics when a constraint fragment is not a valid regex. Pattern
    /// compilation is startup-time route registration, not request
    /// handling.
    #[must_use]
    pub fn compile_with(template: &str, constraints: &[(&str, &str)]) -> Self {
        if template == "/" {
            return Self {
                regex: Regex::new("^/$").expect("root pattern is valid"),
                params: Vec::new(),
            };
        }

        let mut pattern = String::with_capacity(template.len() + 8);
        pattern.push('^');
        let mut params = Vec::new();

        for segment in template.split('/') {
            if segment.is_empty() {
                continue;
            }
            if let Some(caps) = PLACEHOLDER.captures(segment) {
                let name = &caps[1];
                let fragment = constraints
                    .iter()
                    .find(|(key, _)| *key == name)
                    .map_or("[^/]+", |(_, fragment)| *fragment);
                pattern.push_str("/(");
                pattern.push_str(fragment);
                pattern.push(')');
                params.push(Arc::from(name));
            } else {
                pattern.push('/');
                pattern.push_str(&regex::escape(segment));
            }
        }

        pattern.push('$');
        let regex = Regex::new(&pattern)
            .unwrap_or_else(|err| panic!("invalid pattern for route '{template}': {err}"));

        Self { regex, params }
    }

    /// Test `path` against the pattern, extracting parameters in
    /// left-to-right capture order on a hit.
    #[must_use]
    pub fn matches(&self, path: &str) -> Option<PathParams> {
        let caps = self.regex.captures(path)?;
        let mut params = PathParams::new();
        for (idx, name) in self.params.iter().enumerate() {
            if let Some(value) = caps.get(idx + 1) {
                params.push((Arc::clone(name), value.as_str().to_string()));
            }
        }
        Some(params)
    }

    /// Ordered placeholder names.
    #[must_use]
    pub fn param_names(&self) -> &[Arc<str>] {
        &self.params
    }

    /// The compiled regex source, for diagnostics.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.regex.as_str()
    }
}

/// Substitute named parameters into a raw template for reverse URL
/// generation. Placeholders without a supplied value keep their raw
/// segment; the result carries no leading slash.
pub(crate) fn expand_template(template: &str, params: &[(&str, &str)]) -> String {
    template
        .trim_start_matches('/')
        .split('/')
        .map(|segment| match PLACEHOLDER.captures(segment) {
            Some(caps) => params
                .iter()
                .find(|(key, _)| *key == &caps[1])
                .map_or_else(|| segment.to_string(), |(_, value)| (*value).to_string()),
            None => segment.to_string(),
        })
        .collect::<Vec<_>>()
        .join("/")
}
