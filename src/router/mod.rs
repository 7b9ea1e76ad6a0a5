//! Route table, fluent registration, pattern matching, guards.

mod builder;
mod core;
mod pattern;

pub use builder::{RegisteredRoute, RouteBuilder, ScopeConfig};
pub use core::{PathParams, Route, RouteMatch, Router, MAX_INLINE_PARAMS};
pub use pattern::CompiledPattern;
