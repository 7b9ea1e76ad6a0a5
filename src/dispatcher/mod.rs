//! Request dispatch: handler types, controller registry, middleware chain.

mod core;

pub use core::{Controller, Dispatcher, Handler, HandlerResponse};
