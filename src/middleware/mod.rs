//! # Middleware Module
//!
//! Ordered, scoped middleware composition. A middleware handler runs before
//! the route handler and mutates the shared [`crate::context::Context`] —
//! stash values in `ctx.data`, write response headers, or return an error to
//! short-circuit the chain.
//!
//! Ordering: one global counter spans all scopes, but the composed chain for
//! a route is always the full global list followed by the full route-scoped
//! list, each in registration order. Execution is strictly sequential.

mod core;
mod logging;
mod metrics;

pub use self::core::{MiddlewareChain, MiddlewareHandler, MiddlewareRegistry, Scope};
pub use self::logging::request_logging;
pub use self::metrics::Metrics;
