//! # Router Module
//!
//! Route registration and resolution. Templates like `/users/:id` compile to
//! anchored regex matchers at registration time; lookup scans in
//! registration order so the first-registered route wins among ambiguous
//! matches.
//!
//! ## Architecture
//!
//! 1. **Compilation**: at registration, each template is compiled once into
//!    a regex and its ordered parameter names, and collision diagnostics run
//!    against a generalized-variant side-index.
//! 2. **Matching**: per request, the registry scans compiled patterns (and
//!    static templates) until a path matches, then checks the method —
//!    wrong-method hits return 405 rather than 404.
//!
//! The [`Router`] type bundles the three registries (routes, middleware,
//! models) behind one registration surface. It is an explicit value: pass it
//! (or the [`crate::dispatcher::Dispatcher`] built from it) to whatever
//! needs to register routes or dispatch requests. Building a throwaway
//! router inside a test is a one-liner.
//!
//! ## Example
//!
//! ```rust,ignore
//! use strada::router::Router;
//! use strada::response::Reply;
//! use http::Method;
//!
//! let mut router = Router::new();
//! router.register(Method::GET, "/pets/:id", |ctx| {
//!     Ok(Reply::json(ctx.params.clone()))
//! }, None)?;
//! ```

mod pattern;
mod registry;
#[cfg(test)]
mod tests;

pub use pattern::{compile_pattern, join_path_segments, RouteId};
pub use registry::{Route, RouteHandler, RouteRegistry};

use std::sync::Arc;

use http::Method;

use crate::context::Context;
use crate::error::HttpError;
use crate::middleware::{MiddlewareChain, MiddlewareHandler, MiddlewareRegistry, Scope};
use crate::model::{ModelRegistry, RouteModel, SchemaError, SchemaSet};
use crate::response::Reply;

/// Registration facade over the route, middleware and model registries.
///
/// Populate during startup, then freeze into a
/// [`crate::dispatcher::Dispatcher`]; nothing mutates the registries while
/// requests are in flight.
#[derive(Default)]
pub struct Router {
    global_prefix: String,
    routes: RouteRegistry,
    middleware: MiddlewareRegistry,
    models: ModelRegistry,
}

impl Router {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A router whose routes all live under `prefix`. The prefix is folded
    /// into each route's effective template eagerly at registration.
    #[must_use]
    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Router {
            global_prefix: prefix.into(),
            ..Router::default()
        }
    }

    /// Register a route. The effective template is
    /// `join(global_prefix, path)`; the returned id is its stable identity.
    pub fn register<F>(
        &mut self,
        method: Method,
        path: &str,
        handler: F,
        model: Option<RouteModel>,
    ) -> Result<RouteId, SchemaError>
    where
        F: Fn(&mut Context) -> Result<Reply, HttpError> + Send + Sync + 'static,
    {
        self.register_prefixed(method, &[path], handler, model)
    }

    fn register_prefixed<F>(
        &mut self,
        method: Method,
        path_pieces: &[&str],
        handler: F,
        model: Option<RouteModel>,
    ) -> Result<RouteId, SchemaError>
    where
        F: Fn(&mut Context) -> Result<Reply, HttpError> + Send + Sync + 'static,
    {
        let mut pieces = vec![self.global_prefix.as_str()];
        pieces.extend_from_slice(path_pieces);
        let template = join_path_segments(&pieces);

        let route = Route::new(method, template, Arc::new(handler));
        let id = route.id.clone();
        if let Some(model) = model {
            self.models.add(id.clone(), model)?;
        }
        self.routes.add(route);
        Ok(id)
    }

    /// Open a route group: routes registered through it share a path prefix
    /// and their ids are collected for group-scoped middleware.
    pub fn group(&mut self, prefix: impl Into<String>) -> RouteGroup<'_> {
        RouteGroup {
            router: self,
            prefix: prefix.into(),
            route_ids: Vec::new(),
        }
    }

    /// Attach middleware to a scope: every route, one route, or a set of
    /// routes (typically a group's ids).
    pub fn use_on<F>(&mut self, scope: Scope, handler: F)
    where
        F: Fn(&mut Context) -> Result<(), HttpError> + Send + Sync + 'static,
    {
        self.middleware.add(scope, Arc::new(handler));
    }

    /// Attach an already-shared middleware handler.
    pub fn use_handler(&mut self, scope: Scope, handler: MiddlewareHandler) {
        self.middleware.add(scope, handler);
    }

    pub fn find_route(&self, method: &Method, pathname: &str) -> Result<Arc<Route>, HttpError> {
        self.routes.find(method, pathname)
    }

    #[must_use]
    pub fn find_middleware(&self, route_id: &RouteId) -> MiddlewareChain {
        self.middleware.find(route_id)
    }

    #[must_use]
    pub fn find_model(&self, route_id: &RouteId) -> Option<&SchemaSet> {
        self.models.find(route_id)
    }

    /// `(method, template)` pairs in registration order.
    #[must_use]
    pub fn route_list(&self) -> Vec<(String, String)> {
        self.routes.list()
    }

    /// Number of collision diagnostics the route registry has emitted.
    #[must_use]
    pub fn collisions_detected(&self) -> usize {
        self.routes.collisions_detected()
    }
}

/// A prefix-scoped registration handle. Effective paths resolve once, at
/// registration: `join(global_prefix, group_prefix, local_path)`.
pub struct RouteGroup<'r> {
    router: &'r mut Router,
    prefix: String,
    route_ids: Vec<RouteId>,
}

impl RouteGroup<'_> {
    /// Register a route under the group prefix.
    pub fn register<F>(
        &mut self,
        method: Method,
        path: &str,
        handler: F,
        model: Option<RouteModel>,
    ) -> Result<RouteId, SchemaError>
    where
        F: Fn(&mut Context) -> Result<Reply, HttpError> + Send + Sync + 'static,
    {
        let prefix = self.prefix.clone();
        let id = self
            .router
            .register_prefixed(method, &[prefix.as_str(), path], handler, model)?;
        self.route_ids.push(id.clone());
        Ok(id)
    }

    /// Ids of every route registered through this group so far.
    #[must_use]
    pub fn route_ids(&self) -> &[RouteId] {
        &self.route_ids
    }

    /// Consume the group, keeping the collected ids for middleware scoping.
    #[must_use]
    pub fn into_route_ids(self) -> Vec<RouteId> {
        self.route_ids
    }
}
