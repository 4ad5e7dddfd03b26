//! Middleware registry and chain composition.
//!
//! Entries are scoped to every route (`Scope::Global`), one route, or a set
//! of routes (a group's ids). One monotonic counter orders registrations
//! across all scopes, but composition always places the full global list
//! before the full route-scoped list. Chains run strictly sequentially; an
//! `Err` from any handler aborts the rest of the chain and the route
//! handler.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;

use crate::context::Context;
use crate::error::HttpError;
use crate::router::RouteId;

/// A middleware handler: mutates the shared context (set `data`, write
/// response headers) or returns an error to short-circuit.
pub type MiddlewareHandler = Arc<dyn Fn(&mut Context) -> Result<(), HttpError> + Send + Sync>;

/// The routes a middleware entry applies to.
#[derive(Clone)]
pub enum Scope {
    /// Every route.
    Global,
    /// One route.
    Route(RouteId),
    /// A set of routes, typically a route group's ids.
    Routes(Vec<RouteId>),
}

impl From<RouteId> for Scope {
    fn from(id: RouteId) -> Self {
        Scope::Route(id)
    }
}

impl From<Vec<RouteId>> for Scope {
    fn from(ids: Vec<RouteId>) -> Self {
        Scope::Routes(ids)
    }
}

impl From<&[RouteId]> for Scope {
    fn from(ids: &[RouteId]) -> Self {
        Scope::Routes(ids.to_vec())
    }
}

struct Entry {
    seq: u64,
    handler: MiddlewareHandler,
}

/// Stores middleware handlers per scope and composes them per route.
#[derive(Default)]
pub struct MiddlewareRegistry {
    next_seq: u64,
    globals: Vec<Entry>,
    scoped: HashMap<RouteId, Vec<Entry>>,
}

impl MiddlewareRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler. Every registration consumes one counter slot,
    /// global entries included; a multi-route scope shares one slot across
    /// its targets.
    pub fn add(&mut self, scope: Scope, handler: MiddlewareHandler) {
        let seq = self.next_seq;
        self.next_seq += 1;

        match scope {
            Scope::Global => {
                debug!(seq = seq, "Global middleware registered");
                self.globals.push(Entry { seq, handler });
            }
            Scope::Route(id) => {
                debug!(seq = seq, route_id = %id, "Route middleware registered");
                self.scoped
                    .entry(id)
                    .or_default()
                    .push(Entry { seq, handler });
            }
            Scope::Routes(ids) => {
                for id in ids {
                    debug!(seq = seq, route_id = %id, "Route middleware registered");
                    self.scoped.entry(id).or_default().push(Entry {
                        seq,
                        handler: handler.clone(),
                    });
                }
            }
        }
    }

    /// Compose the chain for a route: all globals, then all entries scoped
    /// to it, each tier in registration order. Both lists append with an
    /// increasing counter, so they are already sorted by their order key.
    #[must_use]
    pub fn find(&self, route_id: &RouteId) -> MiddlewareChain {
        let mut handlers: Vec<MiddlewareHandler> =
            self.globals.iter().map(|e| e.handler.clone()).collect();
        if let Some(locals) = self.scoped.get(route_id) {
            handlers.extend(locals.iter().map(|e| e.handler.clone()));
        }
        MiddlewareChain { handlers }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.globals.is_empty() && self.scoped.is_empty()
    }
}

/// The composed, ordered chain for one route.
pub struct MiddlewareChain {
    handlers: Vec<MiddlewareHandler>,
}

impl MiddlewareChain {
    /// Run each handler in order against the shared context. Strictly
    /// sequential: a later handler may assume every earlier one has fully
    /// completed. The first `Err` aborts the chain.
    pub fn run(&self, ctx: &mut Context) -> Result<(), HttpError> {
        for handler in &self.handlers {
            handler(ctx)?;
        }
        Ok(())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}
