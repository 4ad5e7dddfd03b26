//! Route registry: registration-order storage, request lookup, and
//! best-effort collision diagnostics.
//!
//! Lookup semantics are deliberate and test-pinned:
//! - the scan honors registration order, so the first-registered template
//!   wins among ambiguous matches (a parameterized route registered before a
//!   literal one shadows it);
//! - a matched path with the wrong method is 405, never 404;
//! - a route whose trailing segment is a parameter still matches when that
//!   value is omitted entirely, so the miss becomes a 422 downstream instead
//!   of a 404 — while a missing non-trailing parameter stays a 404.

use std::collections::HashMap;
use std::sync::Arc;

use http::Method;
use regex::Regex;
use tracing::{debug, info, warn};

use super::pattern::{compile_pattern, has_param, has_trailing_param, strip_last_segment, RouteId};
use crate::context::Context;
use crate::error::HttpError;
use crate::response::Reply;

/// A registered request handler: receives the per-request context, returns
/// a payload or a fully-built response, or an error to short-circuit.
pub type RouteHandler = Arc<dyn Fn(&mut Context) -> Result<Reply, HttpError> + Send + Sync>;

/// One registered route with its compiled matcher.
#[derive(Clone)]
pub struct Route {
    pub id: RouteId,
    pub method: Method,
    pub template: String,
    pub pattern: Regex,
    pub param_names: Vec<String>,
    pub handler: RouteHandler,
}

impl std::fmt::Debug for Route {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Route")
            .field("id", &self.id)
            .field("method", &self.method)
            .field("template", &self.template)
            .field("pattern", &self.pattern)
            .field("param_names", &self.param_names)
            .field("handler", &"<handler>")
            .finish()
    }
}

impl Route {
    pub fn new(method: Method, template: impl Into<String>, handler: RouteHandler) -> Self {
        let template = template.into();
        let (pattern, param_names) = compile_pattern(&template);
        Route {
            id: RouteId::new(&method, &template),
            method,
            template,
            pattern,
            param_names,
            handler,
        }
    }
}

/// Registration-order route table.
#[derive(Default)]
pub struct RouteRegistry {
    entries: Vec<Arc<Route>>,
    by_id: HashMap<RouteId, usize>,
    /// Generalized path variants of every registered template (each segment,
    /// in turn, replaced with a parameter placeholder). Keeps collision
    /// probing proportional to the new route, not the whole history.
    possibles: Vec<String>,
    collisions: usize,
}

impl RouteRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// `(method, template)` pairs in registration order.
    #[must_use]
    pub fn list(&self) -> Vec<(String, String)> {
        self.entries
            .iter()
            .map(|r| (r.method.to_string(), r.template.clone()))
            .collect()
    }

    /// Number of collision diagnostics emitted so far.
    #[must_use]
    pub fn collisions_detected(&self) -> usize {
        self.collisions
    }

    /// Register a route. Collisions are diagnosed and logged, never
    /// rejected: matching stays first-registered-wins regardless.
    pub fn add(&mut self, route: Route) {
        let new_collisions = self.diagnose_collisions(&route);
        self.collisions += new_collisions;
        self.add_possible_variants(&route.template);

        info!(
            route_id = %route.id,
            method = %route.method,
            template = %route.template,
            "Route registered"
        );

        let index = self.entries.len();
        self.by_id.insert(route.id.clone(), index);
        self.entries.push(Arc::new(route));
    }

    /// Resolve a request path to a route.
    ///
    /// The scan walks registration order; parameterized templates try their
    /// pattern, then the trailing-param leniency; static templates compare
    /// case-insensitively. Method is only checked after a path match, so a
    /// wrong-method hit is `MethodNotAllowed` rather than `NotFound`.
    pub fn find(&self, method: &Method, pathname: &str) -> Result<Arc<Route>, HttpError> {
        debug!(method = %method, path = %pathname, "Route match attempt");

        let matched = self.entries.iter().find(|route| {
            if has_param(&route.template) {
                if route.pattern.is_match(pathname) {
                    return true;
                }
                // Trailing param omitted entirely: /items/:id matches /items
                // (and /items/), leaving the miss to params validation.
                has_trailing_param(&route.template)
                    && strip_last_segment(&route.template)
                        .eq_ignore_ascii_case(pathname.trim_end_matches('/'))
            } else {
                route.template.eq_ignore_ascii_case(pathname)
            }
        });

        let route = match matched {
            Some(route) => route,
            None => {
                debug!(method = %method, path = %pathname, "No route matched");
                return Err(HttpError::not_found());
            }
        };

        if !route
            .method
            .as_str()
            .eq_ignore_ascii_case(method.as_str())
        {
            debug!(
                method = %method,
                path = %pathname,
                route_id = %route.id,
                "Path matched but method differs"
            );
            return Err(HttpError::method_not_allowed());
        }

        debug!(
            method = %method,
            path = %pathname,
            route_id = %route.id,
            template = %route.template,
            "Route matched"
        );
        Ok(route.clone())
    }

    /// Probe a pathname the way `find` does, ignoring method, for collision
    /// diagnostics. The probe strings carry `:` placeholders on purpose —
    /// they exercise the registered patterns.
    fn probe_path(&self, pathname: &str) -> Option<&Arc<Route>> {
        self.entries.iter().find(|route| {
            if has_param(&route.template) {
                route.pattern.is_match(pathname)
                    || (has_trailing_param(&route.template)
                        && strip_last_segment(&route.template)
                            .eq_ignore_ascii_case(pathname.trim_end_matches('/')))
            } else {
                route.template.eq_ignore_ascii_case(pathname)
            }
        })
    }

    fn diagnose_collisions(&self, route: &Route) -> usize {
        let mut count = 0;

        if self.by_id.contains_key(&route.id) {
            warn!(
                route_id = %route.id,
                template = %route.template,
                "Collision: route id already registered; first registration keeps precedence"
            );
            count += 1;
        }

        let mut flagged: Vec<&str> = Vec::new();
        for possible in &self.possibles {
            if possible == &route.template {
                continue;
            }
            let Some(similar) = self.probe_path(possible) else {
                continue;
            };
            if similar.method != route.method
                || similar.template == route.template
                || flagged.contains(&similar.template.as_str())
                || !paths_collide(&route.template, &similar.template)
            {
                continue;
            }
            warn!(
                existing = %similar.template,
                added = %route.template,
                method = %route.method,
                "Possible collision: register the more specific route first to avoid shadowing"
            );
            flagged.push(&similar.template);
            count += 1;
        }

        // A new static route can already be reachable through an earlier
        // pattern; say so even when the shapes differ (trailing leniency).
        if flagged.is_empty() {
            if let Some(existing) = self.probe_path(&route.template) {
                if existing.method == route.method && existing.template != route.template {
                    warn!(
                        existing = %existing.template,
                        added = %route.template,
                        method = %route.method,
                        "Possible collision: route is shadowed by an earlier registration"
                    );
                    count += 1;
                }
            }
        }

        count
    }

    fn add_possible_variants(&mut self, template: &str) {
        if !self.possibles.iter().any(|p| p == template) {
            self.possibles.push(template.to_string());
        }

        let parts: Vec<&str> = template.split('/').filter(|p| !p.is_empty()).collect();
        for i in 0..parts.len() {
            let mut variation = parts.clone();
            let generalized;
            if !variation[i].starts_with(':') {
                generalized = format!(":{}", variation[i]);
                variation[i] = &generalized;
            }
            let possible = format!("/{}", variation.join("/"));
            if !self.possibles.iter().any(|p| p == &possible) {
                self.possibles.push(possible);
            }
        }
    }
}

/// Two templates collide when they have the same segment count and differ
/// only where at least one side is a parameter.
fn paths_collide(a: &str, b: &str) -> bool {
    let parts_a: Vec<&str> = a.split('/').filter(|p| !p.is_empty()).collect();
    let parts_b: Vec<&str> = b.split('/').filter(|p| !p.is_empty()).collect();

    if parts_a.len() != parts_b.len() {
        return false;
    }

    parts_a.iter().zip(&parts_b).all(|(pa, pb)| {
        pa.starts_with(':') || pb.starts_with(':') || pa == pb
    })
}
