//! The orchestrating entry point: resolve route → build context → run
//! middleware → run handler → assemble response, with every failure mapped
//! to a configured recovery handler.
//!
//! State machine per request:
//! `Received → RouteResolved → ContextBuilt → MiddlewareRan → HandlerRan →
//! ResponseAssembled`, with `ErrorShortCircuit` reachable from any
//! non-terminal state. CORS preflights short-circuit right after `Received`,
//! bypassing routing entirely.
//!
//! Routing and validation failures are recovered locally (404/405/422 map to
//! their handlers); any other error reaches the generic error handler with
//! the status it declares, else 500. The user-visible failure is always a
//! structured response, never an escaped panic.

use std::sync::Arc;
use std::time::Instant;

use serde_json::json;
use tracing::{debug, error, info, warn};

use crate::context::Context;
use crate::error::HttpError;
use crate::ids::RequestId;
use crate::model::issues_to_error_message;
use crate::request::RawRequest;
use crate::response::{HttpResponse, Payload, Reply, WireResponse};
use crate::router::Router;

/// Maps non-routing errors to a response. Single-slot: the last registered
/// handler wins.
pub type ErrorHandler = Arc<dyn Fn(&HttpError) -> HttpResponse + Send + Sync>;

/// Maps a 404/405 to a response, with the offending request in hand.
pub type RecoveryHandler = Arc<dyn Fn(&RawRequest) -> HttpResponse + Send + Sync>;

/// Rewrites the final response before assembly. Single-slot.
pub type AfterResponseHandler = Arc<dyn Fn(HttpResponse) -> HttpResponse + Send + Sync>;

/// Request dispatcher over a frozen [`Router`].
///
/// Construction consumes the router; from then on the registries are
/// read-only and request handling needs no locking. Exposes exactly one
/// entry point, [`Dispatcher::handle`], which the transport adapter invokes
/// per request.
pub struct Dispatcher {
    router: Arc<Router>,
    on_error: ErrorHandler,
    on_not_found: RecoveryHandler,
    on_method_not_allowed: RecoveryHandler,
    after_response: Option<AfterResponseHandler>,
}

impl Dispatcher {
    #[must_use]
    pub fn new(router: Router) -> Self {
        Dispatcher {
            router: Arc::new(router),
            on_error: Arc::new(default_error),
            on_not_found: Arc::new(default_not_found),
            on_method_not_allowed: Arc::new(default_method_not_allowed),
            after_response: None,
        }
    }

    #[must_use]
    pub fn router(&self) -> &Router {
        &self.router
    }

    /// Override the generic error handler. Last registration wins.
    pub fn set_on_error(&mut self, handler: ErrorHandler) {
        self.on_error = handler;
    }

    /// Override the 404 handler. Last registration wins.
    pub fn set_on_not_found(&mut self, handler: RecoveryHandler) {
        self.on_not_found = handler;
    }

    /// Override the 405 handler. Last registration wins.
    pub fn set_on_method_not_allowed(&mut self, handler: RecoveryHandler) {
        self.on_method_not_allowed = handler;
    }

    /// Install the after-response hook. Last registration wins; there is no
    /// chaining.
    pub fn set_on_after_response(&mut self, handler: AfterResponseHandler) {
        self.after_response = Some(handler);
    }

    /// Dispatch one request to a wire-ready response. Never fails: every
    /// error path resolves through a recovery handler.
    pub fn handle(&self, req: RawRequest) -> WireResponse {
        let req = Arc::new(req);
        let request_id = RequestId::from_header_or_new(req.headers.get("x-request-id"));
        let start = Instant::now();

        debug!(
            request_id = %request_id,
            method = %req.method,
            path = %req.path,
            "Request received"
        );

        let response = match self.run_pipeline(&req, request_id) {
            Ok(response) => response,
            Err(err) => {
                debug!(
                    request_id = %request_id,
                    status = err.status(),
                    error = %err,
                    "Error short-circuit"
                );
                self.recover(&req, &err)
            }
        };

        let response = match &self.after_response {
            Some(hook) => hook(response),
            None => response,
        };

        match response.assemble() {
            Ok(wire) => {
                info!(
                    request_id = %request_id,
                    method = %req.method,
                    path = %req.path,
                    status = wire.status,
                    latency_ms = start.elapsed().as_millis() as u64,
                    "Response assembled"
                );
                wire
            }
            Err(err) => {
                error!(
                    request_id = %request_id,
                    error = %err,
                    "Response assembly refused the body"
                );
                let fallback = (self.on_error)(&err);
                fallback.assemble().unwrap_or_else(|_| last_resort_response())
            }
        }
    }

    fn run_pipeline(
        &self,
        req: &Arc<RawRequest>,
        request_id: RequestId,
    ) -> Result<HttpResponse, HttpError> {
        if req.is_preflight() {
            debug!(request_id = %request_id, "Preflight short-circuit");
            return Ok(HttpResponse::new(Payload::Value("Departed".into())));
        }

        let route = self.router.find_route(&req.method, &req.path)?;
        debug!(
            request_id = %request_id,
            route_id = %route.id,
            "Route resolved"
        );

        let models = self.router.find_model(&route.id);
        let mut ctx = Context::from_request(Arc::clone(req));
        ctx.append_parsed_data(&route.template, models)?;
        debug!(request_id = %request_id, route_id = %route.id, "Context built");

        let chain = self.router.find_middleware(&route.id);
        chain.run(&mut ctx)?;
        debug!(
            request_id = %request_id,
            middleware_count = chain.len(),
            "Middleware ran"
        );

        let reply = (route.handler)(&mut ctx)?;
        debug!(request_id = %request_id, route_id = %route.id, "Handler ran");

        // Response-kind validation is a server fault when it fails, not a
        // client 422; only bare JSON payloads are checked.
        if let Some(validator) = models.and_then(|m| m.response.as_ref()) {
            if let Reply::Payload(Payload::Value(value)) = &reply {
                if let Err(issues) = validator.validate(value) {
                    warn!(
                        request_id = %request_id,
                        route_id = %route.id,
                        issue_count = issues.len(),
                        "Response failed its declared schema"
                    );
                    return Err(HttpError::internal_server_error(issues_to_error_message(
                        &issues,
                    )));
                }
            }
        }

        Ok(match reply {
            Reply::Response(response) => response,
            Reply::Payload(payload) => ctx.into_response(payload),
        })
    }

    fn recover(&self, req: &RawRequest, err: &HttpError) -> HttpResponse {
        match err {
            HttpError::NotFound => (self.on_not_found)(req),
            HttpError::MethodNotAllowed => (self.on_method_not_allowed)(req),
            other => (self.on_error)(other),
        }
    }
}

fn default_not_found(req: &RawRequest) -> HttpResponse {
    HttpResponse::json(
        404,
        json!({
            "error": true,
            "message": format!("{} on {} does not exist.", req.method, req.path),
        }),
    )
}

fn default_method_not_allowed(req: &RawRequest) -> HttpResponse {
    HttpResponse::json(
        405,
        json!({ "error": format!("{} does not exist.", req.method) }),
    )
}

fn default_error(err: &HttpError) -> HttpResponse {
    HttpResponse::json(err.status(), err.to_payload())
}

fn last_resort_response() -> WireResponse {
    let mut headers = crate::headers::HeaderMap::new();
    headers.set("Content-Type", "application/json");
    WireResponse {
        status: 500,
        reason: "Internal Server Error".to_string(),
        headers,
        body: br#"{"error":true,"message":"Internal Server Error"}"#.to_vec(),
    }
}
