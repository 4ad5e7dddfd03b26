//! # Strada
//!
//! **Strada** is a coroutine-powered HTTP request-dispatch core for Rust:
//! given an incoming request it resolves the matching route, builds a typed
//! execution context, runs an ordered middleware chain and the route
//! handler, validates input against user-declared schemas, and assembles a
//! wire-ready response.
//!
//! ## Architecture
//!
//! The library is organized into several key modules:
//!
//! - **[`router`]** - Route registration, pattern compilation and resolution
//!   with collision diagnostics
//! - **[`middleware`]** - Scoped middleware registry and ordered chain
//!   composition
//! - **[`model`]** - Schema registry with vendor-agnostic validation
//!   dispatch
//! - **[`context`]** - Per-request execution context and request parsing
//! - **[`response`]** - Response drafts and wire assembly
//! - **[`dispatcher`]** - The orchestrating entry point and error recovery
//! - **[`server`]** - HTTP transport on `may_minihttp` with lifecycle hooks
//! - **[`error`]** - The failure taxonomy threaded through the pipeline
//!
//! ## Request handling flow
//!
//! ```text
//! raw request
//!   → RouteRegistry::find          (404/405 on miss)
//!   → MiddlewareRegistry::find     (globals before route-scoped)
//!   → ModelRegistry::find          (body/search/params/response schemas)
//!   → Context::append_parsed_data  (content-type-driven parsing, 422 on
//!                                   schema rejection)
//!   → middleware chain             (sequential, may short-circuit)
//!   → route handler
//!   → response assembly            (content-type inference, Set-Cookie
//!                                   per outgoing cookie)
//! ```
//!
//! ## Quick start
//!
//! ```no_run
//! use std::sync::Arc;
//! use http::Method;
//! use serde_json::json;
//! use strada::dispatcher::Dispatcher;
//! use strada::model::RouteModel;
//! use strada::response::Reply;
//! use strada::router::Router;
//! use strada::runtime_config::RuntimeConfig;
//! use strada::server::HttpServer;
//!
//! let mut router = Router::new();
//! router
//!     .register(
//!         Method::GET,
//!         "/pets/:id",
//!         |ctx| Ok(Reply::json(json!({ "id": ctx.params["id"] }))),
//!         Some(RouteModel::new().params(json!({ "id": "number" }))),
//!     )
//!     .expect("route registration");
//!
//! let dispatcher = Arc::new(Dispatcher::new(router));
//! let server = HttpServer::new(dispatcher);
//! let handle = server
//!     .listen("0.0.0.0:8080", &RuntimeConfig::from_env())
//!     .expect("bind");
//! handle.join().unwrap();
//! ```
//!
//! ## Key architectural patterns
//!
//! 1. **Explicit router value**: registration and dispatch go through a
//!    [`router::Router`] you own and pass around — no ambient global state,
//!    and a throwaway router in a test is one line.
//! 2. **Freeze-then-serve**: registries are populated at startup and
//!    read-only while serving, so the request path takes no locks.
//! 3. **Coroutine-based concurrency**: one `may` coroutine per request;
//!    middleware and the handler run strictly sequentially within it.
//! 4. **Vendor-agnostic validation**: schema documents are probed
//!    structurally and adapted behind one `validate` contract.
//! 5. **Errors as kinds**: 404/405/422 are explicit variants the dispatcher
//!    matches on to pick a recovery handler — never bare exceptions.
//!
//! ## Runtime considerations
//!
//! Strada uses the `may` coroutine runtime, not tokio or async-std:
//!
//! - All handlers run in coroutines (lightweight threads)
//! - Stack size is configurable via the `STRADA_STACK_SIZE` environment
//!   variable
//! - Blocking operations should use `may`'s blocking facilities

pub mod context;
pub mod cookies;
pub mod dispatcher;
pub mod error;
pub mod headers;
pub mod ids;
pub mod middleware;
pub mod model;
pub mod request;
pub mod response;
pub mod router;
pub mod runtime_config;
pub mod server;

pub use context::Context;
pub use cookies::{Cookie, CookieJar};
pub use dispatcher::Dispatcher;
pub use error::HttpError;
pub use headers::HeaderMap;
pub use model::{RouteModel, SchemaKind, SchemaSource};
pub use request::RawRequest;
pub use response::{HttpResponse, Payload, Reply, WireResponse};
pub use router::{RouteId, Router};
