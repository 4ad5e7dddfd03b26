//! # Server Module
//!
//! The transport adapter: parses raw `may_minihttp` requests into
//! [`crate::request::RawRequest`], hands them to the dispatcher's single
//! entry point, and writes the assembled response back. The
//! [`HttpServer`] wrapper owns the bind/serve/shutdown lifecycle and its
//! before-listen/before-close hooks.

pub mod http_server;
pub mod request;
pub mod service;

pub use http_server::{HttpServer, ServerHandle};
pub use request::parse_request;
pub use service::{write_wire_response, AppService};
