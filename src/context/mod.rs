//! Per-request execution context.
//!
//! Built once at dispatch start from the raw request, filled by the parser
//! (body/search/params against the route's schema set), mutated by
//! middleware and the handler, discarded after the response is assembled.
//! Owned exclusively by the single in-flight request.

mod parser;

pub use parser::coerce_scalar;

use std::sync::Arc;

use http::Method;
use serde_json::{json, Map, Value};

use crate::cookies::CookieJar;
use crate::error::HttpError;
use crate::headers::HeaderMap;
use crate::model::SchemaSet;
use crate::request::RawRequest;
use crate::response::{HttpResponse, Payload};

/// Mutable response state handlers and middleware write into: status,
/// reason override, header set and the outgoing cookie jar.
#[derive(Debug, Clone, Default)]
pub struct ResponseDraft {
    pub status: Option<u16>,
    pub status_text: Option<String>,
    pub headers: HeaderMap,
    pub cookies: CookieJar,
}

/// The execution context passed to middleware and the route handler.
///
/// `body`, `search` and `params` hold the parsed (and, when the route
/// declares schemas, validated) request data. `data` is an open slot for
/// middleware-to-handler communication; later chain entries see every
/// mutation earlier ones made.
#[derive(Debug)]
pub struct Context {
    req: Arc<RawRequest>,
    pub body: Value,
    pub search: Value,
    pub params: Value,
    pub data: Map<String, Value>,
    pub res: ResponseDraft,
}

impl Context {
    /// Context with empty body/search/params; the parser fills them next.
    #[must_use]
    pub fn from_request(req: Arc<RawRequest>) -> Self {
        Context {
            req,
            body: json!({}),
            search: json!({}),
            params: json!({}),
            data: Map::new(),
            res: ResponseDraft::default(),
        }
    }

    #[must_use]
    pub fn request(&self) -> &RawRequest {
        &self.req
    }

    #[must_use]
    pub fn method(&self) -> &Method {
        &self.req.method
    }

    #[must_use]
    pub fn path(&self) -> &str {
        &self.req.path
    }

    /// Request headers (read-only view).
    #[must_use]
    pub fn headers(&self) -> &HeaderMap {
        &self.req.headers
    }

    /// Request cookies (read-only view).
    #[must_use]
    pub fn cookies(&self) -> &CookieJar {
        &self.req.cookies
    }

    /// Run the three extractions against the route's schema set. Each kind
    /// validates independently, so an invalid body reports body issues even
    /// when params and search are fine.
    pub fn append_parsed_data(
        &mut self,
        template: &str,
        models: Option<&SchemaSet>,
    ) -> Result<(), HttpError> {
        self.body = parser::parse_body(&self.req, models.and_then(|m| m.body.as_ref()))?;
        self.search = parser::parse_search(
            self.req.query.as_deref(),
            models.and_then(|m| m.search.as_ref()),
        )?;
        self.params = parser::parse_params(
            template,
            &self.req.path,
            models.and_then(|m| m.params.as_ref()),
        )?;
        Ok(())
    }

    /// Fold the response draft and a handler payload into a response.
    #[must_use]
    pub fn into_response(self, payload: Payload) -> HttpResponse {
        HttpResponse {
            status: self.res.status,
            status_text: self.res.status_text,
            headers: self.res.headers,
            cookies: self.res.cookies,
            body: payload,
        }
    }
}
