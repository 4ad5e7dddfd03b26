//! Response draft and wire assembly.
//!
//! Handlers either return a bare [`Payload`] (rendered against the
//! context's response draft) or a fully-built [`HttpResponse`]. Assembly
//! resolves status, reason text, cookie headers and the body bytes into a
//! [`WireResponse`] ready for the transport layer.

use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::Value;

use crate::cookies::{Cookie, CookieJar};
use crate::error::HttpError;
use crate::headers::HeaderMap;

/// What a handler produced as a body, before serialization.
///
/// Bytes, form blobs and streams exist so the assembler can refuse them
/// explicitly: the framework does not guess a serialization for binary-ish
/// values.
#[derive(Debug, Clone)]
pub enum Payload {
    /// Renders as an empty string.
    Empty,
    /// A JSON value: scalars stringify as `text/plain`, objects and arrays
    /// serialize as `application/json`.
    Value(Value),
    /// Renders as an ISO-8601 string.
    Timestamp(DateTime<Utc>),
    /// Refused: `UnsupportedResponseBody`.
    Bytes(Vec<u8>),
    /// Refused: `UnsupportedResponseBody`.
    Form(Vec<(String, String)>),
    /// Refused: `UnsupportedResponseBody`.
    Stream,
}

/// A handler's result: bare data, or a response built from scratch.
pub enum Reply {
    Payload(Payload),
    Response(HttpResponse),
}

impl Reply {
    #[must_use]
    pub fn empty() -> Self {
        Reply::Payload(Payload::Empty)
    }

    #[must_use]
    pub fn json(value: Value) -> Self {
        Reply::Payload(Payload::Value(value))
    }

    pub fn text(value: impl Into<String>) -> Self {
        Reply::Payload(Payload::Value(Value::String(value.into())))
    }

    #[must_use]
    pub fn timestamp(value: DateTime<Utc>) -> Self {
        Reply::Payload(Payload::Timestamp(value))
    }
}

impl From<HttpResponse> for Reply {
    fn from(response: HttpResponse) -> Self {
        Reply::Response(response)
    }
}

impl From<Payload> for Reply {
    fn from(payload: Payload) -> Self {
        Reply::Payload(payload)
    }
}

/// Default reason phrases for commonly produced statuses. Anything else
/// reads "Unknown".
#[must_use]
pub fn default_status_text(status: u16) -> &'static str {
    match status {
        200 => "OK",
        201 => "Created",
        204 => "No Content",
        301 => "Moved Permanently",
        302 => "Found",
        303 => "See Other",
        307 => "Temporary Redirect",
        308 => "Permanent Redirect",
        400 => "Bad Request",
        401 => "Unauthorized",
        403 => "Forbidden",
        404 => "Not Found",
        500 => "Internal Server Error",
        _ => "Unknown",
    }
}

/// A response under construction: optional status/reason overrides, header
/// set, outgoing cookie jar and the unrendered body.
pub struct HttpResponse {
    pub status: Option<u16>,
    pub status_text: Option<String>,
    pub headers: HeaderMap,
    pub cookies: CookieJar,
    pub body: Payload,
}

impl HttpResponse {
    #[must_use]
    pub fn new(body: Payload) -> Self {
        HttpResponse {
            status: None,
            status_text: None,
            headers: HeaderMap::new(),
            cookies: CookieJar::new(),
            body,
        }
    }

    #[must_use]
    pub fn json(status: u16, body: Value) -> Self {
        HttpResponse::new(Payload::Value(body)).with_status(status)
    }

    pub fn text(status: u16, body: impl Into<String>) -> Self {
        HttpResponse::new(Payload::Value(Value::String(body.into()))).with_status(status)
    }

    #[must_use]
    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_status_text(mut self, text: impl Into<String>) -> Self {
        self.status_text = Some(text.into());
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.set(name, value);
        self
    }

    #[must_use]
    pub fn with_cookie(mut self, cookie: Cookie) -> Self {
        self.cookies.set(cookie);
        self
    }

    /// 302 redirect to `url`.
    pub fn redirect(url: impl Into<String>) -> Self {
        HttpResponse::new(Payload::Empty)
            .with_status(302)
            .with_status_text(default_status_text(302))
            .with_header("Location", url.into())
    }

    /// 301 redirect.
    pub fn permanent_redirect(url: impl Into<String>) -> Self {
        Self::redirect(url).with_status(301).with_status_text(default_status_text(301))
    }

    /// 307 redirect.
    pub fn temporary_redirect(url: impl Into<String>) -> Self {
        Self::redirect(url).with_status(307).with_status_text(default_status_text(307))
    }

    /// 303 redirect.
    pub fn see_other(url: impl Into<String>) -> Self {
        Self::redirect(url).with_status(303).with_status_text(default_status_text(303))
    }

    /// Resolve the final status, reason, headers and body bytes.
    ///
    /// Appends one `Set-Cookie` line per outgoing cookie, renders the body
    /// (inferring `Content-Type` unless one was set to something other than
    /// the `text/plain` default), then resolves status: explicit value, else
    /// 302 when a `Location` header is present, else 200.
    pub fn assemble(self) -> Result<WireResponse, HttpError> {
        let mut headers = self.headers;

        for line in self.cookies.to_set_cookie_headers() {
            headers.append("Set-Cookie", line);
        }

        let body = render_body(self.body, &mut headers)?;

        let status = match self.status {
            Some(status) => status,
            None if headers.has("Location") => 302,
            None => 200,
        };
        let reason = self
            .status_text
            .unwrap_or_else(|| default_status_text(status).to_string());

        Ok(WireResponse {
            status,
            reason,
            headers,
            body,
        })
    }
}

/// Write `Content-Type` unless one is already set to something other than
/// the `text/plain` default.
fn set_content_type(headers: &mut HeaderMap, value: &str) {
    match headers.get("Content-Type") {
        None | Some("text/plain") => headers.set("Content-Type", value),
        Some(_) => {}
    }
}

fn render_body(payload: Payload, headers: &mut HeaderMap) -> Result<Vec<u8>, HttpError> {
    match payload {
        Payload::Empty | Payload::Value(Value::Null) => {
            set_content_type(headers, "text/plain");
            Ok(Vec::new())
        }
        Payload::Value(Value::String(s)) => {
            set_content_type(headers, "text/plain");
            Ok(s.into_bytes())
        }
        Payload::Value(value @ (Value::Bool(_) | Value::Number(_))) => {
            set_content_type(headers, "text/plain");
            Ok(value.to_string().into_bytes())
        }
        Payload::Value(value) => {
            set_content_type(headers, "application/json");
            serde_json::to_vec(&value)
                .map_err(|e| HttpError::internal_server_error(e.to_string()))
        }
        Payload::Timestamp(ts) => {
            set_content_type(headers, "text/plain");
            Ok(ts
                .to_rfc3339_opts(SecondsFormat::Millis, true)
                .into_bytes())
        }
        Payload::Bytes(_) => Err(HttpError::UnsupportedResponseBody { kind: "bytes" }),
        Payload::Form(_) => Err(HttpError::UnsupportedResponseBody { kind: "form-data" }),
        Payload::Stream => Err(HttpError::UnsupportedResponseBody { kind: "stream" }),
    }
}

/// The final artifact for the transport layer: status, reason phrase, full
/// header list (cookies already appended) and rendered body bytes.
#[derive(Debug, Clone)]
pub struct WireResponse {
    pub status: u16,
    pub reason: String,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}
