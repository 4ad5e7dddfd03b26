//! Error taxonomy for the dispatch pipeline.
//!
//! Routing and validation failures are explicit kinds, not opaque panics:
//! the dispatcher matches on the kind to pick the right recovery handler
//! (404/405/422), and everything else flows to the generic error handler
//! with the status the error declares.

use std::fmt;

use serde_json::{json, Value};

use crate::model::{issues_to_error_message, Issue, SchemaKind};

/// A failure produced anywhere between route resolution and response
/// assembly. User handlers and middleware return these to short-circuit.
#[derive(Debug, Clone)]
pub enum HttpError {
    /// No registered route matches the request path.
    NotFound,
    /// A route matches the path but not the method.
    MethodNotAllowed,
    /// A declared schema rejected the extracted body/search/params.
    Validation {
        kind: SchemaKind,
        issues: Vec<Issue>,
    },
    /// The request carries a content type the parser refuses to guess at.
    UnsupportedContentType,
    /// The handler returned a payload the assembler refuses to serialize.
    UnsupportedResponseBody { kind: &'static str },
    /// Any other failure, with the status it wants to surface as.
    Handler {
        status: u16,
        message: String,
        data: Option<Value>,
    },
}

impl HttpError {
    #[must_use]
    pub fn not_found() -> Self {
        HttpError::NotFound
    }

    #[must_use]
    pub fn method_not_allowed() -> Self {
        HttpError::MethodNotAllowed
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        HttpError::with_status(400, message)
    }

    pub fn unprocessable_entity(message: impl Into<String>) -> Self {
        HttpError::with_status(422, message)
    }

    pub fn internal_server_error(message: impl Into<String>) -> Self {
        HttpError::with_status(500, message)
    }

    pub fn with_status(status: u16, message: impl Into<String>) -> Self {
        HttpError::Handler {
            status,
            message: message.into(),
            data: None,
        }
    }

    pub fn with_data(status: u16, message: impl Into<String>, data: Value) -> Self {
        HttpError::Handler {
            status,
            message: message.into(),
            data: Some(data),
        }
    }

    #[must_use]
    pub fn validation(kind: SchemaKind, issues: Vec<Issue>) -> Self {
        HttpError::Validation { kind, issues }
    }

    /// The HTTP status this error surfaces as.
    #[must_use]
    pub fn status(&self) -> u16 {
        match self {
            HttpError::NotFound => 404,
            HttpError::MethodNotAllowed => 405,
            HttpError::Validation { .. } | HttpError::UnsupportedContentType => 422,
            HttpError::UnsupportedResponseBody { .. } => 500,
            HttpError::Handler { status, .. } => *status,
        }
    }

    #[must_use]
    pub fn is_status(&self, status: u16) -> bool {
        self.status() == status
    }

    /// The user-visible message. Validation issues join into one line per
    /// issue, `<dotted.path>: <message>`.
    #[must_use]
    pub fn message(&self) -> String {
        match self {
            HttpError::NotFound => "Not Found".to_string(),
            HttpError::MethodNotAllowed => "Method Not Allowed".to_string(),
            HttpError::Validation { issues, .. } => issues_to_error_message(issues),
            HttpError::UnsupportedContentType => "unprocessable.contentType".to_string(),
            HttpError::UnsupportedResponseBody { kind } => {
                format!("Unsupported response body: {kind}")
            }
            HttpError::Handler { message, .. } => message.clone(),
        }
    }

    /// JSON body for the default error response:
    /// `{"error": true, "message": ...}`, with `error` replaced by attached
    /// data when the error carries some.
    #[must_use]
    pub fn to_payload(&self) -> Value {
        match self {
            HttpError::Handler {
                data: Some(data), ..
            } => json!({ "error": data, "message": self.message() }),
            _ => json!({ "error": true, "message": self.message() }),
        }
    }
}

impl fmt::Display for HttpError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.status(), self.message())
    }
}

impl std::error::Error for HttpError {}
