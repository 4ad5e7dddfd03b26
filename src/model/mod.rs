//! Model registry: per-route schema sets behind the vendor-agnostic
//! [`Validator`] adapter.
//!
//! Routes declare up to four schemas (`body`, `search`, `params`,
//! `response`); the registry detects each schema's vendor once at
//! registration and interns compiled validators so that routes sharing a
//! schema share the compiled object.

mod validator;

pub use validator::{
    issues_to_error_message, CustomValidateFn, Issue, SchemaError, SchemaSource, Validator,
};

use std::collections::HashMap;

use serde_json::Value;
use tracing::debug;

use crate::router::RouteId;

/// Which of the four per-route schema slots an issue list belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaKind {
    Body,
    Search,
    Params,
    Response,
}

impl SchemaKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            SchemaKind::Body => "body",
            SchemaKind::Search => "search",
            SchemaKind::Params => "params",
            SchemaKind::Response => "response",
        }
    }
}

impl std::fmt::Display for SchemaKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The schemas a route declares at registration. All slots optional; an
/// absent slot means "accept input as-is".
#[derive(Default, Clone)]
pub struct RouteModel {
    pub body: Option<SchemaSource>,
    pub search: Option<SchemaSource>,
    pub params: Option<SchemaSource>,
    pub response: Option<SchemaSource>,
}

impl RouteModel {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn body(mut self, schema: impl Into<SchemaSource>) -> Self {
        self.body = Some(schema.into());
        self
    }

    #[must_use]
    pub fn search(mut self, schema: impl Into<SchemaSource>) -> Self {
        self.search = Some(schema.into());
        self
    }

    #[must_use]
    pub fn params(mut self, schema: impl Into<SchemaSource>) -> Self {
        self.params = Some(schema.into());
        self
    }

    #[must_use]
    pub fn response(mut self, schema: impl Into<SchemaSource>) -> Self {
        self.response = Some(schema.into());
        self
    }
}

/// Compiled per-route validators, one slot per [`SchemaKind`].
#[derive(Default, Clone)]
pub struct SchemaSet {
    pub body: Option<Validator>,
    pub search: Option<Validator>,
    pub params: Option<Validator>,
    pub response: Option<Validator>,
}

impl SchemaSet {
    #[must_use]
    pub fn get(&self, kind: SchemaKind) -> Option<&Validator> {
        match kind {
            SchemaKind::Body => self.body.as_ref(),
            SchemaKind::Search => self.search.as_ref(),
            SchemaKind::Params => self.params.as_ref(),
            SchemaKind::Response => self.response.as_ref(),
        }
    }
}

/// Stores compiled schema sets keyed by route id.
///
/// Populated during registration, read-only while serving. Document-backed
/// validators are interned by their whitespace-stripped JSON so identical
/// schemas compile once — an optimization, not a correctness requirement.
#[derive(Default)]
pub struct ModelRegistry {
    data: HashMap<RouteId, SchemaSet>,
    intern: HashMap<String, Validator>,
}

impl ModelRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Compile and store `model` for `route_id`. Vendor detection happens
    /// here; an unrecognizable schema fails registration.
    pub fn add(&mut self, route_id: RouteId, model: RouteModel) -> Result<(), SchemaError> {
        let set = SchemaSet {
            body: self.compile(model.body)?,
            search: self.compile(model.search)?,
            params: self.compile(model.params)?,
            response: self.compile(model.response)?,
        };
        debug!(route_id = %route_id, "Schema set registered");
        self.data.insert(route_id, set);
        Ok(())
    }

    #[must_use]
    pub fn find(&self, route_id: &RouteId) -> Option<&SchemaSet> {
        self.data.get(route_id)
    }

    fn compile(&mut self, source: Option<SchemaSource>) -> Result<Option<Validator>, SchemaError> {
        let source = match source {
            Some(source) => source,
            None => return Ok(None),
        };

        if let SchemaSource::Document(doc) = &source {
            let key = intern_key(doc);
            if let Some(existing) = self.intern.get(&key) {
                return Ok(Some(existing.clone()));
            }
            let validator = Validator::detect(source.clone())?;
            self.intern.insert(key, validator.clone());
            return Ok(Some(validator));
        }

        Validator::detect(source).map(Some)
    }
}

fn intern_key(doc: &Value) -> String {
    // serde_json's compact form already carries no insignificant whitespace
    doc.to_string()
}
