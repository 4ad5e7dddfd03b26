//! Vendor adapter for schema validation.
//!
//! Schemas arrive from heterogeneous sources: full JSON Schema documents,
//! compact field-rule maps, or user closures. One factory probes the document
//! structurally and picks the vendor; call sites only ever see
//! [`Validator::validate`]. Vendor-specific branches never leak past this
//! module.

use std::fmt;
use std::sync::Arc;

use serde_json::Value;

/// One structured validation failure: the path into the offending value and
/// a human-readable message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Issue {
    pub path: Vec<String>,
    pub message: String,
}

impl Issue {
    pub fn new(path: Vec<String>, message: impl Into<String>) -> Self {
        Issue {
            path,
            message: message.into(),
        }
    }

    /// Issue with no path, used when the failure concerns the whole value.
    pub fn root(message: impl Into<String>) -> Self {
        Issue::new(Vec::new(), message)
    }
}

/// Join issues into one message, one line per issue, each line
/// `<dotted.path>: <message>` — or the bare message when the issue carries
/// no path.
#[must_use]
pub fn issues_to_error_message(issues: &[Issue]) -> String {
    issues
        .iter()
        .map(|issue| {
            if issue.path.is_empty() {
                issue.message.clone()
            } else {
                format!("{}: {}", issue.path.join("."), issue.message)
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// User-supplied validation function: the third vendor.
pub type CustomValidateFn = dyn Fn(&Value) -> Result<Value, Vec<Issue>> + Send + Sync;

/// A schema handed to route registration, before vendor detection.
#[derive(Clone)]
pub enum SchemaSource {
    /// A schema document of unknown vendor, probed structurally.
    Document(Value),
    /// A validation closure, used as-is.
    Function(Arc<CustomValidateFn>),
}

impl SchemaSource {
    pub fn function<F>(f: F) -> Self
    where
        F: Fn(&Value) -> Result<Value, Vec<Issue>> + Send + Sync + 'static,
    {
        SchemaSource::Function(Arc::new(f))
    }
}

impl From<Value> for SchemaSource {
    fn from(doc: Value) -> Self {
        SchemaSource::Document(doc)
    }
}

/// Registration-time schema failure. Request handling never sees these.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaError {
    /// The document matches no known vendor's structure.
    UnrecognizedSchema,
    /// A document with JSON Schema markers failed to compile.
    InvalidJsonSchema { detail: String },
    /// A field-rule map contains a rule string no vendor understands.
    InvalidFieldRule { field: String, rule: String },
}

impl fmt::Display for SchemaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SchemaError::UnrecognizedSchema => {
                write!(f, "schema does not match any supported validation vendor")
            }
            SchemaError::InvalidJsonSchema { detail } => {
                write!(f, "invalid JSON Schema document: {detail}")
            }
            SchemaError::InvalidFieldRule { field, rule } => {
                write!(f, "invalid field rule for '{field}': '{rule}'")
            }
        }
    }
}

impl std::error::Error for SchemaError {}

/// Structural markers that identify a JSON Schema document.
const JSON_SCHEMA_MARKERS: &[&str] = &[
    "$schema",
    "$ref",
    "$defs",
    "type",
    "properties",
    "items",
    "required",
    "enum",
    "const",
    "allOf",
    "anyOf",
    "oneOf",
    "not",
    "additionalProperties",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RuleKind {
    Number,
    String,
    Boolean,
    Any,
}

impl RuleKind {
    fn as_str(self) -> &'static str {
        match self {
            RuleKind::Number => "number",
            RuleKind::String => "string",
            RuleKind::Boolean => "boolean",
            RuleKind::Any => "any",
        }
    }

    fn accepts(self, value: &Value) -> bool {
        match self {
            RuleKind::Number => value.is_number(),
            RuleKind::String => value.is_string(),
            RuleKind::Boolean => value.is_boolean(),
            RuleKind::Any => true,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct FieldRule {
    kind: RuleKind,
    optional: bool,
}

fn parse_field_rule(rule: &str) -> Option<FieldRule> {
    let (name, optional) = match rule.strip_suffix('?') {
        Some(base) => (base, true),
        None => (rule, false),
    };
    let kind = match name {
        "number" => RuleKind::Number,
        "string" => RuleKind::String,
        "boolean" => RuleKind::Boolean,
        "any" => RuleKind::Any,
        _ => return None,
    };
    Some(FieldRule { kind, optional })
}

/// Compiled field-rule map: `{"id": "number", "note": "string?"}`.
#[derive(Debug, Clone)]
pub struct FieldRuleSet {
    rules: Vec<(String, FieldRule)>,
}

impl FieldRuleSet {
    fn validate(&self, input: &Value) -> Result<Value, Vec<Issue>> {
        let obj = match input.as_object() {
            Some(obj) => obj,
            None => return Err(vec![Issue::root("expected an object")]),
        };

        let mut issues = Vec::new();
        for (field, rule) in &self.rules {
            match obj.get(field) {
                None | Some(Value::Null) => {
                    if !rule.optional {
                        issues.push(Issue::new(vec![field.clone()], "is required"));
                    }
                }
                Some(value) => {
                    if !rule.kind.accepts(value) {
                        issues.push(Issue::new(
                            vec![field.clone()],
                            format!("expected {}", rule.kind.as_str()),
                        ));
                    }
                }
            }
        }

        if issues.is_empty() {
            Ok(input.clone())
        } else {
            Err(issues)
        }
    }
}

/// Normalized validator: one variant per supported vendor, all behind a
/// single `validate` signature.
#[derive(Clone)]
pub enum Validator {
    /// JSON Schema document compiled with the `jsonschema` crate.
    JsonSchema(Arc<jsonschema::Validator>),
    /// Compact field-rule map compiled in-crate.
    FieldRules(Arc<FieldRuleSet>),
    /// User-supplied closure.
    Custom(Arc<CustomValidateFn>),
}

impl fmt::Debug for Validator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Validator::JsonSchema(_) => f.write_str("Validator::JsonSchema"),
            Validator::FieldRules(rules) => write!(f, "Validator::FieldRules({rules:?})"),
            Validator::Custom(_) => f.write_str("Validator::Custom"),
        }
    }
}

impl Validator {
    /// Detect the vendor of `source` and build the matching variant.
    ///
    /// Detection is structural: a document carrying JSON Schema markers goes
    /// to the `jsonschema` engine; an object whose values are all rule
    /// strings compiles as a field-rule set; anything else is rejected at
    /// registration time.
    pub fn detect(source: SchemaSource) -> Result<Self, SchemaError> {
        let doc = match source {
            SchemaSource::Function(f) => return Ok(Validator::Custom(f)),
            SchemaSource::Document(doc) => doc,
        };

        let obj = match doc.as_object() {
            Some(obj) => obj,
            None => return Err(SchemaError::UnrecognizedSchema),
        };

        if obj.keys().any(|k| JSON_SCHEMA_MARKERS.contains(&k.as_str())) {
            let compiled = jsonschema::validator_for(&doc)
                .map_err(|e| SchemaError::InvalidJsonSchema {
                    detail: e.to_string(),
                })?;
            return Ok(Validator::JsonSchema(Arc::new(compiled)));
        }

        if !obj.is_empty() && obj.values().all(Value::is_string) {
            let mut rules = Vec::with_capacity(obj.len());
            for (field, rule) in obj {
                let rule_str = rule.as_str().unwrap_or_default();
                match parse_field_rule(rule_str) {
                    Some(parsed) => rules.push((field.clone(), parsed)),
                    None => {
                        return Err(SchemaError::InvalidFieldRule {
                            field: field.clone(),
                            rule: rule_str.to_string(),
                        })
                    }
                }
            }
            return Ok(Validator::FieldRules(Arc::new(FieldRuleSet { rules })));
        }

        Err(SchemaError::UnrecognizedSchema)
    }

    /// Validate `input`, returning the accepted value or the issue list.
    pub fn validate(&self, input: &Value) -> Result<Value, Vec<Issue>> {
        match self {
            Validator::JsonSchema(compiled) => {
                let issues: Vec<Issue> = compiled
                    .iter_errors(input)
                    .map(|err| {
                        let path: Vec<String> = err
                            .instance_path()
                            .to_string()
                            .split('/')
                            .filter(|s| !s.is_empty())
                            .map(str::to_string)
                            .collect();
                        Issue::new(path, err.to_string())
                    })
                    .collect();
                if issues.is_empty() {
                    Ok(input.clone())
                } else {
                    Err(issues)
                }
            }
            Validator::FieldRules(rules) => rules.validate(input),
            Validator::Custom(f) => f(input),
        }
    }

    /// Whether two validators share the same compiled vendor object.
    /// Interned validators compare true; `Custom` compares by closure
    /// identity.
    #[must_use]
    pub fn ptr_eq(&self, other: &Validator) -> bool {
        match (self, other) {
            (Validator::JsonSchema(a), Validator::JsonSchema(b)) => Arc::ptr_eq(a, b),
            (Validator::FieldRules(a), Validator::FieldRules(b)) => Arc::ptr_eq(a, b),
            (Validator::Custom(a), Validator::Custom(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_detects_json_schema_document() {
        let v = Validator::detect(json!({"type": "object"}).into()).unwrap();
        assert!(matches!(v, Validator::JsonSchema(_)));
    }

    #[test]
    fn test_detects_field_rules_document() {
        let v = Validator::detect(json!({"id": "number", "note": "string?"}).into()).unwrap();
        assert!(matches!(v, Validator::FieldRules(_)));
    }

    #[test]
    fn test_rejects_unrecognized_document() {
        assert_eq!(
            Validator::detect(json!(["not", "a", "schema"]).into()).unwrap_err(),
            SchemaError::UnrecognizedSchema
        );
        assert!(matches!(
            Validator::detect(json!({"id": "integer-ish"}).into()).unwrap_err(),
            SchemaError::InvalidFieldRule { .. }
        ));
    }

    #[test]
    fn test_field_rules_validation() {
        let v = Validator::detect(json!({"id": "number", "note": "string?"}).into()).unwrap();
        assert!(v.validate(&json!({"id": 7})).is_ok());

        let issues = v.validate(&json!({"note": "x"})).unwrap_err();
        assert_eq!(issues, vec![Issue::new(vec!["id".into()], "is required")]);

        let issues = v.validate(&json!({"id": "7"})).unwrap_err();
        assert_eq!(issues[0].path, vec!["id".to_string()]);
    }

    #[test]
    fn test_vendors_agree_on_equivalent_constraint() {
        let rules = Validator::detect(json!({"amount": "number"}).into()).unwrap();
        let schema = Validator::detect(
            json!({
                "type": "object",
                "properties": {"amount": {"type": "number"}},
                "required": ["amount"]
            })
            .into(),
        )
        .unwrap();

        let good = json!({"amount": 10});
        let bad = json!({"amount": "ten"});
        assert!(rules.validate(&good).is_ok());
        assert!(schema.validate(&good).is_ok());
        assert!(rules.validate(&bad).is_err());
        assert!(schema.validate(&bad).is_err());
    }

    #[test]
    fn test_issue_message_formatting() {
        let issues = vec![
            Issue::new(vec!["user".into(), "age".into()], "expected number"),
            Issue::root("unexpected input"),
        ];
        assert_eq!(
            issues_to_error_message(&issues),
            "user.age: expected number\nunexpected input"
        );
    }
}
