//! Path template compilation.
//!
//! Templates are flat `/`-delimited segment sequences where a `:name`
//! segment is a single-segment parameter. No multi-segment wildcards,
//! optional segments or inline regexes.

use http::Method;
use regex::Regex;
use std::fmt;

/// Stable route identity: `[METHOD]:[template]`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RouteId(String);

impl RouteId {
    #[must_use]
    pub fn new(method: &Method, template: &str) -> Self {
        RouteId(format!("[{}]:[{}]", method.as_str().to_uppercase(), template))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RouteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Compile a template to an anchored matcher plus the ordered parameter
/// names: `/users/:id` becomes `^/users/([^/]+)$` with `["id"]`.
pub fn compile_pattern(template: &str) -> (Regex, Vec<String>) {
    if template == "/" {
        return (
            Regex::new(r"^/$").expect("Failed to compile path regex"),
            Vec::new(),
        );
    }

    let mut pattern = String::with_capacity(template.len() + 5);
    pattern.push('^');
    let mut param_names = Vec::with_capacity(template.matches(':').count());

    for segment in template.split('/') {
        if let Some(name) = segment.strip_prefix(':') {
            pattern.push_str("/([^/]+)");
            param_names.push(name.to_string());
        } else if !segment.is_empty() {
            pattern.push('/');
            pattern.push_str(segment);
        }
    }

    pattern.push('$');
    let regex = Regex::new(&pattern).expect("Failed to compile path regex");

    (regex, param_names)
}

/// Whether the template carries any `:name` segment.
#[must_use]
pub fn has_param(template: &str) -> bool {
    template.contains(':')
}

/// Whether the template's final segment is a parameter. Such routes still
/// match when the trailing value is omitted entirely, so that the missing
/// parameter surfaces as a validation failure instead of a 404.
#[must_use]
pub fn has_trailing_param(template: &str) -> bool {
    template
        .rsplit('/')
        .next()
        .is_some_and(|segment| segment.starts_with(':'))
}

/// The template with its final segment removed, slash-normalized:
/// `/items/:id` → `/items`.
#[must_use]
pub fn strip_last_segment(template: &str) -> String {
    let parts: Vec<&str> = template
        .split('/')
        .filter(|segment| !segment.is_empty())
        .collect();
    let kept = &parts[..parts.len().saturating_sub(1)];
    format!("/{}", kept.join("/"))
}

/// Join path pieces into one normalized template: empty pieces are skipped,
/// surrounding slashes trimmed, the result always starts with `/`.
/// Computed eagerly at registration; nothing re-derives paths afterwards.
#[must_use]
pub fn join_path_segments(pieces: &[&str]) -> String {
    let joined = pieces
        .iter()
        .map(|piece| piece.trim_matches('/'))
        .filter(|piece| !piece.is_empty())
        .collect::<Vec<_>>()
        .join("/");
    format!("/{joined}")
}
