//! The raw request handed to the dispatcher: method, split path/query, a
//! case-insensitive header view, the request cookie jar, and the buffered
//! body. Transport adapters build one of these per request; tests build them
//! directly.

use http::Method;

use crate::cookies::CookieJar;
use crate::headers::HeaderMap;

/// One incoming request, fully buffered. Owned by a single in-flight
/// dispatch; never shared across requests.
#[derive(Debug, Clone)]
pub struct RawRequest {
    pub method: Method,
    /// Pathname only, query stripped. Never empty; defaults to `/`.
    pub path: String,
    /// Raw query string without the leading `?`.
    pub query: Option<String>,
    pub headers: HeaderMap,
    pub cookies: CookieJar,
    pub body: Vec<u8>,
}

impl RawRequest {
    /// Build a request from a method and a target like `/items?limit=5`.
    #[must_use]
    pub fn new(method: Method, target: &str) -> Self {
        let (path, query) = match target.split_once('?') {
            Some((path, query)) => (path, Some(query.to_string())),
            None => (target, None),
        };
        let path = if path.is_empty() { "/" } else { path };
        RawRequest {
            method,
            path: path.to_string(),
            query,
            headers: HeaderMap::new(),
            cookies: CookieJar::new(),
            body: Vec::new(),
        }
    }

    /// Append a header line. A `Cookie` header also refreshes the jar.
    #[must_use]
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.append(name, value);
        if name.eq_ignore_ascii_case("cookie") {
            self.cookies = CookieJar::from_cookie_header(value);
        }
        self
    }

    #[must_use]
    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }

    #[must_use]
    pub fn content_type(&self) -> Option<&str> {
        self.headers.get("content-type")
    }

    /// CORS preflight: OPTIONS plus an `Access-Control-Request-Method`
    /// header. Preflights bypass routing entirely.
    #[must_use]
    pub fn is_preflight(&self) -> bool {
        self.method == Method::OPTIONS && self.headers.has("access-control-request-method")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_target_splits_path_and_query() {
        let req = RawRequest::new(Method::GET, "/items?limit=5&offset=2");
        assert_eq!(req.path, "/items");
        assert_eq!(req.query.as_deref(), Some("limit=5&offset=2"));

        let req = RawRequest::new(Method::GET, "/plain");
        assert_eq!(req.path, "/plain");
        assert!(req.query.is_none());
    }

    #[test]
    fn test_cookie_header_fills_jar() {
        let req = RawRequest::new(Method::GET, "/").with_header("Cookie", "session=abc; theme=dark");
        assert_eq!(req.cookies.get("session"), Some("abc"));
        assert_eq!(req.cookies.get("theme"), Some("dark"));
    }

    #[test]
    fn test_preflight_detection() {
        let preflight = RawRequest::new(Method::OPTIONS, "/anything")
            .with_header("Access-Control-Request-Method", "POST");
        assert!(preflight.is_preflight());

        let plain_options = RawRequest::new(Method::OPTIONS, "/anything");
        assert!(!plain_options.is_preflight());
    }
}
