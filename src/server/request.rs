use std::io::Read;

use http::Method;
use may_minihttp::Request;
use tracing::debug;

use crate::cookies::CookieJar;
use crate::headers::HeaderMap;
use crate::request::RawRequest;

/// Extract a [`RawRequest`] from a `may_minihttp::Request`: method, split
/// path/query, headers, the cookie jar, and the fully buffered body.
pub fn parse_request(req: Request) -> RawRequest {
    let method: Method = req.method().parse().unwrap_or(Method::GET);
    let target = req.path().to_string();
    let (path, query) = match target.split_once('?') {
        Some((path, query)) => (path.to_string(), Some(query.to_string())),
        None => (target, None),
    };
    let path = if path.is_empty() { "/".to_string() } else { path };

    let headers = HeaderMap::from_pairs(req.headers().iter().map(|h| {
        (
            h.name.to_string(),
            String::from_utf8_lossy(h.value).to_string(),
        )
    }));

    let cookies = headers
        .get("cookie")
        .map(CookieJar::from_cookie_header)
        .unwrap_or_default();

    let mut body = Vec::new();
    let body_len = req.body().read_to_end(&mut body).unwrap_or(0);

    debug!(
        method = %method,
        path = %path,
        header_count = headers.len(),
        cookie_count = cookies.count(),
        body_size_bytes = body_len,
        "HTTP request parsed"
    );

    RawRequest {
        method,
        path,
        query,
        headers,
        cookies,
        body,
    }
}
