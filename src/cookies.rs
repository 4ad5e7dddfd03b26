//! Cookie jar capability: the request side parses the `Cookie` header into a
//! read-only jar, the response side collects outgoing cookies and serializes
//! one `Set-Cookie` line per entry.

use chrono::{DateTime, Utc};

/// `SameSite` attribute values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SameSite {
    Strict,
    Lax,
    None,
}

impl SameSite {
    fn as_str(self) -> &'static str {
        match self {
            SameSite::Strict => "Strict",
            SameSite::Lax => "Lax",
            SameSite::None => "None",
        }
    }
}

/// One cookie with its `Set-Cookie` attributes.
///
/// Request-side cookies only ever carry `name` and `value`; the remaining
/// attributes matter when the cookie sits in an outgoing jar.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Cookie {
    pub name: String,
    pub value: String,
    pub path: Option<String>,
    pub domain: Option<String>,
    pub max_age: Option<i64>,
    pub expires: Option<DateTime<Utc>>,
    pub secure: bool,
    pub http_only: bool,
    pub same_site: Option<SameSite>,
}

impl Cookie {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Cookie {
            name: name.into(),
            value: value.into(),
            ..Cookie::default()
        }
    }

    /// Render one `Set-Cookie` header value.
    #[must_use]
    pub fn to_set_cookie_header(&self) -> String {
        let mut header = format!("{}={}", self.name, self.value);
        if let Some(path) = &self.path {
            header.push_str("; Path=");
            header.push_str(path);
        }
        if let Some(domain) = &self.domain {
            header.push_str("; Domain=");
            header.push_str(domain);
        }
        if let Some(max_age) = self.max_age {
            header.push_str("; Max-Age=");
            header.push_str(&max_age.to_string());
        }
        if let Some(expires) = self.expires {
            header.push_str("; Expires=");
            header.push_str(&expires.format("%a, %d %b %Y %H:%M:%S GMT").to_string());
        }
        if self.secure {
            header.push_str("; Secure");
        }
        if self.http_only {
            header.push_str("; HttpOnly");
        }
        if let Some(same_site) = self.same_site {
            header.push_str("; SameSite=");
            header.push_str(same_site.as_str());
        }
        header
    }
}

/// Ordered cookie jar. Setting an existing name replaces it in place so the
/// emission order stays stable.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CookieJar {
    cookies: Vec<Cookie>,
}

impl CookieJar {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a request `Cookie` header (`a=b; c=d`) into a jar.
    /// Pairs without a name or value are skipped.
    #[must_use]
    pub fn from_cookie_header(header: &str) -> Self {
        let mut jar = CookieJar::new();
        for pair in header.split(';') {
            let mut parts = pair.trim().splitn(2, '=');
            let name = parts.next().unwrap_or("").trim();
            let value = parts.next().unwrap_or("").trim();
            if name.is_empty() || value.is_empty() {
                continue;
            }
            jar.set(Cookie::new(name, value));
        }
        jar
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.cookies
            .iter()
            .find(|c| c.name == name)
            .map(|c| c.value.as_str())
    }

    #[must_use]
    pub fn has(&self, name: &str) -> bool {
        self.cookies.iter().any(|c| c.name == name)
    }

    pub fn set(&mut self, cookie: Cookie) {
        match self.cookies.iter_mut().find(|c| c.name == cookie.name) {
            Some(slot) => *slot = cookie,
            None => self.cookies.push(cookie),
        }
    }

    pub fn set_many(&mut self, cookies: impl IntoIterator<Item = Cookie>) {
        for cookie in cookies {
            self.set(cookie);
        }
    }

    /// Returns whether a cookie was removed.
    pub fn delete(&mut self, name: &str) -> bool {
        let before = self.cookies.len();
        self.cookies.retain(|c| c.name != name);
        before != self.cookies.len()
    }

    #[must_use]
    pub fn entries(&self) -> &[Cookie] {
        &self.cookies
    }

    #[must_use]
    pub fn count(&self) -> usize {
        self.cookies.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cookies.is_empty()
    }

    /// One `Set-Cookie` header value per cookie, in jar order.
    #[must_use]
    pub fn to_set_cookie_headers(&self) -> Vec<String> {
        self.cookies.iter().map(Cookie::to_set_cookie_header).collect()
    }
}
