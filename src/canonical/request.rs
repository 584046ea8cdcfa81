//! The normalized request every intercepted client is reduced to.

use std::fmt;

use serde::{Deserialize, Serialize};
use url::Url;

use super::Headers;

/// A client-independent description of an outgoing HTTP request.
///
/// An absent body (`None`) is distinct from an empty one (`Some(vec![])`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanonicalRequest {
    /// Upper-case HTTP method.
    pub method: String,
    /// Absolute request URL.
    pub uri: String,
    /// Request payload, if any.
    #[serde(with = "super::body::optional", default)]
    pub body: Option<Vec<u8>>,
    /// Request headers in the order the client supplied them.
    #[serde(default)]
    pub headers: Headers,
}

impl CanonicalRequest {
    /// Creates a request with no body and no headers.
    pub fn new(method: impl AsRef<str>, uri: impl Into<String>) -> Self {
        Self {
            method: method.as_ref().to_ascii_uppercase(),
            uri: uri.into(),
            body: None,
            headers: Headers::new(),
        }
    }

    /// Replaces the body.
    #[must_use]
    pub fn with_body(mut self, body: Option<Vec<u8>>) -> Self {
        self.body = body;
        self
    }

    /// Replaces the headers.
    #[must_use]
    pub fn with_headers(mut self, headers: Headers) -> Self {
        self.headers = headers;
        self
    }

    fn parsed(&self) -> Option<Url> {
        Url::parse(&self.uri).ok()
    }

    /// URL scheme, lower-case. Empty if the URI does not parse.
    #[must_use]
    pub fn scheme(&self) -> String {
        self.parsed().map(|u| u.scheme().to_string()).unwrap_or_default()
    }

    /// Host name. Empty if the URI has none.
    #[must_use]
    pub fn host(&self) -> String {
        self.parsed().and_then(|u| u.host_str().map(str::to_string)).unwrap_or_default()
    }

    /// Port, falling back to the scheme's default.
    #[must_use]
    pub fn port(&self) -> Option<u16> {
        self.parsed().and_then(|u| u.port_or_known_default())
    }

    /// Path component. For URIs that do not parse, everything before `?`.
    #[must_use]
    pub fn path(&self) -> String {
        match self.parsed() {
            Some(url) => url.path().to_string(),
            None => self.uri.split('?').next().unwrap_or_default().to_string(),
        }
    }

    /// Decoded query pairs, sorted so that parameter order does not matter.
    #[must_use]
    pub fn sorted_query(&self) -> Vec<(String, String)> {
        let mut pairs: Vec<(String, String)> = self
            .parsed()
            .map(|u| u.query_pairs().map(|(k, v)| (k.into_owned(), v.into_owned())).collect())
            .unwrap_or_default();
        pairs.sort();
        pairs
    }
}

impl fmt::Display for CanonicalRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<Request ({}) {}>", self.method, self.uri)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn method_is_upper_cased() {
        assert_eq!(CanonicalRequest::new("get", "http://example.test/").method, "GET");
    }

    #[test]
    fn url_parts() {
        let req = CanonicalRequest::new("GET", "https://example.test/v2/subscribe/abc?b=2&a=1");
        assert_eq!(req.scheme(), "https");
        assert_eq!(req.host(), "example.test");
        assert_eq!(req.port(), Some(443));
        assert_eq!(req.path(), "/v2/subscribe/abc");
        assert_eq!(
            req.sorted_query(),
            vec![("a".to_string(), "1".to_string()), ("b".to_string(), "2".to_string())]
        );
    }

    #[test]
    fn unparseable_uri_still_has_a_path() {
        let req = CanonicalRequest::new("GET", "/relative/only?x=1");
        assert_eq!(req.path(), "/relative/only");
        assert_eq!(req.host(), "");
    }

    #[test]
    fn display_names_method_and_uri() {
        let req = CanonicalRequest::new("POST", "http://example.test/b");
        assert_eq!(req.to_string(), "<Request (POST) http://example.test/b>");
    }
}
