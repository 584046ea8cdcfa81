//! Request matchers used to find a recording for a live request.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::canonical::CanonicalRequest;

/// One aspect of a request that must be equal for two requests to match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchOn {
    /// HTTP method.
    Method,
    /// Full URI string.
    Uri,
    /// URL scheme.
    Scheme,
    /// Host name.
    Host,
    /// Port, with scheme defaults applied.
    Port,
    /// URL path.
    Path,
    /// Query parameters, order-insensitive.
    Query,
    /// Request body bytes.
    Body,
    /// All request headers.
    Headers,
}

impl MatchOn {
    /// The matchers used when none are configured.
    pub const DEFAULT: [MatchOn; 2] = [MatchOn::Method, MatchOn::Uri];

    /// Whether `a` and `b` agree on this aspect.
    #[must_use]
    pub fn matches(self, a: &CanonicalRequest, b: &CanonicalRequest) -> bool {
        match self {
            Self::Method => a.method.eq_ignore_ascii_case(&b.method),
            Self::Uri => a.uri == b.uri,
            Self::Scheme => a.scheme() == b.scheme(),
            Self::Host => a.host().eq_ignore_ascii_case(&b.host()),
            Self::Port => a.port() == b.port(),
            Self::Path => a.path() == b.path(),
            Self::Query => a.sorted_query() == b.sorted_query(),
            Self::Body => a.body == b.body,
            Self::Headers => a.headers == b.headers,
        }
    }

    fn as_str(self) -> &'static str {
        match self {
            Self::Method => "method",
            Self::Uri => "uri",
            Self::Scheme => "scheme",
            Self::Host => "host",
            Self::Port => "port",
            Self::Path => "path",
            Self::Query => "query",
            Self::Body => "body",
            Self::Headers => "headers",
        }
    }
}

/// Whether every matcher in `rules` agrees on `a` and `b`.
#[must_use]
pub fn requests_match(rules: &[MatchOn], a: &CanonicalRequest, b: &CanonicalRequest) -> bool {
    rules.iter().all(|rule| rule.matches(a, b))
}

impl fmt::Display for MatchOn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MatchOn {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "method" => Ok(Self::Method),
            "uri" | "url" => Ok(Self::Uri),
            "scheme" => Ok(Self::Scheme),
            "host" => Ok(Self::Host),
            "port" => Ok(Self::Port),
            "path" => Ok(Self::Path),
            "query" => Ok(Self::Query),
            "body" => Ok(Self::Body),
            "headers" => Ok(Self::Headers),
            other => Err(format!("unknown matcher {other:?}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_rules_compare_method_and_uri() {
        let a = CanonicalRequest::new("GET", "http://example.test/a");
        let b = CanonicalRequest::new("get", "http://example.test/a");
        let c = CanonicalRequest::new("POST", "http://example.test/a");
        assert!(requests_match(&MatchOn::DEFAULT, &a, &b));
        assert!(!requests_match(&MatchOn::DEFAULT, &a, &c));
    }

    #[test]
    fn query_ignores_parameter_order() {
        let a = CanonicalRequest::new("GET", "http://example.test/s?a=1&b=2");
        let b = CanonicalRequest::new("GET", "http://example.test/s?b=2&a=1");
        assert!(!MatchOn::Uri.matches(&a, &b));
        assert!(requests_match(&[MatchOn::Method, MatchOn::Path, MatchOn::Query], &a, &b));
    }

    #[test]
    fn body_distinguishes_absent_from_empty() {
        let a = CanonicalRequest::new("POST", "http://example.test/").with_body(None);
        let b = CanonicalRequest::new("POST", "http://example.test/").with_body(Some(Vec::new()));
        assert!(!MatchOn::Body.matches(&a, &b));
    }

    #[test]
    fn parses_url_alias() {
        assert_eq!("URL".parse::<MatchOn>(), Ok(MatchOn::Uri));
    }
}
