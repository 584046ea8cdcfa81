//! Recorded responses and request/response pairs.

use serde::{Deserialize, Serialize};

use super::{CanonicalRequest, Headers};

/// Status line of a recorded response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Status {
    /// Numeric status code.
    pub code: u16,
    /// Reason phrase, possibly empty.
    #[serde(default)]
    pub message: String,
}

/// A client-independent HTTP response as stored in a cassette.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanonicalResponse {
    /// Status code and reason phrase.
    pub status: Status,
    /// Response headers in wire order.
    #[serde(default)]
    pub headers: Headers,
    /// Full response payload.
    #[serde(with = "super::body")]
    pub body: Vec<u8>,
    /// Effective URL after redirects, when the client reported one.
    #[serde(default)]
    pub url: Option<String>,
}

impl CanonicalResponse {
    /// Creates a response with the given code, reason and body.
    pub fn new(code: u16, message: impl Into<String>, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status: Status { code, message: message.into() },
            headers: Headers::new(),
            body: body.into(),
            url: None,
        }
    }

    /// Replaces the headers.
    #[must_use]
    pub fn with_headers(mut self, headers: Headers) -> Self {
        self.headers = headers;
        self
    }

    /// Sets the effective URL.
    #[must_use]
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }
}

/// One recorded request together with the response it produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanonicalInteraction {
    /// The normalized request.
    pub request: CanonicalRequest,
    /// The response served for it.
    pub response: CanonicalResponse,
}

impl CanonicalInteraction {
    /// Pairs a request with its response.
    #[must_use]
    pub fn new(request: CanonicalRequest, response: CanonicalResponse) -> Self {
        Self { request, response }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interaction_yaml_layout() {
        let mut headers = Headers::new();
        headers.add("Content-Type", "application/json");
        let interaction = CanonicalInteraction::new(
            CanonicalRequest::new("GET", "http://example.test/a"),
            CanonicalResponse::new(200, "OK", "{\"ok\":true}")
                .with_headers(headers)
                .with_url("http://example.test/a"),
        );

        let yaml = serde_yaml::to_string(&interaction).expect("serialize");
        let value: serde_yaml::Value = serde_yaml::from_str(&yaml).expect("reparse");
        assert_eq!(value["response"]["status"]["code"].as_u64(), Some(200));
        assert_eq!(value["response"]["body"]["string"].as_str(), Some("{\"ok\":true}"));
        assert!(value["request"]["body"].is_null());

        let back: CanonicalInteraction = serde_yaml::from_str(&yaml).expect("deserialize");
        assert_eq!(back, interaction);
    }
}
