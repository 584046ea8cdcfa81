//! Live adapters for the real network and runtime.

pub mod agent;
pub mod callback;
pub mod clock;
pub mod diagnostics;
pub mod fetch;
pub mod scheduler;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Method, RequestBuilder, StatusCode};

use crate::canonical::Headers;

/// Converts a reqwest header map, keeping repeated values in order.
fn headers_from(map: &HeaderMap) -> Headers {
    let mut headers = Headers::new();
    for (name, value) in map {
        headers.add(name.as_str(), String::from_utf8_lossy(value.as_bytes()).into_owned());
    }
    headers
}

/// Adds every header value to `builder`, skipping ones reqwest rejects.
fn apply_headers(mut builder: RequestBuilder, headers: &Headers) -> RequestBuilder {
    for (name, value) in headers.pairs() {
        match (HeaderName::from_bytes(name.as_bytes()), HeaderValue::from_str(value)) {
            (Ok(name), Ok(value)) => builder = builder.header(name, value),
            _ => tracing::warn!(header = name, "skipping invalid request header"),
        }
    }
    builder
}

fn parse_method(method: &str) -> Result<Method, String> {
    Method::from_bytes(method.to_ascii_uppercase().as_bytes())
        .map_err(|_| format!("invalid HTTP method: {method}"))
}

fn reason_phrase(status: StatusCode) -> String {
    status.canonical_reason().unwrap_or_default().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_map_keeps_repeated_values() {
        let mut map = HeaderMap::new();
        map.append("set-cookie", HeaderValue::from_static("a=1"));
        map.append("set-cookie", HeaderValue::from_static("b=2"));
        map.insert("content-type", HeaderValue::from_static("text/plain"));
        let headers = headers_from(&map);
        assert_eq!(headers.get_all("Set-Cookie"), ["a=1", "b=2"]);
        assert_eq!(headers.get("content-type"), Some("text/plain"));
    }

    #[test]
    fn methods_are_case_insensitive() {
        assert_eq!(parse_method("patch").unwrap(), Method::PATCH);
        assert!(parse_method("NOT A METHOD").is_err());
    }
}
