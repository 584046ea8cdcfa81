//! Two-stage fetch client port.
//!
//! A [`FetchClient`] first hands the caller a [`KeyResponse`] through the key
//! callback. The caller resumes it with a response callback, which then
//! receives the [`FetchResponse`].

use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::canonical::{CanonicalInteraction, CanonicalRequest, CanonicalResponse, Headers};
use crate::error::InterceptError;
use crate::splice::{
    Capture, Continuation, Normalize, RequestShape, Synthesize, INTERCEPT_FAILURE_REASON,
    INTERCEPT_FAILURE_STATUS,
};

/// Writes request body chunks into the supplied sink.
pub type BodyProducerFn = Box<dyn FnOnce(&mut dyn FnMut(&[u8])) + Send>;

/// Receives each raw header line as it arrives.
pub type HeaderCallback = Box<dyn FnMut(&str) + Send>;

/// Receives each body chunk as it arrives.
pub type StreamingCallback = Box<dyn FnMut(&[u8]) + Send>;

/// A fetch request.
pub struct FetchRequest {
    /// HTTP method.
    pub method: String,
    /// Absolute URL.
    pub url: String,
    /// Explicit request headers.
    pub headers: Headers,
    /// Buffered request body.
    pub body: Option<Vec<u8>>,
    /// Client-level user agent, applied unless `User-Agent` is set explicitly.
    pub user_agent: Option<String>,
    /// When the request was issued.
    pub start_time: DateTime<Utc>,
    /// Streaming request body.
    pub body_producer: Option<BodyProducerFn>,
    /// Per-line header hook.
    pub header_callback: Option<HeaderCallback>,
    /// Per-chunk body hook.
    pub streaming_callback: Option<StreamingCallback>,
}

impl FetchRequest {
    /// A buffered request issued now.
    pub fn new(method: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            url: url.into(),
            headers: Headers::new(),
            body: None,
            user_agent: None,
            start_time: Utc::now(),
            body_producer: None,
            header_callback: None,
            streaming_callback: None,
        }
    }

    /// Adds a header value.
    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.add(name, value);
        self
    }

    /// Sets the buffered body.
    #[must_use]
    pub fn body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Sets the client-level user agent.
    #[must_use]
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    /// Overrides the issue time.
    #[must_use]
    pub fn started_at(mut self, start_time: DateTime<Utc>) -> Self {
        self.start_time = start_time;
        self
    }

    /// Attaches a streaming body producer.
    #[must_use]
    pub fn body_producer(mut self, producer: BodyProducerFn) -> Self {
        self.body_producer = Some(producer);
        self
    }

    /// Attaches a header callback.
    #[must_use]
    pub fn header_callback(mut self, callback: HeaderCallback) -> Self {
        self.header_callback = Some(callback);
        self
    }

    /// Attaches a streaming response callback.
    #[must_use]
    pub fn streaming_callback(mut self, callback: StreamingCallback) -> Self {
        self.streaming_callback = Some(callback);
        self
    }

    /// Headers as sent on the wire: explicit headers, then the user agent if
    /// none was given.
    #[must_use]
    pub fn effective_headers(&self) -> Headers {
        let mut headers = self.headers.clone();
        if let Some(user_agent) = &self.user_agent {
            headers.set_default("User-Agent", user_agent.clone());
        }
        headers
    }
}

impl fmt::Debug for FetchRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FetchRequest")
            .field("method", &self.method)
            .field("url", &self.url)
            .field("headers", &self.headers)
            .field("user_agent", &self.user_agent)
            .field("start_time", &self.start_time)
            .field("body_producer", &self.body_producer.is_some())
            .field("header_callback", &self.header_callback.is_some())
            .field("streaming_callback", &self.streaming_callback.is_some())
            .finish_non_exhaustive()
    }
}

/// Why a [`FetchResponse`] is an error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    /// The interception layer answered with a synthetic failure.
    #[error(transparent)]
    Intercepted(#[from] InterceptError),
    /// The server answered with a non-success status.
    #[error("HTTP {0}")]
    Http(u16),
    /// No response was received.
    #[error("transport error: {0}")]
    Transport(String),
}

/// A completed fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchResponse {
    /// Status code, `599` when no real response exists.
    pub code: u16,
    /// Reason phrase.
    pub reason: String,
    /// Response headers.
    pub headers: Headers,
    /// Response body.
    pub body: Vec<u8>,
    /// Effective URL after redirects.
    pub effective_url: Option<String>,
    /// Time from issuing the request to delivery.
    pub request_time: Duration,
    /// Set for non-success and synthetic responses.
    pub error: Option<FetchError>,
}

impl FetchResponse {
    /// Whether the real client got no response at all.
    #[must_use]
    pub fn is_transport_failure(&self) -> bool {
        matches!(self.error, Some(FetchError::Transport(_)))
    }
}

/// Receives the final response.
pub type ResponseCallback = Continuation<FetchResponse>;

/// First-stage result: resume it to obtain the response.
pub struct KeyResponse {
    resume: Box<dyn FnOnce(ResponseCallback) + Send>,
}

impl KeyResponse {
    /// A key whose resumption runs `resume`.
    pub fn new<F>(resume: F) -> Self
    where
        F: FnOnce(ResponseCallback) + Send + 'static,
    {
        Self { resume: Box::new(resume) }
    }

    /// Continues the fetch; `on_response` receives the response.
    pub fn resume(self, on_response: ResponseCallback) {
        (self.resume)(on_response);
    }
}

impl fmt::Debug for KeyResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyResponse").finish_non_exhaustive()
    }
}

/// Receives the [`KeyResponse`].
pub type KeyCallback = Continuation<KeyResponse>;

/// An HTTP client with a key stage before the response stage.
pub trait FetchClient: Send + Sync {
    /// Issues `request`; `on_key` is invoked exactly once, never before
    /// `fetch` returns.
    fn fetch(&self, request: FetchRequest, on_key: KeyCallback);
}

impl Normalize for FetchRequest {
    fn normalize(&self) -> CanonicalRequest {
        CanonicalRequest::new(&self.method, self.url.clone())
            .with_body(self.body.clone())
            .with_headers(self.effective_headers())
    }

    fn shape(&self) -> RequestShape {
        RequestShape {
            streaming_body: self.body_producer.is_some(),
            header_callback: self.header_callback.is_some(),
            streaming_callback: self.streaming_callback.is_some(),
        }
    }
}

impl Synthesize for FetchResponse {
    fn replayed(interaction: &CanonicalInteraction, elapsed: Duration) -> Self {
        let recorded = &interaction.response;
        let code = recorded.status.code;
        Self {
            code,
            reason: recorded.status.message.clone(),
            headers: recorded.headers.clone(),
            body: recorded.body.clone(),
            effective_url: recorded.url.clone(),
            request_time: elapsed,
            error: (!(200..300).contains(&code)).then_some(FetchError::Http(code)),
        }
    }

    fn failed(error: InterceptError, elapsed: Duration) -> Self {
        Self {
            code: INTERCEPT_FAILURE_STATUS,
            reason: INTERCEPT_FAILURE_REASON.to_string(),
            headers: Headers::new(),
            body: Vec::new(),
            effective_url: Some(error.request().uri.clone()),
            request_time: elapsed,
            error: Some(FetchError::Intercepted(error)),
        }
    }
}

impl Capture for FetchResponse {
    fn capture(&self) -> Result<CanonicalResponse, String> {
        if let Some(FetchError::Transport(reason)) = &self.error {
            return Err(format!("no response to record: {reason}"));
        }
        let mut response =
            CanonicalResponse::new(self.code, self.reason.clone(), self.body.clone())
                .with_headers(self.headers.clone());
        response.url.clone_from(&self.effective_url);
        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[test]
    fn user_agent_does_not_override_explicit_header() {
        let request = FetchRequest::new("GET", "http://example.test/")
            .header("user-agent", "explicit/1.0")
            .user_agent("client/2.0");
        assert_eq!(request.normalize().headers.get_all("User-Agent"), ["explicit/1.0"]);
    }

    #[test]
    fn user_agent_fills_missing_header() {
        let request = FetchRequest::new("GET", "http://example.test/").user_agent("client/2.0");
        assert_eq!(request.normalize().headers.get("user-agent"), Some("client/2.0"));
    }

    #[test]
    fn hooks_make_the_shape_unsupported() {
        let request = FetchRequest::new("GET", "http://example.test/")
            .streaming_callback(Box::new(|_| {}));
        assert!(request.shape().streaming_callback);
        assert!(!request.shape().header_callback);
    }

    #[test]
    fn key_response_resumes_into_callback() {
        let seen = Arc::new(Mutex::new(None));
        let sink = Arc::clone(&seen);
        let key = KeyResponse::new(|on_response| {
            let interaction = CanonicalInteraction::new(
                CanonicalRequest::new("GET", "http://example.test/"),
                CanonicalResponse::new(204, "No Content", Vec::new()),
            );
            on_response(FetchResponse::replayed(&interaction, Duration::ZERO));
        });
        key.resume(Box::new(move |response| *sink.lock().unwrap() = Some(response.code)));
        assert_eq!(*seen.lock().unwrap(), Some(204));
    }

    #[test]
    fn replayed_error_status_sets_http_error() {
        let interaction = CanonicalInteraction::new(
            CanonicalRequest::new("GET", "http://example.test/missing"),
            CanonicalResponse::new(404, "Not Found", "nope"),
        );
        let response = FetchResponse::replayed(&interaction, Duration::from_millis(5));
        assert_eq!(response.error, Some(FetchError::Http(404)));
        assert_eq!(response.request_time, Duration::from_millis(5));
    }

    #[test]
    fn transport_failures_are_not_captured() {
        let response = FetchResponse {
            code: 599,
            reason: "Unknown".into(),
            headers: Headers::new(),
            body: Vec::new(),
            effective_url: None,
            request_time: Duration::ZERO,
            error: Some(FetchError::Transport("connection refused".into())),
        };
        assert!(response.capture().is_err());
    }
}
