//! Single-callback HTTP client port.

use std::time::Duration;

use thiserror::Error;

use crate::canonical::{CanonicalInteraction, CanonicalRequest, CanonicalResponse, Headers};
use crate::error::InterceptError;
use crate::splice::{
    Capture, Continuation, Normalize, Synthesize, INTERCEPT_FAILURE_REASON,
    INTERCEPT_FAILURE_STATUS,
};

/// A fully buffered request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    /// HTTP method.
    pub method: String,
    /// Absolute URL.
    pub url: String,
    /// Request headers.
    pub headers: Headers,
    /// Request body, if any.
    pub body: Option<Vec<u8>>,
}

impl HttpRequest {
    /// A request with no headers and no body.
    pub fn new(method: impl Into<String>, url: impl Into<String>) -> Self {
        Self { method: method.into(), url: url.into(), headers: Headers::new(), body: None }
    }

    /// Adds a header value.
    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.add(name, value);
        self
    }

    /// Sets the body.
    #[must_use]
    pub fn body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = Some(body.into());
        self
    }
}

/// The response handed to the callback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    /// Status code.
    pub status: u16,
    /// Reason phrase.
    pub reason: String,
    /// Response headers.
    pub headers: Headers,
    /// Response body.
    pub body: Vec<u8>,
    /// Effective URL after redirects.
    pub url: Option<String>,
    /// Time from issuing the request to delivery.
    pub elapsed: Duration,
    /// Set on synthetic `599` responses.
    pub error: Option<InterceptError>,
}

/// The real client could not produce a response at all.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("transport error: {0}")]
pub struct TransportError(pub String);

/// Outcome delivered to a [`SendCallback`].
pub type SendResult = Result<HttpResponse, TransportError>;

/// The one callback a [`CallbackClient`] invokes per request.
pub type SendCallback = Continuation<SendResult>;

/// An HTTP client that reports each result through one callback.
pub trait CallbackClient: Send + Sync {
    /// Issues `request`; `on_done` is invoked exactly once, never before
    /// `send` returns.
    fn send(&self, request: HttpRequest, on_done: SendCallback);
}

impl Normalize for HttpRequest {
    fn normalize(&self) -> CanonicalRequest {
        CanonicalRequest::new(&self.method, self.url.clone())
            .with_body(self.body.clone())
            .with_headers(self.headers.clone())
    }
}

impl Synthesize for SendResult {
    fn replayed(interaction: &CanonicalInteraction, elapsed: Duration) -> Self {
        let recorded = &interaction.response;
        Ok(HttpResponse {
            status: recorded.status.code,
            reason: recorded.status.message.clone(),
            headers: recorded.headers.clone(),
            body: recorded.body.clone(),
            url: recorded.url.clone(),
            elapsed,
            error: None,
        })
    }

    fn failed(error: InterceptError, elapsed: Duration) -> Self {
        Ok(HttpResponse {
            status: INTERCEPT_FAILURE_STATUS,
            reason: INTERCEPT_FAILURE_REASON.to_string(),
            headers: Headers::new(),
            body: Vec::new(),
            url: Some(error.request().uri.clone()),
            elapsed,
            error: Some(error),
        })
    }
}

impl Capture for HttpResponse {
    fn capture(&self) -> Result<CanonicalResponse, String> {
        let mut response =
            CanonicalResponse::new(self.status, self.reason.clone(), self.body.clone())
                .with_headers(self.headers.clone());
        response.url.clone_from(&self.url);
        Ok(response)
    }
}
