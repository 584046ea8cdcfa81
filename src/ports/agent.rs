//! Deferred-returning HTTP agent port.
//!
//! An [`Agent`] answers each request with a [`Deferred`] that resolves to an
//! [`AgentResponse`]. The response body is not part of the response value:
//! callers ask for it with [`AgentResponse::deliver_body`], which feeds a
//! [`BodyProtocol`] zero or more chunks followed by exactly one
//! [`BodyProtocol::connection_lost`].

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Duration;

use thiserror::Error;
use tokio::sync::oneshot;

use crate::canonical::{CanonicalInteraction, CanonicalRequest, CanonicalResponse, Headers};
use crate::error::InterceptError;
use crate::splice::{
    Continuation, Normalize, RequestShape, Synthesize, INTERCEPT_FAILURE_REASON,
    INTERCEPT_FAILURE_STATUS,
};

/// Boxed future alias that keeps [`Agent`] dyn-compatible.
pub type BoxFuture<T> = Pin<Box<dyn Future<Output = T> + Send + 'static>>;

/// Failures an agent reports through its deferred.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AgentError {
    /// No response was received.
    #[error("request failed: {0}")]
    Transport(String),
    /// The response arrived but its body could not be read in full.
    #[error("response body failed: {0}")]
    Body(String),
}

/// What a [`Deferred`] resolves to.
pub type AgentResult = Result<AgentResponse, AgentError>;

/// A value that becomes available later.
///
/// A deferred whose [`DeferredSender`] is dropped without firing never
/// resolves.
pub struct Deferred<T> {
    inner: BoxFuture<Result<T, AgentError>>,
}

impl<T: Send + 'static> Deferred<T> {
    /// Wraps an arbitrary future.
    pub fn new<F>(future: F) -> Self
    where
        F: Future<Output = Result<T, AgentError>> + Send + 'static,
    {
        Self { inner: Box::pin(future) }
    }

    /// A deferred that has already fired with `value`.
    pub fn succeed(value: T) -> Self {
        Self::new(std::future::ready(Ok(value)))
    }

    /// A deferred that has already failed with `error`.
    pub fn fail(error: AgentError) -> Self {
        Self::new(std::future::ready(Err(error)))
    }

    /// An unfired deferred and the handle that fires it.
    pub fn pending() -> (DeferredSender<T>, Self) {
        let (tx, rx) = oneshot::channel();
        let deferred = Self::new(async move {
            match rx.await {
                Ok(result) => result,
                Err(_) => std::future::pending().await,
            }
        });
        (DeferredSender { tx }, deferred)
    }
}

impl<T> Future for Deferred<T> {
    type Output = Result<T, AgentError>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        self.inner.as_mut().poll(cx)
    }
}

impl<T> fmt::Debug for Deferred<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Deferred").finish_non_exhaustive()
    }
}

/// Fires the [`Deferred`] it was created with.
#[derive(Debug)]
pub struct DeferredSender<T> {
    tx: oneshot::Sender<Result<T, AgentError>>,
}

impl<T: Send + 'static> DeferredSender<T> {
    /// Fires the deferred with `result`. A deferred nobody awaits any more is
    /// not an error.
    pub fn fire(self, result: Result<T, AgentError>) {
        let _ = self.tx.send(result);
    }

    /// A continuation that fires the deferred.
    #[must_use]
    pub fn into_continuation(self) -> Continuation<Result<T, AgentError>> {
        Box::new(move |result| self.fire(result))
    }
}

/// How a body delivery ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BodyEnd {
    /// All data was delivered.
    Done,
    /// Delivery stopped early.
    Failed(String),
}

/// Receives a response body.
pub trait BodyProtocol: Send {
    /// One chunk of the body.
    fn data_received(&mut self, chunk: &[u8]);

    /// The body is finished. Called exactly once, after every chunk.
    fn connection_lost(&mut self, reason: BodyEnd);
}

/// Something that can push a response body into a [`BodyProtocol`].
pub trait BodySource: Send {
    /// Delivers the body. May return before delivery finishes.
    fn deliver(self: Box<Self>, protocol: Box<dyn BodyProtocol>);
}

/// A body already held in memory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BufferedBody {
    chunks: Vec<Vec<u8>>,
    end: BodyEnd,
}

impl BufferedBody {
    /// A body delivered as one chunk. An empty body delivers no chunks.
    pub fn complete(body: impl Into<Vec<u8>>) -> Self {
        let body = body.into();
        let chunks = if body.is_empty() { Vec::new() } else { vec![body] };
        Self { chunks, end: BodyEnd::Done }
    }

    /// A body whose delivery ends with `end` after `chunks`.
    #[must_use]
    pub fn chunked(chunks: Vec<Vec<u8>>, end: BodyEnd) -> Self {
        Self { chunks, end }
    }

    /// Replays what a [`CollectingProtocol`] gathered, ending the same way.
    #[must_use]
    pub fn from_collected(collected: CollectedBody) -> Self {
        Self { chunks: collected.chunks, end: collected.end }
    }
}

impl BodySource for BufferedBody {
    fn deliver(self: Box<Self>, mut protocol: Box<dyn BodyProtocol>) {
        for chunk in &self.chunks {
            protocol.data_received(chunk);
        }
        protocol.connection_lost(self.end);
    }
}

/// Produces a request body incrementally.
pub trait BodyProducer: Send {
    /// Total length, when known up front.
    fn length(&self) -> Option<u64>;

    /// Writes every chunk of the body into `consumer`.
    fn produce(self: Box<Self>, consumer: &mut dyn FnMut(&[u8]));
}

/// A request body.
pub enum AgentBody {
    /// Bytes held in memory.
    Bytes(Vec<u8>),
    /// A streaming producer.
    Producer(Box<dyn BodyProducer>),
}

impl fmt::Debug for AgentBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bytes(bytes) => f.debug_tuple("Bytes").field(&bytes.len()).finish(),
            Self::Producer(producer) => {
                f.debug_tuple("Producer").field(&producer.length()).finish()
            }
        }
    }
}

/// A response whose body has not been read yet.
pub struct AgentResponse {
    /// Status code.
    pub code: u16,
    /// Reason phrase.
    pub phrase: String,
    /// Response headers.
    pub headers: Headers,
    /// Set on synthetic `599` responses.
    pub error: Option<InterceptError>,
    body: Box<dyn BodySource>,
}

impl AgentResponse {
    /// A response whose body comes from `body`.
    pub fn new(
        code: u16,
        phrase: impl Into<String>,
        headers: Headers,
        body: impl BodySource + 'static,
    ) -> Self {
        Self { code, phrase: phrase.into(), headers, error: None, body: Box::new(body) }
    }

    /// Starts delivering the body into `protocol`.
    pub fn deliver_body(self, protocol: Box<dyn BodyProtocol>) {
        self.body.deliver(protocol);
    }

    /// Replaces the body source, keeping status and headers.
    #[must_use]
    pub fn with_body(mut self, body: impl BodySource + 'static) -> Self {
        self.body = Box::new(body);
        self
    }
}

impl fmt::Debug for AgentResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AgentResponse")
            .field("code", &self.code)
            .field("phrase", &self.phrase)
            .field("headers", &self.headers)
            .field("error", &self.error)
            .finish_non_exhaustive()
    }
}

/// Buffers a body and reports it once `connection_lost` arrives.
pub struct CollectingProtocol {
    chunks: Vec<Vec<u8>>,
    done: Option<oneshot::Sender<CollectedBody>>,
}

/// The chunks gathered by a [`CollectingProtocol`] and how delivery ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectedBody {
    /// Every chunk received, in arrival order.
    pub chunks: Vec<Vec<u8>>,
    /// The reason passed to `connection_lost`.
    pub end: BodyEnd,
}

impl CollectedBody {
    /// The whole body.
    #[must_use]
    pub fn bytes(&self) -> Vec<u8> {
        self.chunks.concat()
    }
}

impl CollectingProtocol {
    /// A protocol and a receiver for what it collects.
    ///
    /// The receiver errors if the body source drops the protocol without
    /// ending delivery.
    #[must_use]
    pub fn new() -> (Self, oneshot::Receiver<CollectedBody>) {
        let (tx, rx) = oneshot::channel();
        (Self { chunks: Vec::new(), done: Some(tx) }, rx)
    }
}

impl BodyProtocol for CollectingProtocol {
    fn data_received(&mut self, chunk: &[u8]) {
        self.chunks.push(chunk.to_vec());
    }

    fn connection_lost(&mut self, reason: BodyEnd) {
        if let Some(done) = self.done.take() {
            let chunks = std::mem::take(&mut self.chunks);
            let _ = done.send(CollectedBody { chunks, end: reason });
        }
    }
}

/// Reads a whole body through [`AgentResponse::deliver_body`].
///
/// # Errors
///
/// Returns [`AgentError::Body`] if delivery ends with a failure or the body
/// source abandons the protocol.
pub async fn collect_body(response: AgentResponse) -> Result<Vec<u8>, AgentError> {
    let (protocol, done) = CollectingProtocol::new();
    response.deliver_body(Box::new(protocol));
    let collected = done
        .await
        .map_err(|_| AgentError::Body("body delivery abandoned".to_string()))?;
    match collected.end {
        BodyEnd::Done => Ok(collected.bytes()),
        BodyEnd::Failed(reason) => Err(AgentError::Body(reason)),
    }
}

/// An HTTP client whose results arrive through [`Deferred`]s.
pub trait Agent: Send + Sync {
    /// Issues a request. `headers` of `None` means no headers.
    fn request(
        &self,
        method: &str,
        uri: &str,
        headers: Option<Headers>,
        body: Option<AgentBody>,
    ) -> Deferred<AgentResponse>;
}

/// The arguments of one [`Agent::request`] call.
#[derive(Debug)]
pub struct AgentRequest {
    /// HTTP method.
    pub method: String,
    /// Absolute URI.
    pub uri: String,
    /// Request headers.
    pub headers: Headers,
    /// Request body.
    pub body: Option<AgentBody>,
}

impl Normalize for AgentRequest {
    fn normalize(&self) -> CanonicalRequest {
        let body = match &self.body {
            Some(AgentBody::Bytes(bytes)) => Some(bytes.clone()),
            Some(AgentBody::Producer(_)) | None => None,
        };
        CanonicalRequest::new(&self.method, self.uri.clone())
            .with_body(body)
            .with_headers(self.headers.clone())
    }

    fn shape(&self) -> RequestShape {
        RequestShape {
            streaming_body: matches!(self.body, Some(AgentBody::Producer(_))),
            ..RequestShape::buffered()
        }
    }
}

impl Synthesize for AgentResult {
    fn replayed(interaction: &CanonicalInteraction, _elapsed: Duration) -> Self {
        let recorded = &interaction.response;
        Ok(AgentResponse::new(
            recorded.status.code,
            recorded.status.message.clone(),
            recorded.headers.clone(),
            BufferedBody::complete(recorded.body.clone()),
        ))
    }

    fn failed(error: InterceptError, _elapsed: Duration) -> Self {
        let mut response = AgentResponse::new(
            INTERCEPT_FAILURE_STATUS,
            INTERCEPT_FAILURE_REASON,
            Headers::new(),
            BufferedBody::complete(error.to_string()),
        );
        response.error = Some(error);
        Ok(response)
    }
}

/// The canonical form of a real response whose body has been collected.
///
/// # Errors
///
/// Returns the failure reason if the body did not arrive in full.
pub fn capture_collected(
    code: u16,
    phrase: &str,
    headers: &Headers,
    uri: &str,
    collected: &CollectedBody,
) -> Result<CanonicalResponse, String> {
    match &collected.end {
        BodyEnd::Done => Ok(CanonicalResponse::new(code, phrase, collected.bytes())
            .with_headers(headers.clone())
            .with_url(uri)),
        BodyEnd::Failed(reason) => Err(format!("response body failed: {reason}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    struct Trace(Arc<Mutex<Vec<String>>>);

    impl BodyProtocol for Trace {
        fn data_received(&mut self, chunk: &[u8]) {
            self.0.lock().unwrap().push(format!("data:{}", String::from_utf8_lossy(chunk)));
        }

        fn connection_lost(&mut self, reason: BodyEnd) {
            self.0.lock().unwrap().push(format!("lost:{reason:?}"));
        }
    }

    #[test]
    fn buffered_body_runs_both_phases() {
        let events = Arc::new(Mutex::new(Vec::new()));
        let response =
            AgentResponse::new(200, "OK", Headers::new(), BufferedBody::complete("hello"));
        response.deliver_body(Box::new(Trace(Arc::clone(&events))));
        assert_eq!(*events.lock().unwrap(), vec!["data:hello", "lost:Done"]);
    }

    #[test]
    fn empty_body_only_ends() {
        let events = Arc::new(Mutex::new(Vec::new()));
        Box::new(BufferedBody::complete(Vec::new())).deliver(Box::new(Trace(Arc::clone(&events))));
        assert_eq!(*events.lock().unwrap(), vec!["lost:Done"]);
    }

    #[tokio::test]
    async fn collect_body_joins_chunks() {
        let body = BufferedBody::chunked(vec![b"ab".to_vec(), b"cd".to_vec()], BodyEnd::Done);
        let response = AgentResponse::new(200, "OK", Headers::new(), body);
        assert_eq!(collect_body(response).await.unwrap(), b"abcd");
    }

    #[tokio::test]
    async fn collected_body_replays_chunk_for_chunk() {
        let (mut protocol, done) = CollectingProtocol::new();
        protocol.data_received(b"hel");
        protocol.data_received(b"lo");
        protocol.connection_lost(BodyEnd::Failed("reset".into()));
        let collected = done.await.unwrap();
        assert_eq!(collected.bytes(), b"hello");

        let events = Arc::new(Mutex::new(Vec::new()));
        Box::new(BufferedBody::from_collected(collected))
            .deliver(Box::new(Trace(Arc::clone(&events))));
        assert_eq!(
            *events.lock().unwrap(),
            vec!["data:hel", "data:lo", "lost:Failed(\"reset\")"]
        );
    }

    #[tokio::test]
    async fn collect_body_surfaces_failure() {
        let body = BufferedBody::chunked(vec![b"ab".to_vec()], BodyEnd::Failed("reset".into()));
        let response = AgentResponse::new(200, "OK", Headers::new(), body);
        assert_eq!(collect_body(response).await.unwrap_err(), AgentError::Body("reset".into()));
    }

    #[tokio::test]
    async fn pending_deferred_fires_once() {
        let (sender, deferred) = Deferred::<u16>::pending();
        sender.fire(Ok(204));
        assert_eq!(deferred.await.unwrap(), 204);
    }

    #[test]
    fn producer_body_is_a_streaming_shape() {
        struct Chunks;
        impl BodyProducer for Chunks {
            fn length(&self) -> Option<u64> {
                None
            }
            fn produce(self: Box<Self>, consumer: &mut dyn FnMut(&[u8])) {
                consumer(b"x");
            }
        }
        let request = AgentRequest {
            method: "POST".into(),
            uri: "http://example.test/upload".into(),
            headers: Headers::new(),
            body: Some(AgentBody::Producer(Box::new(Chunks))),
        };
        assert!(request.shape().streaming_body);
        assert_eq!(request.normalize().body, None);
    }

    #[test]
    fn failed_response_carries_the_error_text() {
        let error = InterceptError::RecordingFailure {
            request: CanonicalRequest::new("GET", "http://example.test/"),
            reason: "disk full".into(),
        };
        let response = AgentResult::failed(error, Duration::ZERO).unwrap();
        assert_eq!(response.code, 599);
        assert_eq!(response.phrase, "Unknown");
        assert!(response.error.is_some());
    }
}
