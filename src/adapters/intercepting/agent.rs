//! Interception for deferred-returning agents.
//!
//! Replayed and synthetic responses fire the deferred on a later scheduler
//! turn. Forwarded responses have their body drained once for recording and
//! are then handed to the caller with the same chunks and ending.

use crate::canonical::Headers;
use crate::ports::agent::{
    capture_collected, Agent, AgentBody, AgentRequest, AgentResponse, BodyEnd, BufferedBody,
    CollectedBody, CollectingProtocol, Deferred,
};
use crate::splice::{CallContext, Normalize, Route, Splicer};

/// An [`Agent`] that replays from, or records into, a cassette.
///
/// On the forwarding path the recording pipeline runs when the returned
/// deferred is first polled.
pub struct InterceptingAgent {
    inner: Box<dyn Agent>,
    splicer: Splicer,
}

impl InterceptingAgent {
    /// Wraps `inner`; forwarded requests go to it.
    pub fn new(inner: Box<dyn Agent>, splicer: Splicer) -> Self {
        Self { inner, splicer }
    }

    fn forward(
        &self,
        context: CallContext,
        request: AgentRequest,
        explicit_headers: bool,
    ) -> Deferred<AgentResponse> {
        let AgentRequest { method, uri, headers, body } = request;
        let real = self.inner.request(&method, &uri, explicit_headers.then_some(headers), body);
        let (sender, deferred) = Deferred::pending();
        let continuation = sender.into_continuation();
        let splicer = self.splicer.clone();

        Deferred::new(async move {
            let mut context = context;
            let outcome = match real.await {
                Ok(response) => {
                    let code = response.code;
                    let phrase = response.phrase.clone();
                    let headers = response.headers.clone();
                    let (protocol, done) = CollectingProtocol::new();
                    response.deliver_body(Box::new(protocol));
                    let collected = done.await.unwrap_or_else(|_| CollectedBody {
                        chunks: Vec::new(),
                        end: BodyEnd::Failed("body delivery abandoned".to_string()),
                    });
                    splicer.record(
                        &mut context,
                        capture_collected(code, &phrase, &headers, &uri, &collected),
                    );
                    let body = BufferedBody::from_collected(collected);
                    Ok(AgentResponse::new(code, phrase, headers, body))
                }
                Err(err) => {
                    splicer.skip_recording(&mut context);
                    Err(err)
                }
            };
            splicer.deliver(context.bind(continuation), outcome);
            deferred.await
        })
    }
}

impl Agent for InterceptingAgent {
    fn request(
        &self,
        method: &str,
        uri: &str,
        headers: Option<Headers>,
        body: Option<AgentBody>,
    ) -> Deferred<AgentResponse> {
        let explicit_headers = headers.is_some();
        let request = AgentRequest {
            method: method.to_string(),
            uri: uri.to_string(),
            headers: headers.unwrap_or_default(),
            body,
        };
        let mut context = CallContext::new(request.normalize(), self.splicer.now());
        match self.splicer.route(&mut context, request.shape()) {
            Route::Replay(interaction) => {
                let (sender, deferred) = Deferred::pending();
                self.splicer.replay_later(context.bind(sender.into_continuation()), interaction);
                deferred
            }
            Route::Reject(error) => {
                let (sender, deferred) = Deferred::pending();
                self.splicer.reject_later(context.bind(sender.into_continuation()), error);
                deferred
            }
            Route::Drop => {
                self.splicer.abandon(context);
                // The sender is dropped unfired, so the deferred never resolves.
                Deferred::pending().1
            }
            Route::Forward => self.forward(context, request, explicit_headers),
        }
    }
}
