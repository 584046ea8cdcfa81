//! Interception for two-stage fetch clients.
//!
//! The key stage is always delivered on a later turn. For replayed and
//! synthetic responses the response is built when the key is resumed, so
//! `request_time` covers the caller's own key handling.

use std::time::Duration;

use crate::ports::fetch::{FetchClient, FetchRequest, FetchResponse, KeyCallback, KeyResponse};
use crate::splice::{CallContext, Capture, Normalize, Route, Splicer, Synthesize};

/// A [`FetchClient`] that replays from, or records into, a cassette.
pub struct InterceptingFetchClient {
    inner: Box<dyn FetchClient>,
    splicer: Splicer,
}

impl InterceptingFetchClient {
    /// Wraps `inner`; forwarded requests go to it.
    pub fn new(inner: Box<dyn FetchClient>, splicer: Splicer) -> Self {
        Self { inner, splicer }
    }

    fn deliver_key<F>(&self, context: CallContext, on_key: KeyCallback, build: F)
    where
        F: FnOnce(Duration) -> FetchResponse + Send + 'static,
    {
        let splicer = self.splicer.clone();
        self.splicer.schedule_delivery(context, move |context| {
            let call_id = context.id();
            let request = context.request().clone();
            let resumed = splicer.clone();
            let key = KeyResponse::new(move |on_response| {
                let response = build(resumed.elapsed(&context));
                resumed.deliver(context.bind(on_response), response);
            });
            splicer.invoke_stage(call_id, &request, on_key, key);
        });
    }

    fn forward(&self, context: CallContext, request: FetchRequest, on_key: KeyCallback) {
        let splicer = self.splicer.clone();
        self.inner.fetch(
            request,
            Box::new(move |real_key: KeyResponse| {
                let call_id = context.id();
                let canonical = context.request().clone();
                let recorder = splicer.clone();
                let key = KeyResponse::new(move |on_response| {
                    real_key.resume(Box::new(move |response: FetchResponse| {
                        let mut context = context;
                        if response.is_transport_failure() {
                            recorder.skip_recording(&mut context);
                        } else {
                            recorder.record(&mut context, response.capture());
                        }
                        recorder.deliver(context.bind(on_response), response);
                    }));
                });
                splicer.invoke_stage(call_id, &canonical, on_key, key);
            }),
        );
    }
}

impl FetchClient for InterceptingFetchClient {
    fn fetch(&self, request: FetchRequest, on_key: KeyCallback) {
        let mut context = CallContext::new(request.normalize(), request.start_time);
        match self.splicer.route(&mut context, request.shape()) {
            Route::Replay(interaction) => self.deliver_key(context, on_key, move |elapsed| {
                FetchResponse::replayed(&interaction, elapsed)
            }),
            Route::Reject(error) => {
                self.deliver_key(context, on_key, move |elapsed| {
                    FetchResponse::failed(error, elapsed)
                });
            }
            Route::Drop => self.splicer.abandon(context),
            Route::Forward => self.forward(context, request, on_key),
        }
    }
}
