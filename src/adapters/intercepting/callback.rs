//! Interception for single-callback clients.

use crate::ports::callback::{CallbackClient, HttpRequest, SendCallback};
use crate::splice::{CallContext, Capture, Normalize, Route, Splicer};

/// A [`CallbackClient`] that replays from, or records into, a cassette.
pub struct InterceptingCallbackClient {
    inner: Box<dyn CallbackClient>,
    splicer: Splicer,
}

impl InterceptingCallbackClient {
    /// Wraps `inner`; forwarded requests go to it.
    pub fn new(inner: Box<dyn CallbackClient>, splicer: Splicer) -> Self {
        Self { inner, splicer }
    }
}

impl CallbackClient for InterceptingCallbackClient {
    fn send(&self, request: HttpRequest, on_done: SendCallback) {
        let mut context = CallContext::new(request.normalize(), self.splicer.now());
        match self.splicer.route(&mut context, request.shape()) {
            Route::Replay(interaction) => {
                self.splicer.replay_later(context.bind(on_done), interaction);
            }
            Route::Reject(error) => self.splicer.reject_later(context.bind(on_done), error),
            Route::Drop => self.splicer.abandon(context),
            Route::Forward => {
                let splicer = self.splicer.clone();
                self.inner.send(
                    request,
                    Box::new(move |result| {
                        let mut context = context;
                        match &result {
                            Ok(response) => splicer.record(&mut context, response.capture()),
                            Err(_) => splicer.skip_recording(&mut context),
                        }
                        splicer.deliver(context.bind(on_done), result);
                    }),
                );
            }
        }
    }
}
