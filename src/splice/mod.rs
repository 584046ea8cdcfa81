//! The continuation splicer: routes each intercepted call to replay, record
//! or a synthetic failure, and delivers the outcome exactly once through the
//! caller's own continuation.
//!
//! The pipeline for one call is
//! normalize -> guard -> decide -> synthesize or forward -> record -> deliver.
//! Client adapters own the first and the client-specific halves of the last
//! stages; [`Splicer`] owns the decision, recording and delivery discipline.

pub mod call;
pub mod guard;
pub mod normalize;
pub mod policy;
pub mod recorder;
pub mod state;
pub mod synth;

use std::any::Any;
use std::sync::Arc;
use std::time::Duration;

use uuid::Uuid;

pub use call::{CallContext, Continuation, InterceptedCall, ReportedPanic};
pub use guard::{RequestShape, Unsupported};
pub use normalize::Normalize;
pub use policy::SilencedPaths;
pub use recorder::Capture;
pub use state::{CallState, IllegalTransition};
pub use synth::{Synthesize, INTERCEPT_FAILURE_REASON, INTERCEPT_FAILURE_STATUS};

use crate::adapters::live::clock::LiveClock;
use crate::adapters::live::diagnostics::TracingDiagnostics;
use crate::canonical::{CanonicalInteraction, CanonicalRequest, CanonicalResponse};
use crate::cassette::Cassette;
use crate::error::InterceptError;
use crate::ports::{Clock, Diagnostics, Scheduler};

/// What to do with a call once the guard and the cassette have been asked.
#[derive(Debug)]
pub enum Route {
    /// Serve this recorded interaction. No network call.
    Replay(CanonicalInteraction),
    /// Issue the real call and record its response.
    Forward,
    /// Deliver a synthetic `599` carrying this error.
    Reject(InterceptError),
    /// Silenced write-protected miss: complete without delivering.
    Drop,
}

/// Shared interception machinery, cheap to clone into continuations.
#[derive(Clone)]
pub struct Splicer {
    cassette: Arc<dyn Cassette>,
    scheduler: Arc<dyn Scheduler>,
    clock: Arc<dyn Clock>,
    diagnostics: Arc<dyn Diagnostics>,
    silenced: Arc<SilencedPaths>,
}

impl Splicer {
    /// Creates a splicer over `cassette`, delivering through `scheduler`.
    ///
    /// Uses the system clock, tracing diagnostics and no silenced paths.
    pub fn new(cassette: Arc<dyn Cassette>, scheduler: Arc<dyn Scheduler>) -> Self {
        Self {
            cassette,
            scheduler,
            clock: Arc::new(LiveClock),
            diagnostics: Arc::new(TracingDiagnostics),
            silenced: Arc::new(SilencedPaths::default()),
        }
    }

    /// Replaces the clock used for elapsed-time fields.
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Replaces the diagnostics channel.
    #[must_use]
    pub fn with_diagnostics(mut self, diagnostics: Arc<dyn Diagnostics>) -> Self {
        self.diagnostics = diagnostics;
        self
    }

    /// Sets the paths whose write-protected misses are dropped silently.
    #[must_use]
    pub fn with_silenced_paths(mut self, silenced: SilencedPaths) -> Self {
        self.silenced = Arc::new(silenced);
        self
    }

    /// The cassette every call is routed against.
    #[must_use]
    pub fn cassette(&self) -> &Arc<dyn Cassette> {
        &self.cassette
    }

    /// The current time according to the configured clock.
    #[must_use]
    pub fn now(&self) -> chrono::DateTime<chrono::Utc> {
        self.clock.now()
    }

    /// Time since `context`'s request was issued.
    #[must_use]
    pub fn elapsed(&self, context: &CallContext) -> Duration {
        synth::elapsed_between(context.started_at(), self.clock.now())
    }

    /// Decides how `context` is served.
    ///
    /// The guard runs first; an unsupported shape never reaches the cassette.
    pub fn route(&self, context: &mut CallContext, shape: RequestShape) -> Route {
        if let Some(capability) = shape.unsupported() {
            tracing::debug!(call = %context.id(), %capability, "unsupported request shape");
            return Route::Reject(InterceptError::UnsupportedRequestShape {
                capability,
                request: context.request().clone(),
            });
        }
        context.transition(CallState::AwaitingDecision);

        let request = context.request();
        if self.cassette.can_play(request) {
            return match self.cassette.play(request) {
                Ok(interaction) => {
                    tracing::debug!(call = %context.id(), %request, "replaying");
                    context.transition(CallState::Replaying);
                    Route::Replay(interaction)
                }
                Err(err) => Route::Reject(InterceptError::PlaybackFailure {
                    request: request.clone(),
                    cassette: self.cassette_identity(),
                    reason: err.to_string(),
                }),
            };
        }

        if self.cassette.is_write_protected() && self.cassette.filter(request) {
            if self.silenced.matches(request) {
                tracing::debug!(call = %context.id(), %request, "silenced write-protected miss");
                return Route::Drop;
            }
            tracing::debug!(call = %context.id(), %request, "write-protected miss");
            return Route::Reject(InterceptError::NoMatchWriteProtected {
                request: request.clone(),
                cassette: self.cassette_identity(),
                record_mode: self.cassette.record_mode(),
            });
        }

        tracing::debug!(call = %context.id(), %request, "forwarding to real client");
        context.transition(CallState::Forwarding);
        Route::Forward
    }

    /// Completes a [`Route::Drop`] call without delivering anything.
    pub fn abandon(&self, context: CallContext) {
        self.diagnostics.abandoned(context.id(), context.request());
        context.abandon();
    }

    /// Runs `stage` with `context` on a later turn of the event loop, after
    /// moving the call to `Delivering`.
    pub fn schedule_delivery<F>(&self, mut context: CallContext, stage: F)
    where
        F: FnOnce(CallContext) + Send + 'static,
    {
        self.scheduler.call_later(
            Duration::ZERO,
            Box::new(move || {
                context.transition(CallState::Delivering);
                stage(context);
            }),
        );
    }

    /// Delivers the value produced by `build` on a later turn of the event
    /// loop. `build` receives the elapsed time at the moment of delivery.
    pub fn deliver_later<T, F>(&self, call: InterceptedCall<T>, build: F)
    where
        T: Send + 'static,
        F: FnOnce(Duration) -> T + Send + 'static,
    {
        let splicer = self.clone();
        let (context, continuation) = call.into_parts();
        self.schedule_delivery(context, move |context| {
            let value = build(splicer.elapsed(&context));
            splicer.deliver(context.bind(continuation), value);
        });
    }

    /// Replays `interaction` through `call` on a later turn of the event loop.
    pub fn replay_later<T>(&self, call: InterceptedCall<T>, interaction: CanonicalInteraction)
    where
        T: Synthesize + Send + 'static,
    {
        self.deliver_later(call, move |elapsed| T::replayed(&interaction, elapsed));
    }

    /// Delivers a synthetic failure through `call` on a later turn of the
    /// event loop.
    pub fn reject_later<T>(&self, call: InterceptedCall<T>, error: InterceptError)
    where
        T: Synthesize + Send + 'static,
    {
        self.deliver_later(call, move |elapsed| T::failed(error, elapsed));
    }

    /// Records the real response for a forwarded call.
    pub fn record(&self, context: &mut CallContext, captured: Result<CanonicalResponse, String>) {
        recorder::record(self.cassette.as_ref(), self.diagnostics.as_ref(), context, captured);
    }

    /// Moves a forwarded call straight to `Delivering` when the real client
    /// failed and there is no response to record.
    pub fn skip_recording(&self, context: &mut CallContext) {
        tracing::debug!(call = %context.id(), "real call failed, nothing to record");
        context.transition(CallState::Delivering);
    }

    /// Invokes the terminal continuation now.
    ///
    /// A panicking continuation is reported as a delivery failure and the
    /// panic is re-raised to the host as a [`ReportedPanic`]; it is never
    /// retried.
    pub fn deliver<T>(&self, call: InterceptedCall<T>, value: T) {
        let call_id = call.context().id();
        if let Err(panic) = call.fire(value) {
            self.report_and_reraise(call_id, panic.error, panic.payload);
        }
    }

    /// Invokes an intermediate stage (such as a key callback) of call
    /// `call_id` now, with the same panic policy as [`deliver`](Self::deliver).
    pub fn invoke_stage<T>(
        &self,
        call_id: Uuid,
        request: &CanonicalRequest,
        stage: Box<dyn FnOnce(T) + Send + 'static>,
        value: T,
    ) {
        if let Err(payload) = call::invoke_guarded(stage, value) {
            let error = InterceptError::DeliveryFailure {
                request: request.clone(),
                reason: call::panic_message(payload.as_ref()),
            };
            self.report_and_reraise(call_id, error, payload);
        }
    }

    /// Reports `error` unless an inner delivery already did, then resumes
    /// the unwind.
    fn report_and_reraise(
        &self,
        call_id: Uuid,
        error: InterceptError,
        payload: Box<dyn Any + Send>,
    ) -> ! {
        if payload.is::<ReportedPanic>() {
            std::panic::resume_unwind(payload);
        }
        self.diagnostics.report(call_id, &error);
        std::panic::resume_unwind(Box::new(ReportedPanic::new(error, payload)))
    }

    fn cassette_identity(&self) -> String {
        self.cassette.path().display().to_string()
    }
}
