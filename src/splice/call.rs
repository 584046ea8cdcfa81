//! One intercepted invocation and its one-shot continuation.

use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};

use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::state::CallState;
use crate::canonical::CanonicalRequest;
use crate::error::InterceptError;

/// A caller continuation. `FnOnce`, so it can run at most once.
pub type Continuation<T> = Box<dyn FnOnce(T) + Send + 'static>;

/// Per-call bookkeeping: identity, normalized request and lifecycle state.
///
/// Dropping a context that never reached [`CallState::Completed`] is logged:
/// it means a caller was never answered.
#[derive(Debug)]
pub struct CallContext {
    id: Uuid,
    request: CanonicalRequest,
    started_at: DateTime<Utc>,
    state: CallState,
}

impl CallContext {
    /// Starts tracking a call for `request`, issued at `started_at`.
    #[must_use]
    pub fn new(request: CanonicalRequest, started_at: DateTime<Utc>) -> Self {
        Self { id: Uuid::new_v4(), request, started_at, state: CallState::NotStarted }
    }

    /// Unique id used in log fields and diagnostics.
    #[must_use]
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// The normalized request.
    #[must_use]
    pub fn request(&self) -> &CanonicalRequest {
        &self.request
    }

    /// When the caller issued the request.
    #[must_use]
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn state(&self) -> CallState {
        self.state
    }

    /// Attaches the continuation that receives the terminal value.
    #[must_use]
    pub fn bind<T>(self, continuation: Continuation<T>) -> InterceptedCall<T> {
        InterceptedCall { context: self, continuation }
    }

    pub(crate) fn transition(&mut self, next: CallState) {
        match self.state.advance(next) {
            Ok(state) => self.state = state,
            Err(err) => {
                tracing::error!(call = %self.id, %err, "splice state machine violated");
                if cfg!(debug_assertions) {
                    panic!("{err}");
                }
            }
        }
    }

    /// Completes the call without delivering anything.
    pub(crate) fn abandon(mut self) {
        self.transition(CallState::Completed);
    }
}

impl Drop for CallContext {
    fn drop(&mut self) {
        if self.state != CallState::Completed {
            tracing::warn!(
                call = %self.id,
                state = ?self.state,
                request = %self.request,
                "intercepted call dropped before completing"
            );
        }
    }
}

/// A call bound to the caller's terminal continuation.
///
/// [`fire`](Self::fire) consumes the call, so the continuation cannot be
/// invoked twice.
pub struct InterceptedCall<T> {
    context: CallContext,
    continuation: Continuation<T>,
}

impl<T> InterceptedCall<T> {
    /// Bookkeeping for this call.
    #[must_use]
    pub fn context(&self) -> &CallContext {
        &self.context
    }

    pub(crate) fn into_parts(self) -> (CallContext, Continuation<T>) {
        (self.context, self.continuation)
    }

    /// Marks the call completed and invokes the continuation with `value`.
    ///
    /// A panicking continuation still counts as the one delivery; the panic
    /// is handed back so it can be reported and re-raised.
    pub(crate) fn fire(self, value: T) -> Result<(), DeliveryPanic> {
        let Self { mut context, continuation } = self;
        context.transition(CallState::Completed);
        invoke_guarded(continuation, value).map_err(|payload| DeliveryPanic {
            error: InterceptError::DeliveryFailure {
                request: context.request.clone(),
                reason: panic_message(payload.as_ref()),
            },
            payload,
        })
    }
}

/// Payload of a continuation panic that has already been reported.
///
/// The splicer re-raises this in place of the original payload, so a stage
/// that encloses the failed delivery does not report it a second time.
pub struct ReportedPanic {
    error: InterceptError,
    payload: Box<dyn Any + Send>,
}

impl ReportedPanic {
    pub(crate) fn new(error: InterceptError, payload: Box<dyn Any + Send>) -> Self {
        Self { error, payload }
    }

    /// The delivery failure that was reported.
    #[must_use]
    pub fn error(&self) -> &InterceptError {
        &self.error
    }

    /// The continuation's own panic payload.
    #[must_use]
    pub fn into_payload(self) -> Box<dyn Any + Send> {
        self.payload
    }
}

impl std::fmt::Debug for ReportedPanic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReportedPanic").field("error", &self.error).finish_non_exhaustive()
    }
}

/// A continuation panicked during delivery.
pub(crate) struct DeliveryPanic {
    pub(crate) error: InterceptError,
    pub(crate) payload: Box<dyn Any + Send>,
}

/// Runs `f(value)`, capturing a panic instead of unwinding through the caller.
pub(crate) fn invoke_guarded<T>(
    f: Box<dyn FnOnce(T) + Send + 'static>,
    value: T,
) -> Result<(), Box<dyn Any + Send>> {
    catch_unwind(AssertUnwindSafe(move || f(value)))
}

pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(reported) = payload.downcast_ref::<ReportedPanic>() {
        panic_message(reported.payload.as_ref())
    } else if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "continuation panicked".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    fn delivering_context() -> CallContext {
        let mut context =
            CallContext::new(CanonicalRequest::new("GET", "http://example.test/a"), Utc::now());
        context.transition(CallState::AwaitingDecision);
        context.transition(CallState::Replaying);
        context.transition(CallState::Delivering);
        context
    }

    #[test]
    fn fire_delivers_once_and_completes() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let call = delivering_context().bind(Box::new(move |v: u16| sink.lock().unwrap().push(v)));
        assert!(call.fire(200).is_ok());
        assert_eq!(*seen.lock().unwrap(), vec![200]);
    }

    #[test]
    fn panicking_continuation_becomes_delivery_failure() {
        let call = delivering_context().bind(Box::new(|_: u16| panic!("caller blew up")));
        let Err(panic) = call.fire(200) else {
            panic!("expected a delivery panic");
        };
        assert_eq!(panic.error.kind(), crate::error::ErrorKind::DeliveryFailure);
        assert!(panic.error.to_string().contains("caller blew up"));
    }

    #[test]
    fn reported_panic_keeps_the_original_message() {
        let error = InterceptError::DeliveryFailure {
            request: CanonicalRequest::new("GET", "http://example.test/a"),
            reason: "caller blew up".into(),
        };
        let reported: Box<dyn Any + Send> =
            Box::new(ReportedPanic::new(error, Box::new("caller blew up")));
        assert_eq!(panic_message(reported.as_ref()), "caller blew up");
    }

    #[test]
    fn abandon_completes_without_delivery() {
        let mut context =
            CallContext::new(CanonicalRequest::new("GET", "http://example.test/s"), Utc::now());
        context.transition(CallState::AwaitingDecision);
        context.abandon();
    }

    #[test]
    fn each_context_gets_a_fresh_id() {
        let a = CallContext::new(CanonicalRequest::new("GET", "http://example.test/"), Utc::now());
        let b = CallContext::new(CanonicalRequest::new("GET", "http://example.test/"), Utc::now());
        assert_ne!(a.id(), b.id());
    }
}
