//! Capturing real responses and appending them to the cassette.

use super::call::CallContext;
use super::state::CallState;
use crate::canonical::{CanonicalInteraction, CanonicalResponse};
use crate::cassette::Cassette;
use crate::error::InterceptError;
use crate::ports::Diagnostics;

/// Implemented by response types that can be stored verbatim.
pub trait Capture {
    /// The canonical form of this real response.
    ///
    /// # Errors
    ///
    /// Returns a description of why the response cannot be recorded.
    fn capture(&self) -> Result<CanonicalResponse, String>;
}

/// Appends the captured response for `context`'s request.
///
/// Moves the call through `Recording` to `Delivering`. Failures go to
/// `diagnostics`; the caller still receives the real response.
pub(crate) fn record(
    cassette: &dyn Cassette,
    diagnostics: &dyn Diagnostics,
    context: &mut CallContext,
    captured: Result<CanonicalResponse, String>,
) {
    context.transition(CallState::Recording);
    let outcome = captured.and_then(|response| {
        let interaction = CanonicalInteraction::new(context.request().clone(), response);
        cassette.append(interaction).map_err(|err| err.to_string())
    });
    match outcome {
        Ok(()) => tracing::debug!(call = %context.id(), request = %context.request(), "recorded"),
        Err(reason) => diagnostics.report(
            context.id(),
            &InterceptError::RecordingFailure { request: context.request().clone(), reason },
        ),
    }
    context.transition(CallState::Delivering);
}
