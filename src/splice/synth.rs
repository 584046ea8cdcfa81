//! Building client responses from recorded interactions and failures.

use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::canonical::CanonicalInteraction;
use crate::error::InterceptError;

/// Status code of synthetic interception failures. Not a real HTTP status.
pub const INTERCEPT_FAILURE_STATUS: u16 = 599;

/// Reason phrase paired with [`INTERCEPT_FAILURE_STATUS`].
pub const INTERCEPT_FAILURE_REASON: &str = "Unknown";

/// Implemented by every intercepted client's response type.
pub trait Synthesize: Sized {
    /// A response equivalent to what the real client would have produced for
    /// the recorded interaction.
    fn replayed(interaction: &CanonicalInteraction, elapsed: Duration) -> Self;

    /// A `599` response carrying `error`.
    fn failed(error: InterceptError, elapsed: Duration) -> Self;
}

/// Time between `started_at` and `now`, clamped at zero for clock skew.
#[must_use]
pub fn elapsed_between(started_at: DateTime<Utc>, now: DateTime<Utc>) -> Duration {
    (now - started_at).to_std().unwrap_or_default()
}
