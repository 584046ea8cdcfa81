//! Diagnostics port for failures that must not reach the caller in-band.

use uuid::Uuid;

use crate::canonical::CanonicalRequest;
use crate::error::InterceptError;

/// Receives recording and delivery failures.
///
/// These are reported after the caller has been served where possible; they
/// never replace or suppress a response.
pub trait Diagnostics: Send + Sync {
    /// Reports a failure observed while handling call `call_id`.
    fn report(&self, call_id: Uuid, error: &InterceptError);

    /// Notes that call `call_id` was silenced: it completed and its caller
    /// will never be answered.
    fn abandoned(&self, call_id: Uuid, request: &CanonicalRequest);
}
