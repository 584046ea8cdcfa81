//! Diagnostics sink that logs through `tracing`.

use uuid::Uuid;

use crate::canonical::CanonicalRequest;
use crate::error::InterceptError;
use crate::ports::diagnostics::Diagnostics;

/// Logs every reported failure at error level.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingDiagnostics;

impl Diagnostics for TracingDiagnostics {
    fn report(&self, call_id: Uuid, error: &InterceptError) {
        tracing::error!(
            call = %call_id,
            kind = ?error.kind(),
            request = %error.request(),
            %error,
            "interception failure"
        );
    }

    fn abandoned(&self, call_id: Uuid, request: &CanonicalRequest) {
        tracing::info!(call = %call_id, %request, "silenced call, no response will be delivered");
    }
}
