//! Diagnostics sink that keeps every report for inspection.

use std::sync::{Mutex, PoisonError};

use uuid::Uuid;

use crate::canonical::CanonicalRequest;
use crate::error::{ErrorKind, InterceptError};
use crate::ports::diagnostics::Diagnostics;

/// Collects reports and silenced calls in arrival order.
#[derive(Debug, Default)]
pub struct CollectingDiagnostics {
    reports: Mutex<Vec<(Uuid, InterceptError)>>,
    abandoned: Mutex<Vec<(Uuid, CanonicalRequest)>>,
}

impl CollectingDiagnostics {
    /// An empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Every report so far.
    #[must_use]
    pub fn reports(&self) -> Vec<(Uuid, InterceptError)> {
        self.reports.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// The kinds of every report so far.
    #[must_use]
    pub fn kinds(&self) -> Vec<ErrorKind> {
        self.reports().iter().map(|(_, error)| error.kind()).collect()
    }

    /// Every silenced call so far.
    #[must_use]
    pub fn silenced_calls(&self) -> Vec<(Uuid, CanonicalRequest)> {
        self.abandoned.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }
}

impl Diagnostics for CollectingDiagnostics {
    fn report(&self, call_id: Uuid, error: &InterceptError) {
        tracing::debug!(call = %call_id, %error, "collected diagnostic");
        self.reports.lock().unwrap_or_else(PoisonError::into_inner).push((call_id, error.clone()));
    }

    fn abandoned(&self, call_id: Uuid, request: &CanonicalRequest) {
        self.abandoned
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((call_id, request.clone()));
    }
}
