//! Error types shared across the crate.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::canonical::CanonicalRequest;
use crate::cassette::RecordMode;
use crate::splice::guard::Unsupported;

/// Machine-readable classification of an [`InterceptError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// The request uses a capability that cannot be replayed.
    UnsupportedRequestShape,
    /// No recorded interaction matched and the cassette forbids recording.
    NoMatchWriteProtected,
    /// The cassette claimed a match but could not produce it.
    PlaybackFailure,
    /// A real response could not be converted or persisted.
    RecordingFailure,
    /// Invoking the caller's continuation failed.
    DeliveryFailure,
}

/// Failures raised while intercepting a call.
///
/// The first three kinds are delivered in-band as synthetic `599` responses.
/// Recording and delivery failures never replace a response; they go to the
/// diagnostics channel.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InterceptError {
    /// The request uses a streaming or per-chunk capability.
    #[error(
        "The request ({request}) uses {capability}, which cannot be replayed from a cassette. \
         Make the request outside an intercepted context."
    )]
    UnsupportedRequestShape {
        /// The offending capability.
        capability: Unsupported,
        /// The normalized request.
        request: CanonicalRequest,
    },

    /// The cassette is write-protected and nothing matched.
    #[error(
        "No match for the request ({request}) was found. Can't overwrite existing cassette \
         ({cassette}) in your current record mode ({record_mode})."
    )]
    NoMatchWriteProtected {
        /// The normalized request.
        request: CanonicalRequest,
        /// Cassette identity (its path).
        cassette: String,
        /// Record mode in effect.
        record_mode: RecordMode,
    },

    /// `can_play` said yes but `play` failed.
    #[error("The cassette ({cassette}) matched the request ({request}) but could not play it: {reason}")]
    PlaybackFailure {
        /// The normalized request.
        request: CanonicalRequest,
        /// Cassette identity (its path).
        cassette: String,
        /// Engine error text.
        reason: String,
    },

    /// A real response could not be captured or appended.
    #[error("Recording the response to ({request}) failed: {reason}")]
    RecordingFailure {
        /// The normalized request.
        request: CanonicalRequest,
        /// What went wrong.
        reason: String,
    },

    /// The caller's continuation panicked.
    #[error("Delivering the response to ({request}) failed: {reason}")]
    DeliveryFailure {
        /// The normalized request.
        request: CanonicalRequest,
        /// Panic payload, when it was a string.
        reason: String,
    },
}

impl InterceptError {
    /// Machine-readable kind of this error.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::UnsupportedRequestShape { .. } => ErrorKind::UnsupportedRequestShape,
            Self::NoMatchWriteProtected { .. } => ErrorKind::NoMatchWriteProtected,
            Self::PlaybackFailure { .. } => ErrorKind::PlaybackFailure,
            Self::RecordingFailure { .. } => ErrorKind::RecordingFailure,
            Self::DeliveryFailure { .. } => ErrorKind::DeliveryFailure,
        }
    }

    /// The request the error concerns.
    #[must_use]
    pub fn request(&self) -> &CanonicalRequest {
        match self {
            Self::UnsupportedRequestShape { request, .. }
            | Self::NoMatchWriteProtected { request, .. }
            | Self::PlaybackFailure { request, .. }
            | Self::RecordingFailure { request, .. }
            | Self::DeliveryFailure { request, .. } => request,
        }
    }
}

/// Failures of the bundled YAML cassette engine.
#[derive(Debug, Error)]
pub enum CassetteError {
    /// The cassette file exists but could not be read.
    #[error("failed to read cassette {}: {source}", path.display())]
    Read {
        /// Cassette path.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The cassette file could not be written.
    #[error("failed to write cassette {}: {source}", path.display())]
    Write {
        /// Cassette path.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The cassette file is not valid cassette YAML.
    #[error("failed to parse cassette {}: {source}", path.display())]
    Parse {
        /// Cassette path.
        path: PathBuf,
        /// Underlying YAML error.
        source: serde_yaml::Error,
    },

    /// Interactions could not be serialized.
    #[error("failed to serialize cassette: {0}")]
    Serialize(#[from] serde_yaml::Error),

    /// `play` was called for a request with no playable match.
    #[error("no playable interaction matches {0}")]
    NoMatch(CanonicalRequest),

    /// A thread panicked while holding the cassette state.
    #[error("cassette state lock poisoned")]
    Poisoned,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_protected_message_names_request_cassette_and_mode() {
        let err = InterceptError::NoMatchWriteProtected {
            request: CanonicalRequest::new("GET", "http://example.test/b"),
            cassette: "fixtures/b.yaml".into(),
            record_mode: RecordMode::None,
        };
        let message = err.to_string();
        assert!(message.contains("http://example.test/b"));
        assert!(message.contains("fixtures/b.yaml"));
        assert!(message.contains("none"));
        assert_eq!(err.kind(), ErrorKind::NoMatchWriteProtected);
    }

    #[test]
    fn kind_serializes_snake_case() {
        let json = serde_json::to_string(&ErrorKind::UnsupportedRequestShape).expect("serialize");
        assert_eq!(json, "\"unsupported_request_shape\"");
    }
}
