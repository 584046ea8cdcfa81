//! Detection of request shapes that cannot be replayed faithfully.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A client capability that a recorded interaction cannot emulate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Unsupported {
    /// The request body is produced incrementally.
    StreamingRequestBody,
    /// The caller wants each header line as it arrives.
    HeaderCallback,
    /// The caller wants the response body chunk by chunk.
    StreamingCallback,
}

impl fmt::Display for Unsupported {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::StreamingRequestBody => "a streaming request body",
            Self::HeaderCallback => "a per-chunk header callback",
            Self::StreamingCallback => "a streaming response callback",
        })
    }
}

/// The capabilities a raw client request asks for.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RequestShape {
    /// A body producer is attached instead of a buffered body.
    pub streaming_body: bool,
    /// A header callback is attached.
    pub header_callback: bool,
    /// A streaming response callback is attached.
    pub streaming_callback: bool,
}

impl RequestShape {
    /// A fully buffered request with no per-chunk hooks.
    #[must_use]
    pub fn buffered() -> Self {
        Self::default()
    }

    /// The first unsupported capability, if any.
    #[must_use]
    pub fn unsupported(&self) -> Option<Unsupported> {
        if self.streaming_body {
            Some(Unsupported::StreamingRequestBody)
        } else if self.header_callback {
            Some(Unsupported::HeaderCallback)
        } else if self.streaming_callback {
            Some(Unsupported::StreamingCallback)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn buffered_requests_pass() {
        assert_eq!(RequestShape::buffered().unsupported(), None);
    }

    #[test]
    fn each_hook_is_rejected() {
        let body = RequestShape { streaming_body: true, ..RequestShape::default() };
        let header = RequestShape { header_callback: true, ..RequestShape::default() };
        let chunks = RequestShape { streaming_callback: true, ..RequestShape::default() };
        assert_eq!(body.unsupported(), Some(Unsupported::StreamingRequestBody));
        assert_eq!(header.unsupported(), Some(Unsupported::HeaderCallback));
        assert_eq!(chunks.unsupported(), Some(Unsupported::StreamingCallback));
    }

    #[test]
    fn capability_names_are_readable() {
        assert_eq!(Unsupported::HeaderCallback.to_string(), "a per-chunk header callback");
    }
}
