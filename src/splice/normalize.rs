//! Conversion of client-specific requests into [`CanonicalRequest`]s.

use super::guard::RequestShape;
use crate::canonical::CanonicalRequest;

/// Implemented by every intercepted client's request type.
pub trait Normalize {
    /// The canonical form used for cassette lookups and recording.
    fn normalize(&self) -> CanonicalRequest;

    /// The capabilities this request asks for.
    fn shape(&self) -> RequestShape {
        RequestShape::buffered()
    }
}
