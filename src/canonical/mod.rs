//! Client-independent request, response and interaction shapes.
//!
//! Every intercepted client normalizes into these types before the cassette
//! is consulted, and every recorded interaction is stored in them.

mod body;
pub mod headers;
pub mod request;
pub mod response;

pub use headers::Headers;
pub use request::CanonicalRequest;
pub use response::{CanonicalInteraction, CanonicalResponse, Status};
