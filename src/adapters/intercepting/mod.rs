//! Client adapters that route every request through a [`Splicer`].
//!
//! Each adapter implements the same port as the client it wraps, so callers
//! keep their continuation shape unchanged.
//!
//! [`Splicer`]: crate::splice::Splicer

pub mod agent;
pub mod callback;
pub mod fetch;

pub use agent::InterceptingAgent;
pub use callback::InterceptingCallbackClient;
pub use fetch::InterceptingFetchClient;
