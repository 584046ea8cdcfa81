//! Adapter implementations of the port traits.
//!
//! `live` talks to the real network and the tokio runtime, `deterministic`
//! provides hand-driven doubles for tests, and `intercepting` wraps any
//! client port with the record/replay splicer.

pub mod deterministic;
pub mod intercepting;
pub mod live;
