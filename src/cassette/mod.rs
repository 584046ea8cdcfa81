//! The cassette boundary: the store of recorded interactions.
//!
//! The splicing core only talks to a cassette through the [`Cassette`] trait.
//! [`YamlCassette`] is the bundled engine; hosts can supply their own.

pub mod config;
pub mod format;
pub mod matcher;
pub mod record_mode;
pub mod store;

use std::path::Path;

pub use config::CassetteConfig;
pub use matcher::MatchOn;
pub use record_mode::RecordMode;
pub use store::YamlCassette;

use crate::canonical::{CanonicalInteraction, CanonicalRequest};
use crate::error::CassetteError;

/// Narrow interface to a matching and storage engine.
///
/// Implementations serialize their own reads and appends; callers share a
/// cassette across every intercepted call.
pub trait Cassette: Send + Sync {
    /// Whether a stored interaction can answer `request`.
    fn can_play(&self, request: &CanonicalRequest) -> bool;

    /// Returns the interaction matched for `request`.
    ///
    /// Only meaningful after [`can_play`](Self::can_play) returned `true` for
    /// the same request.
    ///
    /// # Errors
    ///
    /// Returns an error when nothing playable matches.
    fn play(&self, request: &CanonicalRequest) -> Result<CanonicalInteraction, CassetteError>;

    /// Adds one interaction. Every call adds a record.
    ///
    /// # Errors
    ///
    /// Returns an error if the interaction cannot be stored.
    fn append(&self, interaction: CanonicalInteraction) -> Result<(), CassetteError>;

    /// Whether a miss is forbidden from reaching the network.
    fn is_write_protected(&self) -> bool;

    /// Whether `request` is subject to recording and write protection.
    fn filter(&self, request: &CanonicalRequest) -> bool;

    /// Cassette identity, used in diagnostics.
    fn path(&self) -> &Path;

    /// The record mode in effect, used in diagnostics.
    fn record_mode(&self) -> RecordMode;
}
