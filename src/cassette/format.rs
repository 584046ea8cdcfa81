//! Cassette file layout.

use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::canonical::CanonicalInteraction;
use crate::error::CassetteError;

/// A cassette file: metadata plus recorded interactions in order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CassetteFile {
    /// Human-readable name for this cassette.
    pub name: String,
    /// When this cassette was last written.
    pub recorded_at: DateTime<Utc>,
    /// Ordered list of interactions.
    #[serde(default)]
    pub interactions: Vec<CanonicalInteraction>,
}

impl CassetteFile {
    /// Reads and parses the cassette file at `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not cassette YAML.
    pub fn read(path: &Path) -> Result<Self, CassetteError> {
        let content = std::fs::read_to_string(path)
            .map_err(|source| CassetteError::Read { path: path.to_path_buf(), source })?;
        serde_yaml::from_str(&content)
            .map_err(|source| CassetteError::Parse { path: path.to_path_buf(), source })
    }
}
