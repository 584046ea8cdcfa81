//! Record modes controlling when a cassette may grow.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// How a cassette treats requests it has no recording for.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordMode {
    /// Record into a new cassette; replay only once a cassette file exists.
    #[default]
    Once,
    /// Replay what exists and record anything new.
    NewEpisodes,
    /// Never record.
    None,
    /// Always record, never replay.
    All,
}

impl RecordMode {
    /// Canonical lower-case name.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Once => "once",
            Self::NewEpisodes => "new_episodes",
            Self::None => "none",
            Self::All => "all",
        }
    }
}

impl fmt::Display for RecordMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RecordMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "once" => Ok(Self::Once),
            "new_episodes" => Ok(Self::NewEpisodes),
            "none" => Ok(Self::None),
            "all" => Ok(Self::All),
            other => Err(format!(
                "unknown record mode {other:?} (expected once, new_episodes, none or all)"
            )),
        }
    }
}
