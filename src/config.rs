//! Interception settings assembled from the environment and CLI flags.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Args;

use crate::cassette::{CassetteConfig, MatchOn, RecordMode, YamlCassette};
use crate::error::CassetteError;
use crate::ports::Scheduler;
use crate::splice::{SilencedPaths, Splicer};

/// Default cassette location, relative to the working directory.
pub const DEFAULT_CASSETTE: &str = "cassettes/vcr-splice.yaml";

/// Cassette and policy flags. Every flag falls back to a `VCR_*` variable.
#[derive(Debug, Clone, Args)]
pub struct InterceptArgs {
    /// Cassette file to replay from and record into.
    #[arg(long, env = "VCR_CASSETTE", default_value = DEFAULT_CASSETTE)]
    pub cassette: PathBuf,

    /// When new interactions may be recorded: once, new_episodes, none, all.
    #[arg(long, env = "VCR_RECORD_MODE", default_value_t = RecordMode::Once)]
    pub record_mode: RecordMode,

    /// Comma-separated request aspects that must match for replay.
    #[arg(
        long,
        env = "VCR_MATCH_ON",
        value_delimiter = ',',
        default_values_t = MatchOn::DEFAULT
    )]
    pub match_on: Vec<MatchOn>,

    /// Comma-separated hosts that bypass the cassette.
    #[arg(long, env = "VCR_IGNORE_HOSTS", value_delimiter = ',')]
    pub ignore_hosts: Vec<String>,

    /// Let requests to the local machine bypass the cassette.
    #[arg(long, env = "VCR_IGNORE_LOCALHOST")]
    pub ignore_localhost: bool,

    /// Comma-separated request headers never written to the cassette.
    #[arg(long, env = "VCR_FILTER_HEADERS", value_delimiter = ',')]
    pub filter_headers: Vec<String>,

    /// Comma-separated path prefixes whose write-protected misses are
    /// dropped without a response.
    #[arg(long, env = "VCR_SILENCED_PATHS", value_delimiter = ',')]
    pub silenced_paths: Vec<String>,

    /// Allow a recorded interaction to answer more than one request.
    #[arg(long, env = "VCR_ALLOW_PLAYBACK_REPEATS")]
    pub allow_playback_repeats: bool,
}

/// Everything needed to open a cassette and build a [`Splicer`] over it.
#[derive(Debug, Clone)]
pub struct InterceptConfig {
    /// Cassette file path.
    pub cassette_path: PathBuf,
    /// Engine options.
    pub cassette: CassetteConfig,
    /// Write-protection drop allow-list.
    pub silenced_paths: SilencedPaths,
}

impl Default for InterceptConfig {
    fn default() -> Self {
        Self {
            cassette_path: PathBuf::from(DEFAULT_CASSETTE),
            cassette: CassetteConfig::default(),
            silenced_paths: SilencedPaths::default(),
        }
    }
}

impl From<InterceptArgs> for InterceptConfig {
    fn from(args: InterceptArgs) -> Self {
        Self {
            cassette_path: args.cassette,
            cassette: CassetteConfig {
                record_mode: args.record_mode,
                match_on: args.match_on,
                allow_playback_repeats: args.allow_playback_repeats,
                ignore_hosts: non_empty(args.ignore_hosts),
                ignore_localhost: args.ignore_localhost,
                filter_headers: non_empty(args.filter_headers),
            },
            silenced_paths: SilencedPaths::new(args.silenced_paths),
        }
    }
}

impl InterceptConfig {
    /// Loads the configured cassette.
    ///
    /// # Errors
    ///
    /// Returns an error if an existing cassette file cannot be read or parsed.
    pub fn open_cassette(&self) -> Result<YamlCassette, CassetteError> {
        YamlCassette::load(&self.cassette_path, self.cassette.clone())
    }

    /// A splicer over `cassette` with this config's policy.
    pub fn splicer(&self, cassette: Arc<YamlCassette>, scheduler: Arc<dyn Scheduler>) -> Splicer {
        Splicer::new(cassette, scheduler).with_silenced_paths(self.silenced_paths.clone())
    }
}

/// Loads `.env` from the working directory or its parents, if present.
pub fn load_dotenv() {
    match dotenvy::dotenv() {
        Ok(path) => tracing::debug!(path = %path.display(), "loaded .env"),
        Err(err) if err.not_found() => {}
        Err(err) => eprintln!("warning: ignoring unreadable .env: {err}"),
    }
}

fn non_empty(values: Vec<String>) -> Vec<String> {
    values.into_iter().map(|v| v.trim().to_string()).filter(|v| !v.is_empty()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Debug, Parser)]
    struct Harness {
        #[command(flatten)]
        intercept: InterceptArgs,
    }

    #[test]
    fn flags_build_cassette_config() {
        let harness = Harness::parse_from([
            "test",
            "--cassette",
            "fixtures/api.yaml",
            "--record-mode",
            "new_episodes",
            "--match-on",
            "method,path,query",
            "--ignore-hosts",
            "metrics.example.test, ,",
            "--silenced-paths",
            "/v2/subscribe",
        ]);
        let config = InterceptConfig::from(harness.intercept);
        assert_eq!(config.cassette_path, PathBuf::from("fixtures/api.yaml"));
        assert_eq!(config.cassette.record_mode, RecordMode::NewEpisodes);
        assert_eq!(config.cassette.match_on, vec![MatchOn::Method, MatchOn::Path, MatchOn::Query]);
        assert_eq!(config.cassette.ignore_hosts, vec!["metrics.example.test"]);
        assert!(!config.silenced_paths.is_empty());
    }

    #[test]
    fn defaults_match_the_engine_defaults() {
        let harness = Harness::parse_from(["test"]);
        let config = InterceptConfig::from(harness.intercept);
        assert_eq!(config.cassette.record_mode, RecordMode::Once);
        assert_eq!(config.cassette.match_on, MatchOn::DEFAULT.to_vec());
        assert!(config.silenced_paths.is_empty());
    }
}
