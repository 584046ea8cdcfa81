//! Options for the bundled cassette engine.

use super::{MatchOn, RecordMode};

/// Behavior knobs for a [`YamlCassette`](super::YamlCassette).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CassetteConfig {
    /// When new interactions may be recorded.
    pub record_mode: RecordMode,
    /// Matchers that must all agree for a recording to answer a request.
    pub match_on: Vec<MatchOn>,
    /// Allow a recorded interaction to be played more than once.
    pub allow_playback_repeats: bool,
    /// Hosts that are neither recorded nor write-protected.
    pub ignore_hosts: Vec<String>,
    /// Treat `localhost`, `127.0.0.1` and `::1` as ignored hosts.
    pub ignore_localhost: bool,
    /// Request headers stripped before an interaction is stored.
    pub filter_headers: Vec<String>,
}

impl Default for CassetteConfig {
    fn default() -> Self {
        Self {
            record_mode: RecordMode::default(),
            match_on: MatchOn::DEFAULT.to_vec(),
            allow_playback_repeats: false,
            ignore_hosts: Vec::new(),
            ignore_localhost: false,
            filter_headers: Vec::new(),
        }
    }
}

impl CassetteConfig {
    /// Returns a config with the given record mode and defaults elsewhere.
    #[must_use]
    pub fn with_record_mode(record_mode: RecordMode) -> Self {
        Self { record_mode, ..Self::default() }
    }

    /// Whether requests to `host` bypass the cassette entirely.
    #[must_use]
    pub fn is_ignored_host(&self, host: &str) -> bool {
        let host = host.trim_start_matches('[').trim_end_matches(']');
        if self.ignore_localhost && matches!(host, "localhost" | "127.0.0.1" | "::1" | "0.0.0.0") {
            return true;
        }
        self.ignore_hosts.iter().any(|ignored| ignored.eq_ignore_ascii_case(host))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_matches_on_method_and_uri() {
        let config = CassetteConfig::default();
        assert_eq!(config.match_on, vec![MatchOn::Method, MatchOn::Uri]);
        assert_eq!(config.record_mode, RecordMode::Once);
    }

    #[test]
    fn localhost_only_ignored_when_enabled() {
        let mut config = CassetteConfig::default();
        assert!(!config.is_ignored_host("localhost"));
        config.ignore_localhost = true;
        assert!(config.is_ignored_host("localhost"));
        assert!(config.is_ignored_host("[::1]"));
    }

    #[test]
    fn ignore_hosts_is_case_insensitive() {
        let config = CassetteConfig {
            ignore_hosts: vec!["Metrics.Example.Test".into()],
            ..CassetteConfig::default()
        };
        assert!(config.is_ignored_host("metrics.example.test"));
        assert!(!config.is_ignored_host("api.example.test"));
    }
}
