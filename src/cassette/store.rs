//! YAML-backed cassette engine.

use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use chrono::Utc;

use super::format::CassetteFile;
use super::matcher::requests_match;
use super::{Cassette, CassetteConfig, RecordMode};
use crate::canonical::{CanonicalInteraction, CanonicalRequest};
use crate::error::CassetteError;

/// Interactions loaded from disk plus those recorded this session.
#[derive(Debug, Default)]
struct State {
    /// Interactions read from the cassette file, in file order.
    recorded: Vec<CanonicalInteraction>,
    /// How often each entry of `recorded` has been played.
    play_counts: Vec<u32>,
    /// Interactions appended since load. Never played back.
    appended: Vec<CanonicalInteraction>,
}

/// A cassette stored as a single YAML file.
///
/// Recorded interactions are served in file order, each at most once unless
/// playback repeats are allowed. New interactions stay in memory until
/// [`save`](Self::save).
#[derive(Debug)]
pub struct YamlCassette {
    path: PathBuf,
    name: String,
    config: CassetteConfig,
    /// Whether interactions were loaded from an existing file.
    rewound: bool,
    state: Mutex<State>,
}

impl YamlCassette {
    /// Loads the cassette at `path`. A missing file yields an empty cassette.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load(path: impl Into<PathBuf>, config: CassetteConfig) -> Result<Self, CassetteError> {
        let path = path.into();
        if !path.exists() {
            tracing::debug!(path = %path.display(), "cassette file not found, starting empty");
            return Ok(Self::empty(path, config));
        }
        let file = CassetteFile::read(&path)?;
        tracing::debug!(
            path = %path.display(),
            interactions = file.interactions.len(),
            "loaded cassette"
        );
        let mut cassette = Self::from_interactions(path, config, file.interactions);
        cassette.name = file.name;
        Ok(cassette)
    }

    /// An empty cassette that has not been loaded from disk.
    pub fn empty(path: impl Into<PathBuf>, config: CassetteConfig) -> Self {
        let path = path.into();
        Self {
            name: default_name(&path),
            path,
            config,
            rewound: false,
            state: Mutex::new(State::default()),
        }
    }

    /// A cassette holding `interactions` as if they had been loaded from disk.
    pub fn from_interactions(
        path: impl Into<PathBuf>,
        config: CassetteConfig,
        interactions: Vec<CanonicalInteraction>,
    ) -> Self {
        let path = path.into();
        let play_counts = vec![0; interactions.len()];
        Self {
            name: default_name(&path),
            path,
            config,
            rewound: true,
            state: Mutex::new(State { recorded: interactions, play_counts, appended: Vec::new() }),
        }
    }

    /// Engine configuration.
    #[must_use]
    pub fn config(&self) -> &CassetteConfig {
        &self.config
    }

    /// Interactions appended since load.
    ///
    /// # Errors
    ///
    /// Returns an error if the state lock is poisoned.
    pub fn new_interactions(&self) -> Result<Vec<CanonicalInteraction>, CassetteError> {
        Ok(self.lock()?.appended.clone())
    }

    /// Whether every loaded interaction has been played at least once.
    ///
    /// # Errors
    ///
    /// Returns an error if the state lock is poisoned.
    pub fn all_played(&self) -> Result<bool, CassetteError> {
        Ok(self.lock()?.play_counts.iter().all(|&count| count > 0))
    }

    /// Writes loaded and appended interactions to disk.
    ///
    /// Nothing is written when no interaction was appended. Returns the path
    /// when a file was written.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be serialized or written.
    pub fn save(&self) -> Result<Option<PathBuf>, CassetteError> {
        let file = {
            let state = self.lock()?;
            if state.appended.is_empty() {
                return Ok(None);
            }
            CassetteFile {
                name: self.name.clone(),
                recorded_at: Utc::now(),
                interactions: state.recorded.iter().chain(&state.appended).cloned().collect(),
            }
        };
        let yaml = serde_yaml::to_string(&file)?;
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .map_err(|source| CassetteError::Write { path: self.path.clone(), source })?;
        }
        std::fs::write(&self.path, yaml)
            .map_err(|source| CassetteError::Write { path: self.path.clone(), source })?;
        tracing::info!(
            path = %self.path.display(),
            interactions = file.interactions.len(),
            "cassette saved"
        );
        Ok(Some(self.path.clone()))
    }

    fn lock(&self) -> Result<MutexGuard<'_, State>, CassetteError> {
        self.state.lock().map_err(|_| CassetteError::Poisoned)
    }

    fn find_playable(&self, state: &State, request: &CanonicalRequest) -> Option<usize> {
        state.recorded.iter().enumerate().position(|(idx, interaction)| {
            (self.config.allow_playback_repeats || state.play_counts[idx] == 0)
                && requests_match(&self.config.match_on, request, &interaction.request)
        })
    }
}

impl Cassette for YamlCassette {
    fn can_play(&self, request: &CanonicalRequest) -> bool {
        if self.config.record_mode == RecordMode::All {
            return false;
        }
        match self.lock() {
            Ok(state) => self.find_playable(&state, request).is_some(),
            Err(err) => {
                tracing::error!(%err, "cannot consult cassette");
                false
            }
        }
    }

    fn play(&self, request: &CanonicalRequest) -> Result<CanonicalInteraction, CassetteError> {
        let mut state = self.lock()?;
        let idx = self
            .find_playable(&state, request)
            .ok_or_else(|| CassetteError::NoMatch(request.clone()))?;
        state.play_counts[idx] += 1;
        Ok(state.recorded[idx].clone())
    }

    fn append(&self, mut interaction: CanonicalInteraction) -> Result<(), CassetteError> {
        if !self.filter(&interaction.request) {
            tracing::debug!(request = %interaction.request, "request filtered, not recording");
            return Ok(());
        }
        for name in &self.config.filter_headers {
            interaction.request.headers.remove(name);
        }
        self.lock()?.appended.push(interaction);
        Ok(())
    }

    fn is_write_protected(&self) -> bool {
        (self.rewound && self.config.record_mode == RecordMode::Once)
            || self.config.record_mode == RecordMode::None
    }

    fn filter(&self, request: &CanonicalRequest) -> bool {
        !self.config.is_ignored_host(&request.host())
    }

    fn path(&self) -> &Path {
        &self.path
    }

    fn record_mode(&self) -> RecordMode {
        self.config.record_mode
    }
}

fn default_name(path: &Path) -> String {
    path.file_stem().map_or_else(|| "cassette".to_string(), |s| s.to_string_lossy().into_owned())
}
