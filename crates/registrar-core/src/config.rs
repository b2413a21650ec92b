//! Event store configuration.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// How replay treats event types this build does not recognise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReplayMode {
    /// Skip unknown events and log a warning.
    #[default]
    Permissive,
    /// Fail the read with `StoreError::UnknownEventType`.
    Strict,
}

/// What `append` does with a creation event on a stream that already exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DuplicateCreationPolicy {
    /// Record and fold it like any other event.
    #[default]
    LastWriteWins,
    /// Fail the append with `StoreError::DuplicateCreation`.
    Reject,
    /// Drop it without persisting anything.
    Ignore,
}

/// A configuration value that could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid value `{value}` for {setting}")]
pub struct InvalidSetting {
    /// The setting being parsed.
    pub setting: &'static str,
    /// The rejected input.
    pub value: String,
}

impl InvalidSetting {
    /// Creates an error for `setting` rejecting `value`.
    #[must_use]
    pub fn new(setting: &'static str, value: impl Into<String>) -> Self {
        Self {
            setting,
            value: value.into(),
        }
    }
}

impl FromStr for ReplayMode {
    type Err = InvalidSetting;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "permissive" => Ok(Self::Permissive),
            "strict" => Ok(Self::Strict),
            _ => Err(InvalidSetting::new("replay mode", s)),
        }
    }
}

impl fmt::Display for ReplayMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Permissive => f.write_str("permissive"),
            Self::Strict => f.write_str("strict"),
        }
    }
}

impl FromStr for DuplicateCreationPolicy {
    type Err = InvalidSetting;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "last-write-wins" | "last_write_wins" => Ok(Self::LastWriteWins),
            "reject" => Ok(Self::Reject),
            "ignore" => Ok(Self::Ignore),
            _ => Err(InvalidSetting::new("duplicate creation policy", s)),
        }
    }
}

impl fmt::Display for DuplicateCreationPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LastWriteWins => f.write_str("last-write-wins"),
            Self::Reject => f.write_str("reject"),
            Self::Ignore => f.write_str("ignore"),
        }
    }
}

/// Tunables for an `EventStore`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreConfig {
    /// Treatment of unknown event types during replay.
    pub replay_mode: ReplayMode,
    /// Treatment of repeated creation events.
    pub duplicate_creation: DuplicateCreationPolicy,
    /// How many times `append` re-runs after a concurrent modification.
    pub max_conflict_retries: u32,
    /// Whether projections are kept in the in-process cache.
    pub cache_projections: bool,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            replay_mode: ReplayMode::default(),
            duplicate_creation: DuplicateCreationPolicy::default(),
            max_conflict_retries: 3,
            cache_projections: true,
        }
    }
}

impl StoreConfig {
    /// Sets the replay mode.
    #[must_use]
    pub fn with_replay_mode(mut self, replay_mode: ReplayMode) -> Self {
        self.replay_mode = replay_mode;
        self
    }

    /// Sets the duplicate creation policy.
    #[must_use]
    pub fn with_duplicate_creation(mut self, policy: DuplicateCreationPolicy) -> Self {
        self.duplicate_creation = policy;
        self
    }

    /// Sets the conflict retry budget.
    #[must_use]
    pub fn with_max_conflict_retries(mut self, retries: u32) -> Self {
        self.max_conflict_retries = retries;
        self
    }

    /// Enables or disables the projection cache.
    #[must_use]
    pub fn with_cache_projections(mut self, enabled: bool) -> Self {
        self.cache_projections = enabled;
        self
    }
}
