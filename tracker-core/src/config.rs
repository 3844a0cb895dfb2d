//! Session configuration.

use crate::history::DEFAULT_HISTORY_LIMIT;
use std::path::PathBuf;

/// Environment variable naming the setup file.
pub const ENV_SAVE_PATH: &str = "TRACKER_SAVE_PATH";
/// Environment variable holding a dice seed.
pub const ENV_DICE_SEED: &str = "TRACKER_DICE_SEED";
/// Environment variable overriding the undo depth.
pub const ENV_HISTORY_LIMIT: &str = "TRACKER_HISTORY_LIMIT";

/// Default setup file, relative to the working directory.
pub const DEFAULT_SAVE_FILE: &str = "tracker_setup.json";

/// Configuration for a combat session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackerConfig {
    /// Maximum undo snapshots kept.
    pub history_limit: usize,
    /// Where the setup is saved and loaded.
    pub save_path: Option<PathBuf>,
    /// Seed for reproducible dice; `None` uses the thread RNG.
    pub dice_seed: Option<u64>,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            history_limit: DEFAULT_HISTORY_LIMIT,
            save_path: None,
            dice_seed: None,
        }
    }
}

impl TrackerConfig {
    /// Defaults overridden by any `TRACKER_*` variables that parse.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(path) = std::env::var(ENV_SAVE_PATH) {
            if !path.trim().is_empty() {
                config.save_path = Some(PathBuf::from(path));
            }
        }
        match std::env::var(ENV_DICE_SEED).map(|s| s.trim().parse::<u64>()) {
            Ok(Ok(seed)) => config.dice_seed = Some(seed),
            Ok(Err(e)) => tracing::warn!(error = %e, "ignoring {ENV_DICE_SEED}"),
            Err(_) => {}
        }
        match std::env::var(ENV_HISTORY_LIMIT).map(|s| s.trim().parse::<usize>()) {
            Ok(Ok(limit)) => config.history_limit = limit.max(1),
            Ok(Err(e)) => tracing::warn!(error = %e, "ignoring {ENV_HISTORY_LIMIT}"),
            Err(_) => {}
        }
        config
    }

    /// Set the undo depth (at least 1).
    pub fn with_history_limit(mut self, limit: usize) -> Self {
        self.history_limit = limit.max(1);
        self
    }

    /// Set the setup file path.
    pub fn with_save_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.save_path = Some(path.into());
        self
    }

    /// Seed the dice.
    pub fn with_dice_seed(mut self, seed: u64) -> Self {
        self.dice_seed = Some(seed);
        self
    }

    /// The configured save path, or [`DEFAULT_SAVE_FILE`].
    pub fn save_path_or_default(&self) -> PathBuf {
        self.save_path
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_SAVE_FILE))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = TrackerConfig::default();
        assert_eq!(config.history_limit, 50);
        assert!(config.dice_seed.is_none());
        assert_eq!(
            config.save_path_or_default(),
            PathBuf::from("tracker_setup.json")
        );
    }

    #[test]
    fn test_builders() {
        let config = TrackerConfig::default()
            .with_history_limit(0)
            .with_save_path("party.json")
            .with_dice_seed(7);
        assert_eq!(config.history_limit, 1);
        assert_eq!(config.save_path, Some(PathBuf::from("party.json")));
        assert_eq!(config.dice_seed, Some(7));
    }
}
