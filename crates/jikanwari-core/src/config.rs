//! Solver configuration.
//!
//! The host surfaces `timeout_ms` and `max_patterns` as its timeout and
//! pattern-count controls; everything the search consults is in here and
//! passed by value, never ambient.
//!
//! # Examples
//!
//! ```
//! use jikanwari_core::SolverConfig;
//!
//! let config = SolverConfig::from_toml_str(r#"
//!     timeout_ms = 3000
//!     max_patterns = 8
//!     random_seed = 42
//! "#).unwrap();
//!
//! assert_eq!(config.max_patterns, 8);
//! assert_eq!(config.time_limit().as_secs(), 3);
//! ```

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::constraint::SoftWeights;
use crate::error::{EngineError, Result};

/// Configuration error
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
}

/// Main solver configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", default)]
pub struct SolverConfig {
    /// Wall-clock search budget in milliseconds. Signed so that a host
    /// passing a negative value fails validation instead of wrapping.
    pub timeout_ms: i64,

    /// How many distinct candidate timetables to collect.
    pub max_patterns: usize,

    /// Seed for every random choice the search makes. Identical inputs
    /// and seed reproduce the exact candidate list.
    pub random_seed: u64,

    /// Soft-constraint weights used while ranking candidates.
    pub weights: SoftWeights,
}

impl Default for SolverConfig {
    fn default() -> Self {
        SolverConfig {
            timeout_ms: 5_000,
            max_patterns: 5,
            random_seed: 0,
            weights: SoftWeights::default(),
        }
    }
}

impl SolverConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from a TOML file.
    pub fn from_toml_file(path: impl AsRef<Path>) -> std::result::Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    /// Parses configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> std::result::Result<Self, ConfigError> {
        Ok(toml::from_str(s)?)
    }

    pub fn with_timeout_ms(mut self, timeout_ms: i64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    pub fn with_max_patterns(mut self, max_patterns: usize) -> Self {
        self.max_patterns = max_patterns;
        self
    }

    pub fn with_random_seed(mut self, random_seed: u64) -> Self {
        self.random_seed = random_seed;
        self
    }

    pub fn with_weights(mut self, weights: SoftWeights) -> Self {
        self.weights = weights;
        self
    }

    /// The search budget as a `Duration`. Only meaningful after
    /// [`validate`](Self::validate).
    pub fn time_limit(&self) -> Duration {
        Duration::from_millis(self.timeout_ms.max(0) as u64)
    }

    /// Fails fast on budgets and pattern counts the search cannot honor.
    pub fn validate(&self) -> Result<()> {
        if self.timeout_ms <= 0 {
            return Err(EngineError::InvalidInput(format!(
                "timeout_ms must be positive, got {}",
                self.timeout_ms
            )));
        }
        if self.max_patterns == 0 {
            return Err(EngineError::InvalidInput(
                "max_patterns must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert!(SolverConfig::default().validate().is_ok());
    }

    #[test]
    fn negative_timeout_is_rejected() {
        let config = SolverConfig::new().with_timeout_ms(-100);
        assert!(config.validate().is_err());
    }

    #[test]
    fn zero_patterns_is_rejected() {
        let config = SolverConfig::new().with_max_patterns(0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn toml_parsing() {
        let config = SolverConfig::from_toml_str(
            r#"
            timeout_ms = 250
            max_patterns = 3
            random_seed = 7

            [weights]
            teacher_load_balance = 2.0
        "#,
        )
        .unwrap();
        assert_eq!(config.time_limit(), Duration::from_millis(250));
        assert_eq!(config.max_patterns, 3);
        assert_eq!(config.random_seed, 7);
        assert_eq!(config.weights.teacher_load_balance, 2.0);
    }
}
