//! Error types for the scheduling engine

use thiserror::Error;

/// Main error type for engine operations.
///
/// `Timeout` and cooperative cancellation are deliberately *not* errors:
/// both still produce the best result found so far and are reported as
/// flags on the solver output. Only conditions that prevent any usable
/// result surface here.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Malformed configuration or domain snapshot. Raised before any
    /// search work starts; the engine never partially executes on bad
    /// input.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// No assignment satisfies all hard constraints within the search
    /// budget. Retrying identical inputs cannot help; the caller may
    /// relax constraints and resubmit.
    #[error("no feasible timetable found within the search budget")]
    Infeasible,

    /// Error loading configuration from TOML.
    #[error(transparent)]
    Config(#[from] crate::config::ConfigError),
}

/// Result type alias for engine operations
pub type Result<T> = std::result::Result<T, EngineError>;
