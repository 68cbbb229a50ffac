// src/error.rs
//
// Typed errors for the simulation core and the decision-serving surface.

use thiserror::Error;

/// Errors surfaced by the environment and serving layers.
///
/// A failed action inside a simulation step is NOT an error; it is recorded
/// on the step outcome and priced into the reward. These variants cover the
/// boundaries: bad scenario parameters, malformed wire input, and serving
/// degradation.
#[derive(Debug, Error)]
pub enum Error {
    /// Scenario parameters rejected at reset time.
    #[error("invalid scenario configuration: {0}")]
    Configuration(String),

    /// Malformed or out-of-range action / observation / comparison input.
    #[error("validation error: {0}")]
    Validation(String),

    /// Observation vector length does not match the configured encoding.
    #[error("observation dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// No trained policy artifact is loaded. Fatal for comparison calls;
    /// prediction degrades to the random fallback instead of returning this.
    #[error("no policy artifact loaded")]
    ResourceUnavailable,

    /// The decision service could not be reached. Raised by embedding layers
    /// that talk to a remotely deployed server; callers are expected to fold
    /// this into a degraded model status rather than propagate it.
    #[error("decision service unavailable: {0}")]
    Transport(String),
}

impl Error {
    /// True for the validation family (including dimension mismatches).
    pub fn is_validation(&self) -> bool {
        matches!(self, Error::Validation(_) | Error::DimensionMismatch { .. })
    }
}

pub type Result<T> = std::result::Result<T, Error>;
