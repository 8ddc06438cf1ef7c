//! Error types for brain operations.

use thiserror::Error;

/// Errors that can occur while a brain decides the next step.
#[derive(Debug, Error)]
pub enum BrainError {
    /// The brain is temporarily unavailable.
    #[error("brain unavailable: {0}")]
    Unavailable(String),

    /// The brain could not produce a decision for this query.
    #[error("decision failed: {0}")]
    DecisionFailed(String),

    /// The brain was misconfigured.
    #[error("configuration error: {0}")]
    Configuration(String),
}
