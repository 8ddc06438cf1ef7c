//! Error types for orchestrator operations.

use brain_core::BrainError;
use delivery_model::ArtifactError;
use thiserror::Error;

/// Errors that can occur while starting or running the orchestrator.
///
/// Tool failures are not errors at this level: they are recorded in the
/// trace and surfaced in the answer.
#[derive(Debug, Error)]
pub enum OrchestratorError {
    /// An environment setting is present but unusable.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// A model or baseline artifact could not be loaded.
    #[error("artifact error: {0}")]
    Artifact(#[from] ArtifactError),

    /// Brain processing failed.
    #[error("brain error: {0}")]
    Brain(#[from] BrainError),
}

impl OrchestratorError {
    pub fn config(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }
}
