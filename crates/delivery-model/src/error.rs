//! Error types for model, artifact and drift operations.

use std::path::PathBuf;

use thiserror::Error;

/// A feature value outside its declared domain.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FeatureError {
    /// The value does not name any category of the field.
    #[error("unknown {field} '{value}' (allowed: {allowed})")]
    UnknownCategory {
        field: &'static str,
        value: String,
        allowed: String,
    },

    /// The distance is not a finite value in the accepted range.
    #[error("distance_km must be greater than 0 and at most {max} km, got {value}")]
    InvalidDistance { value: f64, max: f64 },
}

impl FeatureError {
    /// The name of the offending field.
    pub fn field(&self) -> &'static str {
        match self {
            Self::UnknownCategory { field, .. } => field,
            Self::InvalidDistance { .. } => "distance_km",
        }
    }
}

/// Errors raised by a model call.
#[derive(Debug, Error)]
pub enum ModelError {
    /// The input could not form a valid feature vector.
    #[error(transparent)]
    Feature(#[from] FeatureError),

    /// The model produced a value that is not a usable duration.
    #[error("model produced a non-finite duration")]
    NonFinite,
}

/// Errors loading a persisted artifact. All of these are fatal at startup.
#[derive(Debug, Error)]
pub enum ArtifactError {
    /// The artifact file does not exist.
    #[error("artifact not found: {}", path.display())]
    Missing { path: PathBuf },

    /// The artifact exists but could not be read.
    #[error("failed to read artifact {}: {source}", path.display())]
    Unreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The artifact is not valid JSON for its schema.
    #[error("malformed artifact {}: {source}", path.display())]
    Malformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// The artifact parsed but its values are unusable.
    #[error("invalid artifact: {0}")]
    Invalid(String),
}

/// Errors raised by the drift detector.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DriftError {
    /// Too few observations for a standard deviation.
    #[error("need at least {required} observations, got {actual}")]
    InsufficientData { required: usize, actual: usize },

    /// An observation was NaN or infinite.
    #[error("observation {index} is not a finite number")]
    NonFinite { index: usize },
}
