//! Error types for tool operations.

use std::time::Duration;

use brain_core::{FailureKind, ToolFailure, ToolId};
use delivery_model::{DriftError, FeatureError, ModelError};
use thiserror::Error;

/// Errors that can occur during validation or tool execution.
#[derive(Debug, Error)]
pub enum ToolError {
    /// Tool not found in registry.
    #[error("Tool not found: {0}")]
    NotFound(ToolId),

    /// Missing required parameter.
    #[error("Missing required parameter: {0}")]
    MissingParameter(String),

    /// Parameter not declared by the tool.
    #[error("Unexpected parameter: {0}")]
    UnexpectedParameter(String),

    /// Parameter of the wrong type or outside its domain.
    #[error("Invalid parameter '{name}': {reason}")]
    Validation { name: String, reason: String },

    /// The call depends on trace data that does not exist.
    #[error("{0}")]
    MissingContext(String),

    /// Too few observations to compute a result.
    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    /// General execution error.
    #[error("Execution failed: {0}")]
    ExecutionFailed(String),

    /// The tool did not finish in time.
    #[error("Tool execution timed out after {}ms", .0.as_millis())]
    Timeout(Duration),

    /// JSON parsing failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ToolError {
    pub fn invalid(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Validation {
            name: name.into(),
            reason: reason.into(),
        }
    }

    /// Map onto the failure taxonomy recorded in the trace.
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::NotFound(_) => FailureKind::UnknownTool,
            Self::MissingParameter(_)
            | Self::UnexpectedParameter(_)
            | Self::Validation { .. }
            | Self::Json(_) => FailureKind::Validation,
            Self::MissingContext(_) => FailureKind::MissingContext,
            Self::InsufficientData(_) => FailureKind::InsufficientData,
            Self::ExecutionFailed(_) | Self::Timeout(_) => FailureKind::Execution,
        }
    }

    /// The offending parameter, if the error is about one.
    pub fn field(&self) -> Option<&str> {
        match self {
            Self::MissingParameter(name)
            | Self::UnexpectedParameter(name)
            | Self::Validation { name, .. } => Some(name),
            _ => None,
        }
    }

    /// Only execution failures are worth another attempt.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::ExecutionFailed(_) | Self::Timeout(_))
    }

    pub fn to_failure(&self) -> ToolFailure {
        let failure = ToolFailure::new(self.kind(), self.to_string());
        match self.field() {
            Some(field) => failure.with_field(field),
            None => failure,
        }
    }
}

impl From<FeatureError> for ToolError {
    fn from(error: FeatureError) -> Self {
        Self::invalid(error.field(), error.to_string())
    }
}

impl From<ModelError> for ToolError {
    fn from(error: ModelError) -> Self {
        match error {
            ModelError::Feature(feature) => feature.into(),
            other => Self::ExecutionFailed(other.to_string()),
        }
    }
}

impl From<DriftError> for ToolError {
    fn from(error: DriftError) -> Self {
        match error {
            DriftError::InsufficientData { .. } => Self::InsufficientData(error.to_string()),
            DriftError::NonFinite { .. } => Self::invalid("observations", error.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kinds_follow_taxonomy() {
        assert_eq!(
            ToolError::invalid("weather", "unknown").kind(),
            FailureKind::Validation
        );
        assert_eq!(
            ToolError::Timeout(Duration::from_millis(5)).kind(),
            FailureKind::Execution
        );
        assert_eq!(
            ToolError::NotFound(ToolId::Drift).kind(),
            FailureKind::UnknownTool
        );
        assert!(ToolError::Timeout(Duration::from_millis(5)).is_retryable());
        assert!(!ToolError::MissingContext("none".into()).is_retryable());
    }

    #[test]
    fn test_feature_error_keeps_field() {
        use delivery_model::{Category, Weather};

        let error: ToolError = Weather::parse("foggy").unwrap_err().into();
        let failure = error.to_failure();
        assert_eq!(failure.kind, FailureKind::Validation);
        assert_eq!(failure.field.as_deref(), Some("weather"));
    }

    #[test]
    fn test_drift_error_mapping() {
        let error: ToolError = DriftError::InsufficientData {
            required: 2,
            actual: 1,
        }
        .into();
        assert_eq!(error.kind(), FailureKind::InsufficientData);
    }
}
