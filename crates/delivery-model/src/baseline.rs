//! Training-time distribution of delivery durations.

use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::ArtifactError;

/// Summary statistics of the training durations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BaselineStats {
    #[serde(rename = "mean_duration")]
    mean: f64,
    #[serde(rename = "std_duration")]
    std_dev: f64,
    count: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    description: Option<String>,
}

impl BaselineStats {
    /// Build validated statistics.
    pub fn new(mean: f64, std_dev: f64, count: u64) -> Result<Self, ArtifactError> {
        let stats = Self {
            mean,
            std_dev,
            count,
            description: None,
        };
        stats.validate()?;
        Ok(stats)
    }

    fn validate(&self) -> Result<(), ArtifactError> {
        if !self.mean.is_finite() {
            return Err(ArtifactError::Invalid(
                "baseline mean_duration must be finite".to_string(),
            ));
        }
        if !self.std_dev.is_finite() || self.std_dev <= 0.0 {
            return Err(ArtifactError::Invalid(format!(
                "baseline std_duration must be positive, got {}",
                self.std_dev
            )));
        }
        if self.count < 2 {
            return Err(ArtifactError::Invalid(format!(
                "baseline count must be at least 2, got {}",
                self.count
            )));
        }
        Ok(())
    }

    /// Parse statistics from a JSON document.
    pub fn from_json(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }

    /// Load and validate statistics from disk.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ArtifactError> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path).map_err(|source| match source.kind() {
            ErrorKind::NotFound => ArtifactError::Missing {
                path: path.to_path_buf(),
            },
            _ => ArtifactError::Unreadable {
                path: path.to_path_buf(),
                source,
            },
        })?;

        let stats = Self::from_json(&raw).map_err(|source| ArtifactError::Malformed {
            path: path.to_path_buf(),
            source,
        })?;
        stats.validate()?;

        info!(
            path = %path.display(),
            mean = stats.mean,
            std_dev = stats.std_dev,
            count = stats.count,
            "Loaded training baseline"
        );
        Ok(stats)
    }

    pub fn mean(&self) -> f64 {
        self.mean
    }

    pub fn std_dev(&self) -> f64 {
        self.std_dev
    }

    pub fn count(&self) -> u64 {
        self.count
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn test_new_rejects_degenerate_stats() {
        assert!(BaselineStats::new(30.0, 10.0, 100).is_ok());
        assert!(BaselineStats::new(30.0, 0.0, 100).is_err());
        assert!(BaselineStats::new(30.0, -1.0, 100).is_err());
        assert!(BaselineStats::new(f64::NAN, 10.0, 100).is_err());
        assert!(BaselineStats::new(30.0, 10.0, 1).is_err());
    }

    #[test]
    fn test_load_artifact() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"mean_duration": 31.4, "std_duration": 17.9, "count": 50000,
                "description": "durations in minutes"}}"#
        )
        .unwrap();

        let stats = BaselineStats::load(file.path()).unwrap();
        assert_eq!(stats.mean(), 31.4);
        assert_eq!(stats.std_dev(), 17.9);
        assert_eq!(stats.count(), 50000);
    }

    #[test]
    fn test_load_rejects_zero_std() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"mean_duration": 31.4, "std_duration": 0, "count": 10}}"#).unwrap();
        assert!(matches!(
            BaselineStats::load(file.path()),
            Err(ArtifactError::Invalid(_))
        ));
    }

    #[test]
    fn test_load_missing_key_is_malformed() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"mean_duration": 31.4, "count": 10}}"#).unwrap();
        assert!(matches!(
            BaselineStats::load(file.path()),
            Err(ArtifactError::Malformed { .. })
        ));
    }
}
