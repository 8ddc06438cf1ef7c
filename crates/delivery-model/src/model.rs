//! Delivery-time regression model loaded from a persisted artifact.

use std::collections::HashMap;
use std::fs;
use std::hash::Hash;
use std::io::ErrorKind;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{ArtifactError, ModelError};
use crate::features::{
    Category, DriverExperience, FeatureVector, TrafficLevel, VehicleType, Weather,
};

/// Artifact format tag this loader understands.
const ARTIFACT_FORMAT: &str = "multiplicative-v1";

/// A trained delivery-time model.
pub trait DeliveryModel: Send + Sync {
    /// Predict the delivery duration in minutes.
    fn predict(&self, features: &FeatureVector) -> Result<f64, ModelError>;
}

/// Persisted model parameters.
///
/// Travel time is `distance / speed(vehicle)` scaled by one factor per
/// condition, plus a fixed handling overhead, floored at a minimum duration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelArtifact {
    pub format: String,
    pub vehicle_speed_kmh: HashMap<VehicleType, f64>,
    pub weather_factor: HashMap<Weather, f64>,
    pub traffic_factor: HashMap<TrafficLevel, f64>,
    pub experience_factor: HashMap<DriverExperience, f64>,
    pub fixed_overhead_mins: f64,
    pub min_duration_mins: f64,
    /// Reference point that attributions are measured against.
    pub reference: FeatureVector,
}

impl ModelArtifact {
    /// Check every category has a positive parameter.
    pub fn validate(&self) -> Result<(), ArtifactError> {
        if self.format != ARTIFACT_FORMAT {
            return Err(ArtifactError::Invalid(format!(
                "unsupported model format '{}' (expected '{}')",
                self.format, ARTIFACT_FORMAT
            )));
        }

        check_table(&self.vehicle_speed_kmh)?;
        check_table(&self.weather_factor)?;
        check_table(&self.traffic_factor)?;
        check_table(&self.experience_factor)?;

        if !self.fixed_overhead_mins.is_finite() || self.fixed_overhead_mins < 0.0 {
            return Err(ArtifactError::Invalid(
                "fixed_overhead_mins must be a non-negative number".to_string(),
            ));
        }
        if !self.min_duration_mins.is_finite() || self.min_duration_mins < 0.0 {
            return Err(ArtifactError::Invalid(
                "min_duration_mins must be a non-negative number".to_string(),
            ));
        }

        Ok(())
    }
}

fn check_table<C: Category + Hash>(table: &HashMap<C, f64>) -> Result<(), ArtifactError> {
    for category in C::ALL {
        match table.get(category) {
            Some(value) if value.is_finite() && *value > 0.0 => {}
            Some(value) => {
                return Err(ArtifactError::Invalid(format!(
                    "{} '{}' has non-positive parameter {}",
                    C::FIELD,
                    category.as_str(),
                    value
                )))
            }
            None => {
                return Err(ArtifactError::Invalid(format!(
                    "{} '{}' is missing from the artifact",
                    C::FIELD,
                    category.as_str()
                )))
            }
        }
    }
    Ok(())
}

/// Model backed by a [`ModelArtifact`].
#[derive(Debug, Clone)]
pub struct ArtifactModel {
    artifact: ModelArtifact,
}

impl ArtifactModel {
    /// Load and validate a model artifact from disk.
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

        let artifact: ModelArtifact =
            serde_json::from_str(&raw).map_err(|source| ArtifactError::Malformed {
                path: path.to_path_buf(),
                source,
            })?;

        let model = Self::from_artifact(artifact)?;
        info!(path = %path.display(), "Loaded delivery model artifact");
        Ok(model)
    }

    /// Wrap an in-memory artifact after validating it.
    pub fn from_artifact(artifact: ModelArtifact) -> Result<Self, ArtifactError> {
        artifact.validate()?;
        Ok(Self { artifact })
    }

    /// The reference point for attributions.
    pub fn reference(&self) -> FeatureVector {
        self.artifact.reference
    }

    pub fn artifact(&self) -> &ModelArtifact {
        &self.artifact
    }

    fn factor<C: Category + Hash>(table: &HashMap<C, f64>, key: C) -> f64 {
        // validate() guarantees every key is present
        table.get(&key).copied().unwrap_or(1.0)
    }
}

impl DeliveryModel for ArtifactModel {
    fn predict(&self, features: &FeatureVector) -> Result<f64, ModelError> {
        let a = &self.artifact;
        let speed = Self::factor(&a.vehicle_speed_kmh, features.vehicle_type());
        let travel = features.distance_km() / speed * 60.0;
        let scaled = travel
            * Self::factor(&a.weather_factor, features.weather())
            * Self::factor(&a.traffic_factor, features.traffic_level())
            * Self::factor(&a.experience_factor, features.driver_experience());

        let minutes = (scaled + a.fixed_overhead_mins).max(a.min_duration_mins);
        if !minutes.is_finite() {
            return Err(ModelError::NonFinite);
        }
        Ok(minutes)
    }
}
