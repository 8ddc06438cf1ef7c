//! Delivery-time model artifacts for the Berlin logistics agent.
//!
//! The regression model and its attribution are consumed as black boxes:
//! this crate only loads them from persisted artifacts and puts a typed,
//! validated boundary in front of them.
//!
//! - [`FeatureVector`] - The only input the model accepts. Every field is
//!   drawn from a closed category set (or a bounded distance), so an invalid
//!   value can never reach the model.
//! - [`DeliveryModel`] / [`ArtifactModel`] - `predict(features) -> minutes`.
//! - [`Explainer`] / [`ShapleyExplainer`] - per-feature signed contributions.
//! - [`BaselineStats`] / [`DriftDetector`] - the training distribution and the
//!   drift check against it.
//!
//! Artifacts are loaded once at startup. A missing, unreadable or degenerate
//! artifact is an [`ArtifactError`], which callers treat as fatal.

mod attribution;
mod baseline;
mod drift;
mod error;
mod features;
mod model;

pub use attribution::{Contribution, Explainer, Explanation, ShapleyExplainer};
pub use baseline::BaselineStats;
pub use drift::{DriftDetector, DriftReport, DRIFT_Z_THRESHOLD, MIN_OBSERVATIONS};
pub use error::{ArtifactError, DriftError, FeatureError, ModelError};
pub use features::{
    canonical_name, Category, DriverExperience, FeatureName, FeatureVector, TrafficLevel,
    VehicleType, Weather, MAX_DISTANCE_KM,
};
pub use model::{ArtifactModel, DeliveryModel, ModelArtifact};
