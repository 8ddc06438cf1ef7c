//! Tool registry and implementations for the Berlin logistics agent.
//!
//! This crate provides a `ToolRegistry` holding one implementation per
//! [`ToolId`], the argument validator that sits in front of every tool, and
//! the [`RegistryToolExecutor`] that exposes the registry to the reasoning
//! loop as a `ToolExecutor` with timeouts and retries.
//!
//! # Built-in Tools
//!
//! ## Deterministic
//! - [`DeliveryDistance`] - Haversine distance between two GPS points.
//! - [`ZoneLookup`] - Nearest Berlin district for a GPS point.
//! - [`WeatherRisk`] - Simulated Berlin weather for a date.
//! - [`AnonymizePii`] - PII redaction (see [`pii`]).
//!
//! ## Model-backed
//! - [`PredictDeliveryTime`] - Delivery duration from the trained model.
//! - [`ExplainPrediction`] - Per-factor attribution of a prior prediction.
//! - [`DataDrift`] - Drift check against the training baseline.
//!
//! # Example
//!
//! ```rust,ignore
//! use agent_tools::default_registry;
//! use brain_core::ToolId;
//!
//! #[tokio::main]
//! async fn main() {
//!     let registry = default_registry(model, explainer, detector);
//!
//!     let result = registry
//!         .execute_json(ToolId::Distance, r#"{"lat1": 52.52, "lon1": 13.405, "lat2": 52.4981, "lon2": 13.3918}"#)
//!         .await
//!         .unwrap();
//!     println!("{}", result.content); // "Distance: 2.59 km"
//! }
//! ```

mod error;
mod executor;
pub mod geo;
pub mod pii;
mod registry;
mod spec;
mod tool;
pub mod tools;

use std::sync::Arc;

use brain_core::ToolId;
use delivery_model::{DeliveryModel, DriftDetector, Explainer};

pub use error::ToolError;
pub use executor::{RegistryToolExecutor, ToolPolicy, DEFAULT_TOOL_RETRIES, DEFAULT_TOOL_TIMEOUT};
pub use registry::ToolRegistry;
pub use spec::{validate, ParamSpec, ParamType, ToolSpec};
pub use tool::{Tool, ToolArgs, ToolOutput};
pub use tools::{
    AnonymizePii, DataDrift, DeliveryDistance, ExplainPrediction, PredictDeliveryTime,
    WeatherRisk, ZoneLookup,
};

// Re-export async_trait for convenience
pub use async_trait::async_trait;

/// Create a registry with all seven tools registered, in [`ToolId::ALL`]
/// order.
pub fn default_registry(
    model: Arc<dyn DeliveryModel>,
    explainer: Arc<dyn Explainer>,
    drift_detector: Arc<DriftDetector>,
) -> ToolRegistry {
    let mut registry = ToolRegistry::new();

    for id in ToolId::ALL {
        match id {
            ToolId::Distance => registry.register(DeliveryDistance::new()),
            ToolId::Zone => registry.register(ZoneLookup::new()),
            ToolId::Weather => registry.register(WeatherRisk::new()),
            ToolId::Predict => registry.register(PredictDeliveryTime::new(model.clone())),
            ToolId::Explain => registry.register(ExplainPrediction::new(explainer.clone())),
            ToolId::Drift => registry.register(DataDrift::new(drift_detector.clone())),
            ToolId::Mask => registry.register(AnonymizePii::new()),
        }
    }

    registry
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::path::PathBuf;
    use std::sync::Arc;

    use delivery_model::{
        ArtifactModel, BaselineStats, DeliveryModel, DriftDetector, Explainer, ShapleyExplainer,
    };

    fn models_dir() -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../models")
    }

    pub fn artifact_model() -> Arc<dyn DeliveryModel> {
        Arc::new(ArtifactModel::load(models_dir().join("delivery_model.json")).unwrap())
    }

    pub fn explainer() -> Arc<dyn Explainer> {
        let model = ArtifactModel::load(models_dir().join("delivery_model.json")).unwrap();
        let reference = model.reference();
        Arc::new(ShapleyExplainer::new(Arc::new(model), reference))
    }

    pub fn detector() -> Arc<DriftDetector> {
        let baseline = BaselineStats::load(models_dir().join("training_stats.json")).unwrap();
        Arc::new(DriftDetector::new(Arc::new(baseline)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_registry_has_every_tool() {
        let registry = default_registry(
            test_support::artifact_model(),
            test_support::explainer(),
            test_support::detector(),
        );
        assert_eq!(registry.list_tools(), ToolId::ALL.to_vec());

        let definitions = registry.definitions();
        assert_eq!(definitions.len(), 7);
        for (definition, id) in definitions.iter().zip(ToolId::ALL) {
            assert_eq!(definition["name"], id.name());
            assert_eq!(definition["parameters"]["type"], "object");
        }
    }
}
