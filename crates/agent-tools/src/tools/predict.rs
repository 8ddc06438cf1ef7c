//! Delivery-time prediction tool.

use std::sync::Arc;

use async_trait::async_trait;
use brain_core::ToolId;
use delivery_model::{
    DeliveryModel, DriverExperience, FeatureVector, TrafficLevel, VehicleType, Weather,
    MAX_DISTANCE_KM,
};
use serde_json::json;
use tracing::debug;

use crate::error::ToolError;
use crate::spec::{ParamSpec, ParamType, ToolSpec};
use crate::tool::{Tool, ToolArgs, ToolOutput};

pub const DEFAULT_TRAFFIC: &str = "Medium";
pub const DEFAULT_EXPERIENCE: &str = "Senior";

/// Predicts delivery duration (in minutes) with the trained model.
///
/// Every categorical argument is checked against its closed set before the
/// model runs; an unknown value is rejected, never mapped to a fallback.
/// The structured result records the exact feature vector used, which the
/// explanation tool relies on.
pub struct PredictDeliveryTime {
    model: Arc<dyn DeliveryModel>,
    spec: ToolSpec,
}

impl PredictDeliveryTime {
    pub fn new(model: Arc<dyn DeliveryModel>) -> Self {
        Self {
            model,
            spec: ToolSpec::new(ToolId::Predict, DESCRIPTION, feature_params(true)),
        }
    }
}

const DESCRIPTION: &str = "Predicts delivery duration (in minutes) using the trained model. \
     Accepts common aliases (e.g. 'Rain' -> 'Rainy').";

/// The five model features as tool parameters.
///
/// With `with_defaults`, traffic and driver experience are optional and take
/// their declared defaults; otherwise every feature is optional without a
/// default.
pub(crate) fn feature_params(with_defaults: bool) -> Vec<ParamSpec> {
    let distance = ParamType::Number {
        min: Some(0.0),
        max: Some(MAX_DISTANCE_KM),
        exclusive_min: true,
    };
    let vehicle = ParamType::category::<VehicleType>();
    let weather = ParamType::category::<Weather>();
    let traffic = ParamType::category::<TrafficLevel>();
    let experience = ParamType::category::<DriverExperience>();

    if with_defaults {
        vec![
            ParamSpec::required("vehicle_type", "The type of vehicle used for delivery", vehicle),
            ParamSpec::required("weather", "Weather conditions in Berlin", weather),
            ParamSpec::required("distance_km", "Distance of the trip in km", distance),
            ParamSpec::optional("traffic_level", "Traffic density (default: Medium)", traffic)
                .with_default(DEFAULT_TRAFFIC),
            ParamSpec::optional("driver_experience", "Driver skill (default: Senior)", experience)
                .with_default(DEFAULT_EXPERIENCE),
        ]
    } else {
        vec![
            ParamSpec::optional("vehicle_type", "The type of vehicle used for delivery", vehicle),
            ParamSpec::optional("weather", "Weather conditions in Berlin", weather),
            ParamSpec::optional("distance_km", "Distance of the trip in km", distance),
            ParamSpec::optional("traffic_level", "Traffic density (default: Medium)", traffic),
            ParamSpec::optional("driver_experience", "Driver skill (default: Senior)", experience),
        ]
    }
}

/// Build a feature vector from validated arguments.
pub(crate) fn features_from_args(args: &ToolArgs) -> Result<FeatureVector, ToolError> {
    let traffic = if args.has("traffic_level") {
        args.get_category::<TrafficLevel>("traffic_level")?
    } else {
        TrafficLevel::Medium
    };
    let experience = if args.has("driver_experience") {
        args.get_category::<DriverExperience>("driver_experience")?
    } else {
        DriverExperience::Senior
    };

    Ok(FeatureVector::new(
        args.get_category::<VehicleType>("vehicle_type")?,
        args.get_category::<Weather>("weather")?,
        traffic,
        experience,
        args.get_f64("distance_km")?,
    )?)
}

#[async_trait]
impl Tool for PredictDeliveryTime {
    fn id(&self) -> ToolId {
        ToolId::Predict
    }

    fn spec(&self) -> &ToolSpec {
        &self.spec
    }

    async fn execute(&self, args: ToolArgs) -> Result<ToolOutput, ToolError> {
        let features = features_from_args(&args)?;

        let model = self.model.clone();
        let minutes = tokio::task::spawn_blocking(move || model.predict(&features))
            .await
            .map_err(|e| ToolError::ExecutionFailed(format!("model task failed: {}", e)))??;

        debug!(duration_mins = minutes, "Model prediction");

        Ok(ToolOutput::new(
            format!(
                "Predicted delivery time: {:.1} minutes ({})",
                minutes,
                features.describe()
            ),
            json!({
                "duration_mins": minutes,
                "features": features,
            }),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::artifact_model;
    use crate::ToolRegistry;
    use delivery_model::ModelError;

    fn registry() -> ToolRegistry {
        let mut registry = ToolRegistry::new();
        registry.register(PredictDeliveryTime::new(artifact_model()));
        registry
    }

    #[tokio::test]
    async fn test_prediction_with_aliases_and_defaults() {
        let output = registry()
            .execute_json(
                ToolId::Predict,
                r#"{"vehicle_type": "bicycle", "weather": "rain", "distance_km": 3.98,
                    "traffic_level": "heavy", "driver_experience": "beginner"}"#,
            )
            .await
            .unwrap();

        let minutes = output.data["duration_mins"].as_f64().unwrap();
        assert!((minutes - 35.5216).abs() < 1e-6);
        assert_eq!(output.data["features"]["vehicle_type"], json!("Bike"));
        assert!(output.content.starts_with("Predicted delivery time: 35.5 minutes"));

        let defaulted = registry()
            .execute_json(
                ToolId::Predict,
                r#"{"vehicle_type": "Scooter", "weather": "Cloudy", "distance_km": 7.5}"#,
            )
            .await
            .unwrap();
        assert_eq!(defaulted.data["features"]["traffic_level"], json!("Medium"));
        assert_eq!(defaulted.data["features"]["driver_experience"], json!("Senior"));
        assert!((defaulted.data["duration_mins"].as_f64().unwrap() - 25.6).abs() < 1e-6);
    }

    #[tokio::test]
    async fn test_out_of_domain_never_yields_a_number() {
        for args in [
            r#"{"vehicle_type": "Truck", "weather": "Sunny", "distance_km": 3}"#,
            r#"{"vehicle_type": "Van", "weather": "foggy", "distance_km": 3}"#,
            r#"{"vehicle_type": "Van", "weather": "Sunny", "distance_km": -3}"#,
            r#"{"vehicle_type": "Van", "weather": "Sunny", "distance_km": 3, "traffic_level": "gridlock"}"#,
            r#"{"vehicle_type": "Van", "weather": "Sunny", "distance_km": 3, "driver_experience": "robot"}"#,
        ] {
            let result = registry().execute_json(ToolId::Predict, args).await;
            assert!(matches!(result, Err(ToolError::Validation { .. })), "{}", args);
        }
    }

    struct NanModel;

    impl DeliveryModel for NanModel {
        fn predict(&self, _features: &FeatureVector) -> Result<f64, ModelError> {
            Err(ModelError::NonFinite)
        }
    }

    #[tokio::test]
    async fn test_model_failure_is_execution_error() {
        let mut registry = ToolRegistry::new();
        registry.register(PredictDeliveryTime::new(Arc::new(NanModel)));
        let result = registry
            .execute_json(
                ToolId::Predict,
                r#"{"vehicle_type": "Van", "weather": "Sunny", "distance_km": 3}"#,
            )
            .await;
        assert!(matches!(result, Err(ToolError::ExecutionFailed(_))));
    }
}
