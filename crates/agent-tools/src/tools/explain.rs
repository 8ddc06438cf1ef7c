//! Factor attribution for a prior prediction.

use std::sync::Arc;

use async_trait::async_trait;
use brain_core::{ToolId, Trace};
use delivery_model::{Explainer, FeatureVector};
use serde_json::json;

use crate::error::ToolError;
use crate::spec::ToolSpec;
use crate::tool::{Tool, ToolArgs, ToolOutput};
use crate::tools::predict::{feature_params, features_from_args};

/// Contributions smaller than this (in minutes) are left out of the text.
const NEGLIGIBLE_MINS: f64 = 0.05;

/// Explains why the model predicted a certain time.
///
/// Only predictions already made in the current trace can be explained.
/// Without arguments the most recent prediction is used; with arguments the
/// feature vector must match a prior prediction exactly.
pub struct ExplainPrediction {
    explainer: Arc<dyn Explainer>,
    spec: ToolSpec,
}

impl ExplainPrediction {
    pub fn new(explainer: Arc<dyn Explainer>) -> Self {
        Self {
            explainer,
            spec: ToolSpec::new(
                ToolId::Explain,
                "Explains WHY the model predicted a certain delivery time, as signed \
                 per-factor contributions in minutes. Requires a prior prediction; \
                 without arguments the latest prediction is explained.",
                feature_params(false),
            ),
        }
    }
}

const FEATURE_KEYS: [&str; 5] = [
    "vehicle_type",
    "weather",
    "distance_km",
    "traffic_level",
    "driver_experience",
];

fn predicted_features(trace: &Trace) -> impl Iterator<Item = FeatureVector> + '_ {
    trace
        .successes(ToolId::Predict)
        .filter_map(|entry| entry.result.data.get("features"))
        .filter_map(|value| serde_json::from_value::<FeatureVector>(value.clone()).ok())
}

fn resolve_features(args: &ToolArgs) -> Result<FeatureVector, ToolError> {
    if !FEATURE_KEYS.iter().any(|key| args.has(key)) {
        return predicted_features(&args.trace)
            .last()
            .ok_or_else(|| {
                ToolError::MissingContext(
                    "No prior prediction to explain; predict a delivery time first".to_string(),
                )
            });
    }

    let requested = features_from_args(args)?;
    if predicted_features(&args.trace).any(|f| f == requested) {
        Ok(requested)
    } else {
        Err(ToolError::MissingContext(format!(
            "No prior prediction matches ({}); predict it first",
            requested.describe()
        )))
    }
}

#[async_trait]
impl Tool for ExplainPrediction {
    fn id(&self) -> ToolId {
        ToolId::Explain
    }

    fn spec(&self) -> &ToolSpec {
        &self.spec
    }

    async fn execute(&self, args: ToolArgs) -> Result<ToolOutput, ToolError> {
        let features = resolve_features(&args)?;

        let explainer = self.explainer.clone();
        let explanation = tokio::task::spawn_blocking(move || explainer.explain(&features))
            .await
            .map_err(|e| ToolError::ExecutionFailed(format!("explainer task failed: {}", e)))??;

        let mut content = format!(
            "Base delivery time: {:.1} mins, predicted: {:.1} mins\nImpact of factors:",
            explanation.base_value, explanation.prediction
        );
        for contribution in &explanation.contributions {
            if contribution.value.abs() >= NEGLIGIBLE_MINS {
                content.push_str(&format!(
                    "\n- {}: {:+.1} mins",
                    contribution.feature, contribution.value
                ));
            }
        }

        Ok(ToolOutput::new(
            content,
            json!({
                "features": features,
                "base_value": explanation.base_value,
                "prediction": explanation.prediction,
                "contributions": explanation.contributions,
            }),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{artifact_model, explainer};
    use crate::tools::PredictDeliveryTime;
    use crate::ToolRegistry;
    use brain_core::{ToolCall, ToolResult};
    use std::collections::HashMap;

    fn registry() -> ToolRegistry {
        let mut registry = ToolRegistry::new();
        registry.register(PredictDeliveryTime::new(artifact_model()));
        registry.register(ExplainPrediction::new(explainer()));
        registry
    }

    async fn trace_with_prediction(registry: &ToolRegistry, args: &str) -> Arc<Trace> {
        let params: HashMap<String, serde_json::Value> = serde_json::from_str(args).unwrap();
        let output = registry
            .execute(ToolId::Predict, params.clone(), Arc::new(Trace::new()))
            .await
            .unwrap();
        let mut trace = Trace::new();
        trace.record(
            ToolCall {
                tool: ToolId::Predict,
                arguments: params,
                plan_step: None,
            },
            ToolResult::success(ToolId::Predict, output.content, output.data),
        );
        Arc::new(trace)
    }

    #[tokio::test]
    async fn test_explain_without_prediction_is_missing_context() {
        let result = registry()
            .execute(ToolId::Explain, HashMap::new(), Arc::new(Trace::new()))
            .await;
        assert!(matches!(result, Err(ToolError::MissingContext(_))));
    }

    #[tokio::test]
    async fn test_explain_latest_prediction() {
        let registry = registry();
        let trace = trace_with_prediction(
            &registry,
            r#"{"vehicle_type": "Bike", "weather": "Rainy", "distance_km": 3.98,
                "traffic_level": "High", "driver_experience": "Junior"}"#,
        )
        .await;

        let output = registry
            .execute(ToolId::Explain, HashMap::new(), trace)
            .await
            .unwrap();

        let contributions = output.data["contributions"].as_array().unwrap();
        assert_eq!(contributions.len(), 5);
        let total: f64 = contributions.iter().map(|c| c["value"].as_f64().unwrap()).sum();
        let base = output.data["base_value"].as_f64().unwrap();
        let prediction = output.data["prediction"].as_f64().unwrap();
        assert!((base + total - prediction).abs() < 1e-9);
        assert!(output.content.contains("Impact of factors:"));
    }

    #[tokio::test]
    async fn test_explicit_features_must_match_a_prediction() {
        let registry = registry();
        let trace = trace_with_prediction(
            &registry,
            r#"{"vehicle_type": "Van", "weather": "Snow", "distance_km": 12}"#,
        )
        .await;

        let same: HashMap<String, serde_json::Value> =
            serde_json::from_str(r#"{"vehicle_type": "van", "weather": "snowy", "distance_km": "12"}"#)
                .unwrap();
        assert!(registry
            .execute(ToolId::Explain, same, trace.clone())
            .await
            .is_ok());

        let other: HashMap<String, serde_json::Value> =
            serde_json::from_str(r#"{"vehicle_type": "Bike", "weather": "Snow", "distance_km": 12}"#)
                .unwrap();
        assert!(matches!(
            registry.execute(ToolId::Explain, other, trace).await,
            Err(ToolError::MissingContext(_))
        ));
    }
}
