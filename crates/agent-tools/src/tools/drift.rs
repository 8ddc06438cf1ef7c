//! Data drift check of observed delivery durations.

use std::sync::Arc;

use async_trait::async_trait;
use brain_core::ToolId;
use delivery_model::DriftDetector;
use serde_json::json;

use crate::error::ToolError;
use crate::spec::{ParamSpec, ParamType, ToolSpec};
use crate::tool::{Tool, ToolArgs, ToolOutput};

/// Checks whether recent delivery durations drifted from the training
/// baseline.
///
/// # Parameters
///
/// - `observations` (required): Delivery durations in minutes.
pub struct DataDrift {
    detector: Arc<DriftDetector>,
    spec: ToolSpec,
}

impl DataDrift {
    pub fn new(detector: Arc<DriftDetector>) -> Self {
        Self {
            detector,
            spec: ToolSpec::new(
                ToolId::Drift,
                "Checks if recent delivery durations have drifted significantly from \
                 the training baseline.",
                vec![ParamSpec::required(
                    "observations",
                    "List of delivery durations (in minutes)",
                    ParamType::NumberList { min: Some(0.0) },
                )],
            ),
        }
    }
}

#[async_trait]
impl Tool for DataDrift {
    fn id(&self) -> ToolId {
        ToolId::Drift
    }

    fn spec(&self) -> &ToolSpec {
        &self.spec
    }

    async fn execute(&self, args: ToolArgs) -> Result<ToolOutput, ToolError> {
        let observations = args.get_numbers("observations")?;
        let report = self.detector.detect(&observations)?;

        let verdict = if report.is_drifted {
            "Drift detected. Model may be invalid. Retrain recommended."
        } else {
            "Data is stable. Model is healthy."
        };
        let content = format!(
            "Baseline mean: {:.1} | Observed mean: {:.1} (n={})\nZ-score: {:.2} (threshold {:.1})\n{}",
            report.baseline_mean,
            report.observed_mean,
            report.observed_count,
            report.z_score,
            report.threshold,
            verdict
        );

        Ok(ToolOutput::new(content, json!(report)))
    }
}
