//! Drift detection of observed delivery durations against the training
//! baseline.

use std::sync::Arc;

use serde::Serialize;
use tracing::debug;

use crate::baseline::BaselineStats;
use crate::error::DriftError;

/// |z| above this flags drift.
pub const DRIFT_Z_THRESHOLD: f64 = 2.0;

/// Fewest observations that yield a sample standard deviation.
pub const MIN_OBSERVATIONS: usize = 2;

/// Outcome of a drift check.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DriftReport {
    pub observed_mean: f64,
    pub observed_std: f64,
    pub observed_count: usize,
    pub baseline_mean: f64,
    pub baseline_std: f64,
    /// Two-sample z statistic of the mean shift.
    pub z_score: f64,
    /// Mean shift in baseline standard deviations.
    pub effect_size: f64,
    pub threshold: f64,
    pub is_drifted: bool,
}

/// Compares observed durations with the baseline.
#[derive(Debug, Clone)]
pub struct DriftDetector {
    baseline: Arc<BaselineStats>,
    threshold: f64,
}

impl DriftDetector {
    pub fn new(baseline: Arc<BaselineStats>) -> Self {
        Self {
            baseline,
            threshold: DRIFT_Z_THRESHOLD,
        }
    }

    pub fn baseline(&self) -> &BaselineStats {
        &self.baseline
    }

    /// Run the check. Fails on fewer than [`MIN_OBSERVATIONS`] values or any
    /// non-finite value.
    pub fn detect(&self, observations: &[f64]) -> Result<DriftReport, DriftError> {
        if observations.len() < MIN_OBSERVATIONS {
            return Err(DriftError::InsufficientData {
                required: MIN_OBSERVATIONS,
                actual: observations.len(),
            });
        }
        if let Some(index) = observations.iter().position(|v| !v.is_finite()) {
            return Err(DriftError::NonFinite { index });
        }

        let n = observations.len() as f64;
        let mean = observations.iter().sum::<f64>() / n;
        let variance = observations
            .iter()
            .map(|v| (v - mean).powi(2))
            .sum::<f64>()
            / (n - 1.0);
        let std = variance.sqrt();

        let base = &self.baseline;
        let standard_error =
            (base.std_dev().powi(2) / base.count() as f64 + variance / n).sqrt();
        let z_score = (mean - base.mean()) / standard_error;
        let effect_size = (mean - base.mean()) / base.std_dev();
        let is_drifted = z_score.abs() > self.threshold;

        debug!(
            observed_count = observations.len(),
            observed_mean = mean,
            z_score,
            is_drifted,
            "Drift check"
        );

        Ok(DriftReport {
            observed_mean: mean,
            observed_std: std,
            observed_count: observations.len(),
            baseline_mean: base.mean(),
            baseline_std: base.std_dev(),
            z_score,
            effect_size,
            threshold: self.threshold,
            is_drifted,
        })
    }
}
