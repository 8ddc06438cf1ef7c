//! Per-feature attribution of a prediction.
//!
//! Contributions are exact Shapley values over the five features, measured
//! against the artifact's reference point. They sum to
//! `prediction - base_value`.

use std::sync::Arc;

use serde::Serialize;

use crate::error::ModelError;
use crate::features::{FeatureName, FeatureVector};
use crate::model::DeliveryModel;

/// Signed contribution of one feature to a prediction, in minutes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Contribution {
    pub feature: FeatureName,
    pub value: f64,
}

/// Attribution of a single prediction.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Explanation {
    /// Model output at the reference point.
    pub base_value: f64,
    /// Model output for the explained features.
    pub prediction: f64,
    /// Contributions ordered by absolute magnitude, largest first.
    pub contributions: Vec<Contribution>,
}

impl Explanation {
    /// Features that pushed the prediction up, largest first.
    pub fn increasing(&self) -> impl Iterator<Item = &Contribution> {
        self.contributions.iter().filter(|c| c.value > 0.0)
    }

    /// Features that pulled the prediction down, largest first.
    pub fn decreasing(&self) -> impl Iterator<Item = &Contribution> {
        self.contributions.iter().filter(|c| c.value < 0.0)
    }
}

/// Produces per-feature attributions.
pub trait Explainer: Send + Sync {
    fn explain(&self, features: &FeatureVector) -> Result<Explanation, ModelError>;
}

/// Exact Shapley attribution against a fixed reference point.
pub struct ShapleyExplainer {
    model: Arc<dyn DeliveryModel>,
    reference: FeatureVector,
}

impl ShapleyExplainer {
    pub fn new(model: Arc<dyn DeliveryModel>, reference: FeatureVector) -> Self {
        Self { model, reference }
    }
}

fn factorial(n: usize) -> f64 {
    (1..=n).map(|i| i as f64).product()
}

impl Explainer for ShapleyExplainer {
    fn explain(&self, features: &FeatureVector) -> Result<Explanation, ModelError> {
        let n = FeatureName::ALL.len();
        let coalitions = 1usize << n;

        let mut values = Vec::with_capacity(coalitions);
        for mask in 0..coalitions {
            values.push(self.model.predict(&features.blend(&self.reference, mask))?);
        }

        let n_fact = factorial(n);
        let mut contributions: Vec<Contribution> = FeatureName::ALL
            .iter()
            .enumerate()
            .map(|(i, feature)| {
                let bit = 1usize << i;
                let value = (0..coalitions)
                    .filter(|mask| mask & bit == 0)
                    .map(|mask| {
                        let size = mask.count_ones() as usize;
                        let weight = factorial(size) * factorial(n - size - 1) / n_fact;
                        weight * (values[mask | bit] - values[mask])
                    })
                    .sum();
                Contribution {
                    feature: *feature,
                    value,
                }
            })
            .collect();

        // stable sort keeps column order on ties
        contributions.sort_by(|a, b| b.value.abs().total_cmp(&a.value.abs()));

        Ok(Explanation {
            base_value: values[0],
            prediction: values[coalitions - 1],
            contributions,
        })
    }
}
