//! Process-wide application context.

use std::sync::Arc;

use agent_tools::{default_registry, RegistryToolExecutor, ToolPolicy, ToolRegistry};
use delivery_model::{
    ArtifactModel, BaselineStats, DeliveryModel, DriftDetector, Explainer, ShapleyExplainer,
};
use tracing::info;

use crate::config::AgentConfig;
use crate::error::OrchestratorError;

/// Everything shared across queries, built once at startup.
///
/// The context is immutable after construction and handed around as an
/// `Arc`: the model, explainer, baseline and registry are read-only, so any
/// number of runs can use them concurrently.
pub struct AppContext {
    config: AgentConfig,
    model: Arc<dyn DeliveryModel>,
    explainer: Arc<dyn Explainer>,
    drift_detector: Arc<DriftDetector>,
    registry: Arc<ToolRegistry>,
}

impl AppContext {
    /// Load the artifacts named by the config and build the tool registry.
    ///
    /// A missing, unreadable or invalid artifact is fatal.
    pub fn load(config: &AgentConfig) -> Result<Arc<Self>, OrchestratorError> {
        config.validate()?;

        let model = ArtifactModel::load(&config.model_path)?;
        let baseline = BaselineStats::load(&config.baseline_path)?;

        info!(
            model = %config.model_path.display(),
            baseline = %config.baseline_path.display(),
            "Artifacts loaded"
        );

        let reference = model.reference();
        let model: Arc<dyn DeliveryModel> = Arc::new(model);
        let explainer: Arc<dyn Explainer> =
            Arc::new(ShapleyExplainer::new(model.clone(), reference));

        Ok(Arc::new(Self::from_parts(
            config.clone(),
            model,
            explainer,
            Arc::new(baseline),
        )))
    }

    /// Assemble a context from already-loaded parts.
    pub fn from_parts(
        config: AgentConfig,
        model: Arc<dyn DeliveryModel>,
        explainer: Arc<dyn Explainer>,
        baseline: Arc<BaselineStats>,
    ) -> Self {
        let drift_detector = Arc::new(DriftDetector::new(baseline));
        let registry = Arc::new(default_registry(
            model.clone(),
            explainer.clone(),
            drift_detector.clone(),
        ));

        Self {
            config,
            model,
            explainer,
            drift_detector,
            registry,
        }
    }

    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    pub fn model(&self) -> &Arc<dyn DeliveryModel> {
        &self.model
    }

    pub fn explainer(&self) -> &Arc<dyn Explainer> {
        &self.explainer
    }

    pub fn drift_detector(&self) -> &Arc<DriftDetector> {
        &self.drift_detector
    }

    pub fn registry(&self) -> &Arc<ToolRegistry> {
        &self.registry
    }

    /// The tool policy derived from the config.
    pub fn tool_policy(&self) -> ToolPolicy {
        ToolPolicy::default()
            .with_timeout(self.config.tool_timeout)
            .with_retries(self.config.tool_retries)
    }

    /// An executor over the shared registry.
    pub fn executor(&self) -> RegistryToolExecutor {
        RegistryToolExecutor::from_shared(self.registry.clone(), self.tool_policy())
    }
}
