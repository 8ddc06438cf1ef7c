//! Configuration for the agent.

use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::error::OrchestratorError;

pub const DEFAULT_MODEL_PATH: &str = "models/delivery_model.json";
pub const DEFAULT_BASELINE_PATH: &str = "models/training_stats.json";
pub const DEFAULT_MAX_ITERATIONS: usize = 8;
pub const MAX_ITERATIONS_LIMIT: usize = 32;
pub const DEFAULT_TOOL_TIMEOUT_MS: u64 = 2000;
pub const DEFAULT_TOOL_RETRIES: u32 = 2;
pub const MAX_TOOL_RETRIES: u32 = 10;
pub const DEFAULT_FAILURE_ABORT_THRESHOLD: usize = 3;

/// Configuration for the agent.
#[derive(Debug, Clone, PartialEq)]
pub struct AgentConfig {
    /// Path of the trained model artifact.
    pub model_path: PathBuf,
    /// Path of the training baseline used for drift checks.
    pub baseline_path: PathBuf,
    /// Maximum number of tool calls per query.
    pub max_iterations: usize,
    /// Upper bound on a single tool attempt.
    pub tool_timeout: Duration,
    /// Retries after an execution failure.
    pub tool_retries: u32,
    /// Stop early once this many calls were made and every one failed.
    pub failure_abort_threshold: usize,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            model_path: PathBuf::from(DEFAULT_MODEL_PATH),
            baseline_path: PathBuf::from(DEFAULT_BASELINE_PATH),
            max_iterations: DEFAULT_MAX_ITERATIONS,
            tool_timeout: Duration::from_millis(DEFAULT_TOOL_TIMEOUT_MS),
            tool_retries: DEFAULT_TOOL_RETRIES,
            failure_abort_threshold: DEFAULT_FAILURE_ABORT_THRESHOLD,
        }
    }
}

impl AgentConfig {
    /// Create config from environment variables.
    ///
    /// Environment variables:
    /// - `AGENT_MODEL_PATH`: Model artifact (default: models/delivery_model.json)
    /// - `AGENT_BASELINE_PATH`: Baseline artifact (default: models/training_stats.json)
    /// - `AGENT_MAX_ITERATIONS`: Tool calls per query, 1 to 32 (default: 8)
    /// - `AGENT_TOOL_TIMEOUT_MS`: Per-attempt timeout (default: 2000)
    /// - `AGENT_TOOL_RETRIES`: Retries after an execution failure (default: 2)
    /// - `AGENT_FAILURE_ABORT_THRESHOLD`: All-failed stop rule (default: 3)
    pub fn from_env() -> Result<Self, OrchestratorError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Build config from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, OrchestratorError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let config = Self {
            model_path: lookup("AGENT_MODEL_PATH")
                .filter(|v| !v.trim().is_empty())
                .map(PathBuf::from)
                .unwrap_or(defaults.model_path),
            baseline_path: lookup("AGENT_BASELINE_PATH")
                .filter(|v| !v.trim().is_empty())
                .map(PathBuf::from)
                .unwrap_or(defaults.baseline_path),
            max_iterations: parse_var(&lookup, "AGENT_MAX_ITERATIONS")?
                .unwrap_or(defaults.max_iterations),
            tool_timeout: parse_var(&lookup, "AGENT_TOOL_TIMEOUT_MS")?
                .map(Duration::from_millis)
                .unwrap_or(defaults.tool_timeout),
            tool_retries: parse_var(&lookup, "AGENT_TOOL_RETRIES")?
                .unwrap_or(defaults.tool_retries),
            failure_abort_threshold: parse_var(&lookup, "AGENT_FAILURE_ABORT_THRESHOLD")?
                .unwrap_or(defaults.failure_abort_threshold),
        };

        config.validate()?;
        Ok(config)
    }

    pub fn with_model_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.model_path = path.into();
        self
    }

    pub fn with_baseline_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.baseline_path = path.into();
        self
    }

    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    pub fn with_tool_timeout(mut self, timeout: Duration) -> Self {
        self.tool_timeout = timeout;
        self
    }

    pub fn with_tool_retries(mut self, retries: u32) -> Self {
        self.tool_retries = retries;
        self
    }

    pub fn with_failure_abort_threshold(mut self, threshold: usize) -> Self {
        self.failure_abort_threshold = threshold;
        self
    }

    /// Check the numeric settings against their allowed ranges.
    pub fn validate(&self) -> Result<(), OrchestratorError> {
        if !(1..=MAX_ITERATIONS_LIMIT).contains(&self.max_iterations) {
            return Err(OrchestratorError::config(format!(
                "AGENT_MAX_ITERATIONS must be between 1 and {}, got {}",
                MAX_ITERATIONS_LIMIT, self.max_iterations
            )));
        }
        if self.tool_timeout.is_zero() {
            return Err(OrchestratorError::config(
                "AGENT_TOOL_TIMEOUT_MS must be greater than 0",
            ));
        }
        if self.tool_retries > MAX_TOOL_RETRIES {
            return Err(OrchestratorError::config(format!(
                "AGENT_TOOL_RETRIES must be at most {}, got {}",
                MAX_TOOL_RETRIES, self.tool_retries
            )));
        }
        if self.failure_abort_threshold == 0 {
            return Err(OrchestratorError::config(
                "AGENT_FAILURE_ABORT_THRESHOLD must be at least 1",
            ));
        }
        Ok(())
    }
}

/// Parse an optional variable; a present but malformed value is an error.
fn parse_var<F, T>(lookup: &F, name: &str) -> Result<Option<T>, OrchestratorError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(name) {
        None => Ok(None),
        Some(raw) if raw.trim().is_empty() => Ok(None),
        Some(raw) => raw.trim().parse().map(Some).map_err(|_| {
            OrchestratorError::config(format!("{} has an invalid value: {:?}", name, raw))
        }),
    }
}
