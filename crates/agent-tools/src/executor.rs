//! ToolExecutor implementation backed by ToolRegistry.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use brain_core::{FailureKind, ToolCall, ToolExecutor, ToolFailure, ToolId, ToolResult, Trace};
use serde_json::Value;
use tokio::time::{sleep, timeout};
use tracing::{debug, warn};

use crate::error::ToolError;
use crate::pii::redact;
use crate::{ToolOutput, ToolRegistry};

/// Default per-call timeout.
pub const DEFAULT_TOOL_TIMEOUT: Duration = Duration::from_secs(2);

/// Default number of retries after a failed execution.
pub const DEFAULT_TOOL_RETRIES: u32 = 2;

#[derive(Debug, Clone)]
pub struct ToolPolicy {
    /// Upper bound on a single attempt.
    pub timeout: Duration,
    /// Retries after an execution failure or timeout. Validation failures
    /// are never retried.
    pub max_retries: u32,
    /// Pause between attempts.
    pub retry_backoff: Duration,
}

impl Default for ToolPolicy {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TOOL_TIMEOUT,
            max_retries: DEFAULT_TOOL_RETRIES,
            retry_backoff: Duration::from_millis(25),
        }
    }
}

impl ToolPolicy {
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn with_backoff(mut self, backoff: Duration) -> Self {
        self.retry_backoff = backoff;
        self
    }
}

pub struct RegistryToolExecutor {
    registry: Arc<ToolRegistry>,
    policy: ToolPolicy,
}

impl RegistryToolExecutor {
    pub fn new(registry: ToolRegistry) -> Self {
        Self::with_policy(registry, ToolPolicy::default())
    }

    pub fn with_policy(registry: ToolRegistry, policy: ToolPolicy) -> Self {
        Self::from_shared(Arc::new(registry), policy)
    }

    pub fn from_shared(registry: Arc<ToolRegistry>, policy: ToolPolicy) -> Self {
        Self { registry, policy }
    }

    pub fn policy(&self) -> &ToolPolicy {
        &self.policy
    }

    async fn attempt(
        &self,
        call: &ToolCall,
        params: &HashMap<String, Value>,
        trace: &Arc<Trace>,
    ) -> Result<ToolOutput, ToolError> {
        let execute_future = self
            .registry
            .invoke(call.tool, params.clone(), trace.clone());

        timeout(self.policy.timeout, execute_future)
            .await
            .unwrap_or(Err(ToolError::Timeout(self.policy.timeout)))
    }
}

#[async_trait::async_trait]
impl ToolExecutor for RegistryToolExecutor {
    async fn execute(&self, call: ToolCall, trace: Arc<Trace>) -> ToolResult {
        if !self.registry.has_tool(call.tool) {
            return ToolResult::error(
                call.tool,
                ToolFailure::new(
                    FailureKind::UnknownTool,
                    format!("Tool not registered: {}", call.tool),
                ),
            );
        }

        let params = match self.registry.validate(call.tool, &call.arguments) {
            Ok(params) => params,
            Err(error) => {
                debug!(
                    tool = %call.tool,
                    error = %redact(&error.to_string()),
                    "Tool call rejected by validator"
                );
                return ToolResult::error(call.tool, error.to_failure());
            }
        };

        let max_attempts = self.policy.max_retries + 1;
        let mut attempt = 1;
        loop {
            match self.attempt(&call, &params, &trace).await {
                Ok(output) => {
                    return ToolResult::success(call.tool, output.content, output.data)
                        .with_attempts(attempt);
                }
                Err(error) if error.is_retryable() && attempt < max_attempts => {
                    warn!(
                        tool = %call.tool,
                        attempt,
                        max_attempts,
                        error = %redact(&error.to_string()),
                        "Tool execution failed, retrying"
                    );
                    sleep(self.policy.retry_backoff).await;
                    attempt += 1;
                }
                Err(error) => {
                    if error.is_retryable() {
                        warn!(
                            tool = %call.tool,
                            attempts = attempt,
                            error = %redact(&error.to_string()),
                            "Tool execution failed"
                        );
                    }
                    return ToolResult::error(call.tool, error.to_failure()).with_attempts(attempt);
                }
            }
        }
    }

    fn supported_tools(&self) -> Vec<ToolId> {
        self.registry.list_tools()
    }
}
