//! Tool vocabulary shared by brains, tools and the orchestrator.
//!
//! The set of tools is closed: every callable capability is a variant of
//! [`ToolId`]. A brain emits a [`ToolCall`], an executor turns it into a
//! [`ToolResult`], and the pair is recorded in the per-query trace.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::trace::Trace;

/// Identifier of a registered tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolId {
    /// Haversine distance between two GPS points.
    Distance,
    /// Berlin district lookup for a GPS point.
    Zone,
    /// Simulated Berlin weather for a date.
    Weather,
    /// Delivery duration prediction.
    Predict,
    /// Factor attribution for a prior prediction.
    Explain,
    /// Drift check of observed durations against the training baseline.
    Drift,
    /// PII detection and redaction.
    Mask,
}

impl ToolId {
    /// Every tool, in registration order.
    pub const ALL: [ToolId; 7] = [
        ToolId::Distance,
        ToolId::Zone,
        ToolId::Weather,
        ToolId::Predict,
        ToolId::Explain,
        ToolId::Drift,
        ToolId::Mask,
    ];

    /// The exposed tool name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Distance => "calculate_delivery_distance",
            Self::Zone => "identify_zone",
            Self::Weather => "get_weather_risk",
            Self::Predict => "predict_delivery_time",
            Self::Explain => "explain_delivery_prediction",
            Self::Drift => "check_data_drift",
            Self::Mask => "anonymize_pii",
        }
    }
}

impl fmt::Display for ToolId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Error returned when a tool name is not part of the registry vocabulary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownTool(pub String);

impl fmt::Display for UnknownTool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown tool: {}", self.0)
    }
}

impl std::error::Error for UnknownTool {}

impl FromStr for ToolId {
    type Err = UnknownTool;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim();
        ToolId::ALL
            .into_iter()
            .find(|id| id.name() == name)
            .ok_or_else(|| UnknownTool(name.to_string()))
    }
}

/// A request to execute a tool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    /// Tool to execute.
    pub tool: ToolId,
    /// Raw arguments, validated by the registry before the tool sees them.
    pub arguments: HashMap<String, Value>,
    /// Index of the brain's plan step this call serves, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plan_step: Option<usize>,
}

impl ToolCall {
    /// Create a call with no arguments.
    pub fn new(tool: ToolId) -> Self {
        Self {
            tool,
            arguments: HashMap::new(),
            plan_step: None,
        }
    }

    /// Add an argument (builder style).
    pub fn with_arg(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.arguments.insert(key.into(), value.into());
        self
    }

    /// Tag the call with the plan step it serves.
    pub fn for_step(mut self, step: usize) -> Self {
        self.plan_step = Some(step);
        self
    }

    /// Parse arguments from a JSON object string.
    pub fn from_json(tool: ToolId, arguments_json: &str) -> Result<Self, serde_json::Error> {
        let arguments: HashMap<String, Value> = serde_json::from_str(arguments_json)?;
        Ok(Self {
            tool,
            arguments,
            plan_step: None,
        })
    }

    /// Get a numeric argument by name.
    pub fn get_f64(&self, key: &str) -> Option<f64> {
        self.arguments.get(key).and_then(|v| v.as_f64())
    }

    /// Get a string argument by name.
    pub fn get_string(&self, key: &str) -> Option<&str> {
        self.arguments.get(key).and_then(|v| v.as_str())
    }
}

/// Category of a failed tool call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// An argument was missing or outside its declared type or domain.
    Validation,
    /// The tool or the model behind it failed or timed out.
    Execution,
    /// The call depends on trace data that does not exist.
    MissingContext,
    /// Too few observations to compute a result.
    InsufficientData,
    /// No tool is registered under the requested id.
    UnknownTool,
}

impl FailureKind {
    /// Short label used in answers and logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Validation => "validation error",
            Self::Execution => "execution error",
            Self::MissingContext => "missing context",
            Self::InsufficientData => "insufficient data",
            Self::UnknownTool => "unknown tool",
        }
    }
}

/// Details of a failed tool call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolFailure {
    /// Failure category.
    pub kind: FailureKind,
    /// The offending argument, when the failure is about one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    /// Human-readable description.
    pub message: String,
}

impl ToolFailure {
    /// Create a failure without a field.
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            field: None,
            message: message.into(),
        }
    }

    /// Attach the offending argument name.
    pub fn with_field(mut self, field: impl Into<String>) -> Self {
        self.field = Some(field.into());
        self
    }
}

/// Result of a tool execution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolResult {
    /// The tool that produced this result.
    pub tool: ToolId,
    /// Whether the execution succeeded.
    pub success: bool,
    /// Human-readable content (or an error description).
    pub content: String,
    /// Structured value; `Null` on failure.
    pub data: Value,
    /// Failure details when `success` is false.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure: Option<ToolFailure>,
    /// Number of attempts the executor made.
    pub attempts: u32,
}

impl ToolResult {
    /// Create a successful tool result.
    pub fn success(tool: ToolId, content: impl Into<String>, data: Value) -> Self {
        Self {
            tool,
            success: true,
            content: content.into(),
            data,
            failure: None,
            attempts: 1,
        }
    }

    /// Create a failed tool result.
    pub fn error(tool: ToolId, failure: ToolFailure) -> Self {
        Self {
            tool,
            success: false,
            content: format!("Error: {}", failure.message),
            data: Value::Null,
            failure: Some(failure),
            attempts: 1,
        }
    }

    /// Record how many attempts were made.
    pub fn with_attempts(mut self, attempts: u32) -> Self {
        self.attempts = attempts;
        self
    }

    /// The failure category, if the call failed.
    pub fn failure_kind(&self) -> Option<FailureKind> {
        self.failure.as_ref().map(|f| f.kind)
    }

    /// Read a numeric field from the structured value.
    pub fn number(&self, key: &str) -> Option<f64> {
        self.data.get(key).and_then(|v| v.as_f64())
    }

    /// Read a string field from the structured value.
    pub fn text(&self, key: &str) -> Option<&str> {
        self.data.get(key).and_then(|v| v.as_str())
    }
}

/// Trait for executing tool calls on behalf of the reasoning loop.
///
/// The executor receives a read-only snapshot of the trace so that tools
/// which depend on earlier results (explanations) can look them up. It never
/// fails: every problem is reported as a failed [`ToolResult`].
#[async_trait]
pub trait ToolExecutor: Send + Sync {
    /// Execute a tool call and return the result.
    async fn execute(&self, call: ToolCall, trace: Arc<Trace>) -> ToolResult;

    /// List the tools this executor supports.
    fn supported_tools(&self) -> Vec<ToolId>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tool_id_round_trips_through_name() {
        for id in ToolId::ALL {
            assert_eq!(id.name().parse::<ToolId>().unwrap(), id);
        }
        assert!(matches!("get_location_name".parse::<ToolId>(), Err(UnknownTool(_))));
    }

    #[test]
    fn test_tool_result_success() {
        let result = ToolResult::success(
            ToolId::Distance,
            "3.98 km",
            serde_json::json!({"distance_km": 3.98}),
        );
        assert!(result.success);
        assert_eq!(result.number("distance_km"), Some(3.98));
        assert!(result.failure_kind().is_none());
    }

    #[test]
    fn test_tool_result_error() {
        let failure =
            ToolFailure::new(FailureKind::Validation, "unknown weather 'foggy'").with_field("weather");
        let result = ToolResult::error(ToolId::Predict, failure).with_attempts(1);
        assert!(!result.success);
        assert_eq!(result.content, "Error: unknown weather 'foggy'");
        assert_eq!(result.failure_kind(), Some(FailureKind::Validation));
        assert_eq!(result.failure.unwrap().field.as_deref(), Some("weather"));
    }

    #[test]
    fn test_tool_call_parsing() {
        let call = ToolCall::from_json(ToolId::Zone, r#"{"lat": 52.52, "lon": 13.405}"#).unwrap();
        assert_eq!(call.tool, ToolId::Zone);
        assert_eq!(call.get_f64("lat"), Some(52.52));
        assert!(call.plan_step.is_none());
    }

    #[test]
    fn test_tool_call_builder() {
        let call = ToolCall::new(ToolId::Weather)
            .with_arg("date", "2026-01-15")
            .for_step(2);
        assert_eq!(call.get_string("date"), Some("2026-01-15"));
        assert_eq!(call.plan_step, Some(2));
    }
}
