//! Tool trait definition and types.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use brain_core::{ToolId, Trace};
use delivery_model::Category;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ToolError;
use crate::spec::ToolSpec;

/// Validated arguments passed to a tool for execution.
#[derive(Clone)]
pub struct ToolArgs {
    /// Parameters as key-value pairs, already coerced by the validator.
    pub params: HashMap<String, Value>,
    /// Read-only snapshot of the reasoning trace so far.
    pub trace: Arc<Trace>,
}

impl ToolArgs {
    /// Create tool arguments with an empty trace.
    pub fn new(params: HashMap<String, Value>) -> Self {
        Self {
            params,
            trace: Arc::new(Trace::new()),
        }
    }

    /// Create tool arguments that can see the given trace.
    pub fn with_trace(params: HashMap<String, Value>, trace: Arc<Trace>) -> Self {
        Self { params, trace }
    }

    /// Check if a parameter was supplied (or defaulted).
    pub fn has(&self, key: &str) -> bool {
        self.params.contains_key(key)
    }

    /// Get a string parameter, returning an error if missing or not a string.
    pub fn get_string(&self, key: &str) -> Result<String, ToolError> {
        self.params
            .get(key)
            .ok_or_else(|| ToolError::MissingParameter(key.to_string()))?
            .as_str()
            .map(|s| s.to_string())
            .ok_or_else(|| ToolError::invalid(key, "expected string"))
    }

    /// Get an f64 parameter, returning an error if missing or not a number.
    pub fn get_f64(&self, key: &str) -> Result<f64, ToolError> {
        self.params
            .get(key)
            .ok_or_else(|| ToolError::MissingParameter(key.to_string()))?
            .as_f64()
            .ok_or_else(|| ToolError::invalid(key, "expected number"))
    }

    /// Get a list of numbers.
    pub fn get_numbers(&self, key: &str) -> Result<Vec<f64>, ToolError> {
        let items = self
            .params
            .get(key)
            .ok_or_else(|| ToolError::MissingParameter(key.to_string()))?
            .as_array()
            .ok_or_else(|| ToolError::invalid(key, "expected array of numbers"))?;

        items
            .iter()
            .map(|v| {
                v.as_f64()
                    .ok_or_else(|| ToolError::invalid(key, "expected array of numbers"))
            })
            .collect()
    }

    /// Get a categorical parameter as its typed category.
    pub fn get_category<C: Category>(&self, key: &str) -> Result<C, ToolError> {
        let raw = self.get_string(key)?;
        Ok(C::parse(&raw)?)
    }
}

/// Output from a successful tool execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolOutput {
    /// Human-readable result.
    pub content: String,
    /// Structured result that later steps can read from the trace.
    pub data: Value,
}

impl ToolOutput {
    pub fn new(content: impl Into<String>, data: Value) -> Self {
        Self {
            content: content.into(),
            data,
        }
    }
}

/// Trait for tools that can be executed by the reasoning loop.
///
/// Tools are pure with respect to shared state: they read their arguments and
/// the trace snapshot and return an output. Arguments are validated against
/// [`Tool::spec`] before `execute` is called.
#[async_trait]
pub trait Tool: Send + Sync {
    /// The tool's identifier (used for dispatch).
    fn id(&self) -> ToolId;

    /// Declared parameter schema.
    fn spec(&self) -> &ToolSpec;

    /// Execute the tool with validated arguments.
    async fn execute(&self, args: ToolArgs) -> Result<ToolOutput, ToolError>;
}
