//! Tool registry for managing and executing tools.

use std::collections::HashMap;
use std::sync::Arc;

use brain_core::{ToolId, Trace};
use indexmap::IndexMap;
use serde_json::Value;
use tracing::{debug, info};

use crate::error::ToolError;
use crate::spec::{validate, ToolSpec};
use crate::tool::{Tool, ToolArgs, ToolOutput};

/// Registry for managing tools.
///
/// The registry holds one implementation per [`ToolId`], in registration
/// order, and dispatches validated calls to it. It is built once at startup
/// and shared read-only afterwards.
pub struct ToolRegistry {
    tools: IndexMap<ToolId, Arc<dyn Tool>>,
}

impl ToolRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self {
            tools: IndexMap::new(),
        }
    }

    /// Register a tool.
    ///
    /// If a tool with the same id already exists, it will be replaced.
    pub fn register<T: Tool + 'static>(&mut self, tool: T) {
        self.register_shared(Arc::new(tool));
    }

    /// Register a shared tool.
    pub fn register_shared(&mut self, tool: Arc<dyn Tool>) {
        let id = tool.id();
        info!("Registering tool: {}", id);
        self.tools.insert(id, tool);
    }

    /// Get the registered tool ids, in registration order.
    pub fn list_tools(&self) -> Vec<ToolId> {
        self.tools.keys().copied().collect()
    }

    /// Get a tool by id.
    pub fn get(&self, id: ToolId) -> Option<&Arc<dyn Tool>> {
        self.tools.get(&id)
    }

    /// Check if a tool is registered.
    pub fn has_tool(&self, id: ToolId) -> bool {
        self.tools.contains_key(&id)
    }

    /// Declared schema of a tool.
    pub fn spec(&self, id: ToolId) -> Option<&ToolSpec> {
        self.tools.get(&id).map(|t| t.spec())
    }

    /// Function-style definitions of every tool, for callers that drive the
    /// tools from a model.
    pub fn definitions(&self) -> Vec<Value> {
        self.tools.values().map(|t| t.spec().definition()).collect()
    }

    /// Validate raw arguments for a tool.
    pub fn validate(
        &self,
        id: ToolId,
        params: &HashMap<String, Value>,
    ) -> Result<HashMap<String, Value>, ToolError> {
        let tool = self.tools.get(&id).ok_or(ToolError::NotFound(id))?;
        validate(tool.spec(), params)
    }

    /// Run a tool on arguments that already passed [`ToolRegistry::validate`].
    pub async fn invoke(
        &self,
        id: ToolId,
        params: HashMap<String, Value>,
        trace: Arc<Trace>,
    ) -> Result<ToolOutput, ToolError> {
        let tool = self.tools.get(&id).ok_or(ToolError::NotFound(id))?;

        debug!("Executing tool '{}' with {} params", id, params.len());

        let result = tool.execute(ToolArgs::with_trace(params, trace)).await?;

        debug!(
            "Tool '{}' completed: content_len={}",
            id,
            result.content.len()
        );

        Ok(result)
    }

    /// Validate and execute a tool.
    pub async fn execute(
        &self,
        id: ToolId,
        params: HashMap<String, Value>,
        trace: Arc<Trace>,
    ) -> Result<ToolOutput, ToolError> {
        let validated = self.validate(id, &params)?;
        self.invoke(id, validated, trace).await
    }

    /// Execute a tool with a JSON arguments string and an empty trace.
    pub async fn execute_json(&self, id: ToolId, args_json: &str) -> Result<ToolOutput, ToolError> {
        let params: HashMap<String, Value> = serde_json::from_str(args_json)?;
        self.execute(id, params, Arc::new(Trace::new())).await
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}
