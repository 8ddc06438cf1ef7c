//! The per-query reasoning trace.
//!
//! A trace is the working memory of one run: the ordered sequence of tool
//! calls and their results. It is created empty for every query, owned by the
//! run, and dropped with the final answer. Nothing in it survives across
//! queries.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::tools::{ToolCall, ToolId, ToolResult};

/// One recorded call/result pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraceEntry {
    /// Zero-based position in the trace.
    pub step: usize,
    /// The call as issued by the brain.
    pub call: ToolCall,
    /// The observed result.
    pub result: ToolResult,
}

/// Ordered record of calls and results for a single query.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Trace {
    entries: Vec<TraceEntry>,
}

impl Trace {
    /// Create an empty trace.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a call and its result.
    pub fn record(&mut self, call: ToolCall, result: ToolResult) -> &TraceEntry {
        let step = self.entries.len();
        self.entries.push(TraceEntry { step, call, result });
        &self.entries[step]
    }

    /// All entries in call order.
    pub fn entries(&self) -> &[TraceEntry] {
        &self.entries
    }

    /// Number of recorded calls.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no call has been recorded yet.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over the entries in call order.
    pub fn iter(&self) -> impl Iterator<Item = &TraceEntry> {
        self.entries.iter()
    }

    /// Successful entries for a tool, oldest first.
    pub fn successes(&self, tool: ToolId) -> impl Iterator<Item = &TraceEntry> {
        self.entries
            .iter()
            .filter(move |e| e.result.tool == tool && e.result.success)
    }

    /// The most recent successful entry for a tool.
    pub fn last_success(&self, tool: ToolId) -> Option<&TraceEntry> {
        self.entries
            .iter()
            .rev()
            .find(|e| e.result.tool == tool && e.result.success)
    }

    /// A numeric field of the most recent successful result of a tool.
    pub fn last_number(&self, tool: ToolId, key: &str) -> Option<f64> {
        self.last_success(tool).and_then(|e| e.result.number(key))
    }

    /// Entries issued for a given plan step.
    pub fn for_plan_step(&self, plan_step: usize) -> impl Iterator<Item = &TraceEntry> {
        self.entries
            .iter()
            .filter(move |e| e.call.plan_step == Some(plan_step))
    }

    /// Number of successful calls.
    pub fn success_count(&self) -> usize {
        self.entries.iter().filter(|e| e.result.success).count()
    }

    /// Number of failed calls.
    pub fn failure_count(&self) -> usize {
        self.entries.len() - self.success_count()
    }

    /// True when at least one call was made and every call failed.
    pub fn all_failed(&self) -> bool {
        !self.entries.is_empty() && self.success_count() == 0
    }

    /// A copy with every piece of free text passed through `f`: string
    /// arguments, result content, string values in result data and failure
    /// messages. Keys, numbers and tool ids are kept as they are.
    pub fn map_text(&self, f: impl Fn(&str) -> String) -> Trace {
        let entries = self
            .entries
            .iter()
            .map(|entry| {
                let mut entry = entry.clone();
                for value in entry.call.arguments.values_mut() {
                    *value = map_strings(value, &f);
                }
                entry.result.content = f(&entry.result.content);
                entry.result.data = map_strings(&entry.result.data, &f);
                if let Some(failure) = entry.result.failure.as_mut() {
                    failure.message = f(&failure.message);
                }
                entry
            })
            .collect();
        Trace { entries }
    }
}

fn map_strings(value: &Value, f: &impl Fn(&str) -> String) -> Value {
    match value {
        Value::String(s) => Value::String(f(s)),
        Value::Array(items) => Value::Array(items.iter().map(|v| map_strings(v, f)).collect()),
        Value::Object(fields) => Value::Object(
            fields
                .iter()
                .map(|(k, v)| (k.clone(), map_strings(v, f)))
                .collect(),
        ),
        other => other.clone(),
    }
}
