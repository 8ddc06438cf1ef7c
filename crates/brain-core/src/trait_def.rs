//! The Brain trait definition.

use async_trait::async_trait;

use crate::error::BrainError;
use crate::message::Query;
use crate::tools::ToolCall;
use crate::trace::Trace;

/// What the think step decided.
#[derive(Debug, Clone, PartialEq)]
pub enum Decision {
    /// Call a tool next.
    Act(ToolCall),
    /// Enough information exists; this is the final answer.
    Answer(String),
}

/// The think step of the reasoning loop.
///
/// Given the query and everything observed so far, a brain either picks the
/// next tool call or produces the final answer. Brains hold no per-query
/// state: everything they need is in the query and the trace, so a single
/// brain can serve any number of concurrent runs.
///
/// This trait is object-safe and can be used with `Box<dyn Brain>`.
#[async_trait]
pub trait Brain: Send + Sync {
    /// Decide the next step.
    async fn think(&self, query: &Query, trace: &Trace) -> Result<Decision, BrainError>;

    /// Get a human-readable name for this brain implementation.
    fn name(&self) -> &str;
}
