//! Core traits and types for reasoning brains.
//!
//! This crate holds the vocabulary shared by every part of the Berlin
//! logistics agent. It defines:
//!
//! - [`Brain`] - The think step of the reasoning loop: look at the query and
//!   the trace so far, then either call a tool or answer.
//! - [`Query`] - The immutable user text a run works on.
//! - [`ToolId`] / [`ToolCall`] / [`ToolResult`] - The closed set of tools and
//!   the request/response pair exchanged with them.
//! - [`Trace`] - The ordered record of calls and results for one query.
//! - [`ToolExecutor`] - Trait for dispatching a [`ToolCall`] to a tool.
//! - [`BrainError`] - Error types for brain operations.
//!
//! # Example
//!
//! ```rust
//! use brain_core::{Brain, BrainError, Decision, Query, Trace};
//! use async_trait::async_trait;
//!
//! struct Silent;
//!
//! #[async_trait]
//! impl Brain for Silent {
//!     async fn think(&self, _query: &Query, _trace: &Trace) -> Result<Decision, BrainError> {
//!         Ok(Decision::Answer("Nothing to do.".to_string()))
//!     }
//!
//!     fn name(&self) -> &str {
//!         "Silent"
//!     }
//! }
//! ```

mod error;
mod message;
mod tools;
mod trace;
mod trait_def;

pub use error::BrainError;
pub use message::Query;
pub use tools::{FailureKind, ToolCall, ToolExecutor, ToolFailure, ToolId, ToolResult, UnknownTool};
pub use trace::{Trace, TraceEntry};
pub use trait_def::{Brain, Decision};

// Re-export async_trait for convenience
pub use async_trait::async_trait;
