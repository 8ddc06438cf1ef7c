//! The reasoning loop.

use std::sync::Arc;

use agent_tools::pii::redact;
use brain_core::{Brain, Decision, Query, ToolCall, ToolExecutor, ToolResult, Trace};
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::AgentConfig;
use crate::context::AppContext;
use crate::error::OrchestratorError;
use crate::formatting::unable_to_complete;
use crate::planner::PlanBrain;

/// Help text shown when the query names no task.
pub const HELP_TEXT: &str = r#"I'm a delivery logistics assistant for Berlin. I can:

• Distance: "How far is it from 52.5200, 13.4050 to 52.4981, 13.3918?"
• Zone: "Which district is 52.5423, 13.4140 in?"
• Weather: "What's the weather on 2026-01-15?"
• Prediction: "Predict a bike delivery of 3.5 km in rain with heavy traffic and a junior driver"
• Explanation: add "and explain the factors" to a prediction
• Drift check: "Check drift for recent durations [32.1, 35.4, 29.8, 41.0]"
• Anonymization: Anonymize: <text to clean>

Coordinates are decimal latitude, longitude pairs; dates are YYYY-MM-DD."#;

/// How a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    /// The brain produced an answer.
    Answered,
    /// The brain wanted another tool call after the cap was reached.
    IterationCapReached,
    /// Enough calls were made and every one of them failed.
    AllToolsFailed,
    /// The caller cancelled the run.
    Cancelled,
    /// The think step returned an error.
    BrainFailed,
}

/// The answer to one query, with the trace that produced it. Both are
/// PII-masked.
#[derive(Debug, Clone, Serialize)]
pub struct AgentResponse {
    pub answer: String,
    pub trace: Trace,
    pub outcome: Outcome,
}

/// Bounds on a single run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoopLimits {
    /// Maximum number of tool calls.
    pub max_iterations: usize,
    /// Stop once at least this many calls were made and all failed.
    pub failure_abort_threshold: usize,
}

impl Default for LoopLimits {
    fn default() -> Self {
        Self::from(&AgentConfig::default())
    }
}

impl From<&AgentConfig> for LoopLimits {
    fn from(config: &AgentConfig) -> Self {
        Self {
            max_iterations: config.max_iterations,
            failure_abort_threshold: config.failure_abort_threshold,
        }
    }
}

enum LoopState {
    Thinking,
    Acting(ToolCall),
    Observing(ToolCall, ToolResult),
    Done(String),
    Failed(Outcome),
}

/// Main orchestrator that runs the think/act/observe loop.
///
/// The orchestrator:
/// - Asks the brain for the next step, given the query and the trace
/// - Runs tool calls through the executor and records every result
/// - Stops on an answer, at the call cap, when every call failed, or on
///   cancellation
/// - Masks PII in the final answer, the returned trace and in log lines that
///   carry user text
///
/// Each run owns its trace; the brain and executor are shared, so one
/// orchestrator can serve concurrent queries.
pub struct Orchestrator {
    brain: Arc<dyn Brain>,
    executor: Arc<dyn ToolExecutor>,
    limits: LoopLimits,
}

impl Orchestrator {
    /// Create a new orchestrator with the given components.
    pub fn new(brain: Arc<dyn Brain>, executor: Arc<dyn ToolExecutor>, limits: LoopLimits) -> Self {
        Self {
            brain,
            executor,
            limits,
        }
    }

    /// Create an orchestrator with the rule-based brain over a loaded context.
    pub fn from_context(context: &AppContext) -> Self {
        Self::new(
            Arc::new(PlanBrain::new()),
            Arc::new(context.executor()),
            LoopLimits::from(context.config()),
        )
    }

    /// Create an orchestrator from environment variables.
    ///
    /// This loads the config and the artifacts it names.
    pub fn from_env() -> Result<Self, OrchestratorError> {
        let config = AgentConfig::from_env()?;
        let context = AppContext::load(&config)?;
        Ok(Self::from_context(&context))
    }

    pub fn limits(&self) -> LoopLimits {
        self.limits
    }

    /// Answer a query.
    pub async fn run(&self, query: &str) -> String {
        self.run_with_trace(query).await.answer
    }

    /// Answer a query and return the trace along with it.
    pub async fn run_with_trace(&self, query: &str) -> AgentResponse {
        self.run_cancellable(query, CancellationToken::new()).await
    }

    /// Answer a query, stopping early if `cancel` fires.
    ///
    /// Cancellation is checked before every think step, so a tool call that
    /// already started runs to completion.
    pub async fn run_cancellable(&self, query: &str, cancel: CancellationToken) -> AgentResponse {
        let query = Query::new(query);
        let mut trace = Trace::new();

        info!(
            query = %redact(query.text()),
            brain = self.brain.name(),
            "Processing query"
        );

        if query.is_blank() {
            return self.finish(HELP_TEXT.to_string(), trace, Outcome::Answered);
        }

        let mut state = LoopState::Thinking;
        loop {
            state = match state {
                LoopState::Thinking => self.think(&query, &trace, &cancel).await,
                LoopState::Acting(call) => {
                    let snapshot = Arc::new(trace.clone());
                    let result = self.executor.execute(call.clone(), snapshot).await;
                    LoopState::Observing(call, result)
                }
                LoopState::Observing(call, result) => self.observe(&mut trace, call, result),
                LoopState::Done(answer) => {
                    return self.finish(answer, trace, Outcome::Answered);
                }
                LoopState::Failed(outcome) => {
                    let answer = unable_to_complete(&self.stop_reason(outcome), &trace);
                    return self.finish(answer, trace, outcome);
                }
            };
        }
    }

    async fn think(&self, query: &Query, trace: &Trace, cancel: &CancellationToken) -> LoopState {
        if cancel.is_cancelled() {
            info!(calls = trace.len(), "Run cancelled");
            return LoopState::Failed(Outcome::Cancelled);
        }

        match self.brain.think(query, trace).await {
            Ok(Decision::Answer(answer)) => LoopState::Done(answer),
            Ok(Decision::Act(_)) if trace.len() >= self.limits.max_iterations => {
                warn!(
                    max_iterations = self.limits.max_iterations,
                    "Tool call limit reached"
                );
                LoopState::Failed(Outcome::IterationCapReached)
            }
            Ok(Decision::Act(call)) => {
                debug!(tool = %call.tool, step = trace.len(), "Acting");
                LoopState::Acting(call)
            }
            Err(e) => {
                warn!(error = %redact(&e.to_string()), "Brain failed");
                LoopState::Failed(Outcome::BrainFailed)
            }
        }
    }

    fn observe(&self, trace: &mut Trace, call: ToolCall, result: ToolResult) -> LoopState {
        let entry = trace.record(call, result);
        debug!(
            tool = %entry.result.tool,
            step = entry.step,
            success = entry.result.success,
            attempts = entry.result.attempts,
            "Observed result"
        );
        if let Some(failure) = &entry.result.failure {
            warn!(
                tool = %entry.result.tool,
                kind = failure.kind.as_str(),
                error = %redact(&failure.message),
                "Tool call failed"
            );
        }

        if trace.len() >= self.limits.failure_abort_threshold && trace.all_failed() {
            warn!(calls = trace.len(), "Every tool call failed, giving up");
            return LoopState::Failed(Outcome::AllToolsFailed);
        }
        LoopState::Thinking
    }

    fn stop_reason(&self, outcome: Outcome) -> String {
        match outcome {
            Outcome::Answered => "no answer was produced".to_string(),
            Outcome::IterationCapReached => format!(
                "the tool call limit ({}) was reached",
                self.limits.max_iterations
            ),
            Outcome::AllToolsFailed => "every tool call failed".to_string(),
            Outcome::Cancelled => "the request was cancelled".to_string(),
            Outcome::BrainFailed => "the reasoning step failed".to_string(),
        }
    }

    fn finish(&self, answer: String, trace: Trace, outcome: Outcome) -> AgentResponse {
        let answer = if answer.trim().is_empty() {
            unable_to_complete(&self.stop_reason(Outcome::Answered), &trace)
        } else {
            answer
        };
        let answer = redact(&answer);
        let trace = trace.map_text(redact);

        info!(
            outcome = ?outcome,
            calls = trace.len(),
            failures = trace.failure_count(),
            "Query finished"
        );

        AgentResponse {
            answer,
            trace,
            outcome,
        }
    }
}
