//! Answer synthesis from the reasoning trace.
//!
//! Every answer is built from recorded tool results only: a step that
//! succeeded contributes its result text, a step that failed contributes the
//! failure. Nothing is invented for steps that did not run.

use agent_tools::tools::{DEFAULT_EXPERIENCE, DEFAULT_TRAFFIC};
use brain_core::{FailureKind, ToolId, ToolResult, Trace, TraceEntry};

use crate::actions::{PlanAction, RoutingPlan};

/// Compose the final answer for a completed plan.
pub fn compose_answer(plan: &RoutingPlan, trace: &Trace) -> String {
    let mut lines = Vec::new();

    for (index, action) in plan.actions.iter().enumerate() {
        let entries: Vec<&TraceEntry> = trace.for_plan_step(index).collect();
        lines.push(step_summary(action, &entries));
        lines.extend(recovery_notes(action, &entries));
    }

    if lines.is_empty() {
        "I could not find an answer to that request.".to_string()
    } else {
        lines.join("\n")
    }
}

/// Answer for a run that stopped before the brain produced one.
///
/// Lists every call made so far, so the caller can see how far the run got.
pub fn unable_to_complete(reason: &str, trace: &Trace) -> String {
    let mut answer = format!("I was unable to complete the request: {}.", reason);

    if trace.is_empty() {
        answer.push_str(" No tools were run.");
        return answer;
    }

    answer.push_str("\nPartial results:");
    for entry in trace.iter() {
        answer.push_str(&format!(
            "\n{}. {}: {}",
            entry.step + 1,
            entry.call.tool,
            entry.result.content
        ));
    }
    answer
}

fn failure_message(result: &ToolResult) -> String {
    result
        .failure
        .as_ref()
        .map(|f| f.message.clone())
        .unwrap_or_else(|| result.content.clone())
}

fn step_summary(action: &PlanAction, entries: &[&TraceEntry]) -> String {
    let tool = action.tool();

    if let Some(done) = entries
        .iter()
        .rev()
        .find(|e| e.result.tool == tool && e.result.success)
    {
        return done.result.content.clone();
    }

    match entries.iter().rev().find(|e| !e.result.success) {
        Some(failed) => format!(
            "Could not {}: {}",
            action.description(),
            failure_message(&failed.result)
        ),
        None => format!("Could not {}: the step was not run.", action.description()),
    }
}

/// Notes on values the brain had to replace to get a prediction through.
fn recovery_notes(action: &PlanAction, entries: &[&TraceEntry]) -> Vec<String> {
    let PlanAction::Predict { .. } = action else {
        return Vec::new();
    };
    let predicted = entries
        .iter()
        .any(|e| e.result.tool == ToolId::Predict && e.result.success);
    if !predicted {
        return Vec::new();
    }

    let mut notes = Vec::new();
    for entry in entries {
        let Some(failure) = entry.result.failure.as_ref() else {
            continue;
        };
        if entry.call.tool != ToolId::Predict || failure.kind != FailureKind::Validation {
            continue;
        }
        let field = failure.field.as_deref().unwrap_or_default();
        let raw = entry.call.get_string(field).unwrap_or_default();

        match field {
            "traffic_level" => notes.push(format!(
                "Note: '{}' is not a known traffic level, so the default ({}) was used.",
                raw, DEFAULT_TRAFFIC
            )),
            "driver_experience" => notes.push(format!(
                "Note: '{}' is not a known driver experience level, so the default ({}) was used.",
                raw, DEFAULT_EXPERIENCE
            )),
            "weather" => {
                if let Some(lookup) = entries
                    .iter()
                    .find(|e| e.result.tool == ToolId::Weather && e.result.success)
                {
                    notes.push(format!(
                        "Note: '{}' is not a known weather condition, so the weather for {} ({}) was used.",
                        raw,
                        lookup.result.text("date").unwrap_or_default(),
                        lookup.result.text("weather").unwrap_or_default()
                    ));
                }
            }
            _ => {}
        }
    }
    notes
}
