//! The rule-based brain.

use async_trait::async_trait;
use brain_core::{
    Brain, BrainError, Decision, FailureKind, Query, ToolCall, ToolId, Trace, TraceEntry,
};
use serde_json::Value;
use tracing::debug;

use crate::actions::{PlanAction, RoutingPlan};
use crate::formatting::compose_answer;
use crate::orchestrator::HELP_TEXT;
use crate::router::Router;

/// Calls a single plan step may use, recoveries included.
pub const MAX_CALLS_PER_STEP: usize = 3;

/// A deterministic brain that works through a routed plan.
///
/// On every think step the query is routed again and the plan is compared
/// with the trace: the first step without a successful result gets the next
/// call. Failed steps are retried only where a known recovery applies:
///
/// - a prediction rejected on `traffic_level` or `driver_experience` is
///   retried once without that field, so the declared default applies;
/// - a prediction rejected on `weather` when the query has a date triggers
///   a weather lookup for that date and a retry with the looked-up value.
///
/// Every other failure is left in the trace and surfaced in the answer.
#[derive(Debug, Clone, Default)]
pub struct PlanBrain {
    router: Router,
}

impl PlanBrain {
    pub fn new() -> Self {
        Self {
            router: Router::new(),
        }
    }

    pub fn router(&self) -> &Router {
        &self.router
    }

    /// The next call for a plan, or `None` once every step is settled.
    pub fn next_call(&self, plan: &RoutingPlan, trace: &Trace) -> Option<ToolCall> {
        for (index, action) in plan.actions.iter().enumerate() {
            let attempts: Vec<&TraceEntry> = trace.for_plan_step(index).collect();

            let resolved = attempts
                .iter()
                .any(|e| e.result.tool == action.tool() && e.result.success);
            if resolved || attempts.len() >= MAX_CALLS_PER_STEP {
                continue;
            }

            let next = match attempts.last() {
                None => Some(first_call(index, action, trace)),
                Some(_) => recovery_call(index, action, &attempts),
            };
            if next.is_some() {
                return next;
            }
        }
        None
    }
}

#[async_trait]
impl Brain for PlanBrain {
    async fn think(&self, query: &Query, trace: &Trace) -> Result<Decision, BrainError> {
        let plan = self.router.route(query.text());

        if plan.is_empty() {
            return Ok(Decision::Answer(HELP_TEXT.to_string()));
        }

        match self.next_call(&plan, trace) {
            Some(call) => {
                debug!(tool = %call.tool, step = ?call.plan_step, "Next call");
                Ok(Decision::Act(call))
            }
            None => Ok(Decision::Answer(compose_answer(&plan, trace))),
        }
    }

    fn name(&self) -> &str {
        "PlanBrain"
    }
}

/// The call for a step that has not been attempted yet.
fn first_call(index: usize, action: &PlanAction, trace: &Trace) -> ToolCall {
    let mut call = ToolCall::new(action.tool()).for_step(index);

    match action {
        PlanAction::Distance { from, to } => {
            if let Some(from) = from {
                call = call.with_arg("lat1", from.lat).with_arg("lon1", from.lon);
            }
            if let Some(to) = to {
                call = call.with_arg("lat2", to.lat).with_arg("lon2", to.lon);
            }
        }
        PlanAction::Zone { point } => {
            if let Some(point) = point {
                call = call.with_arg("lat", point.lat).with_arg("lon", point.lon);
            }
        }
        PlanAction::Weather { date } => {
            if let Some(date) = date {
                call = call.with_arg("date", date.as_str());
            }
        }
        PlanAction::Predict {
            vehicle_type,
            weather,
            distance_km,
            traffic_level,
            driver_experience,
            ..
        } => {
            let weather = weather.clone().or_else(|| {
                trace
                    .last_success(ToolId::Weather)
                    .and_then(|e| e.result.text("weather"))
                    .map(str::to_string)
            });
            let distance_km =
                distance_km.or_else(|| trace.last_number(ToolId::Distance, "distance_km"));

            let fields = [
                ("vehicle_type", vehicle_type.clone().map(Value::from)),
                ("weather", weather.map(Value::from)),
                ("distance_km", distance_km.map(Value::from)),
                ("traffic_level", traffic_level.clone().map(Value::from)),
                ("driver_experience", driver_experience.clone().map(Value::from)),
            ];
            for (name, value) in fields {
                if let Some(value) = value {
                    call = call.with_arg(name, value);
                }
            }
        }
        PlanAction::Explain => {}
        PlanAction::Drift { observations } => {
            if let Some(observations) = observations {
                call = call.with_arg("observations", observations.clone());
            }
        }
        PlanAction::Mask { text } => {
            call = call.with_arg("text", text.as_str());
        }
    }

    call
}

/// The follow-up call for a step whose last attempt did not settle it.
fn recovery_call(index: usize, action: &PlanAction, attempts: &[&TraceEntry]) -> Option<ToolCall> {
    let PlanAction::Predict { date, .. } = action else {
        return None;
    };
    let last = attempts.last()?;
    let last_predict = attempts
        .iter()
        .rev()
        .find(|e| e.call.tool == ToolId::Predict)?;

    if last.call.tool == ToolId::Weather {
        let weather = last.result.text("weather")?;
        let mut retry = last_predict.call.clone();
        retry
            .arguments
            .insert("weather".to_string(), Value::from(weather));
        return Some(retry);
    }

    let failure = last.result.failure.as_ref()?;
    if failure.kind != FailureKind::Validation {
        return None;
    }
    let field = failure.field.as_deref()?;
    if !last.call.arguments.contains_key(field) {
        return None;
    }

    match field {
        "traffic_level" | "driver_experience" => {
            let mut retry = last.call.clone();
            retry.arguments.remove(field);
            Some(retry)
        }
        "weather" => {
            let looked_up = attempts.iter().any(|e| e.call.tool == ToolId::Weather);
            let date = date.as_deref().filter(|_| !looked_up)?;
            Some(
                ToolCall::new(ToolId::Weather)
                    .for_step(index)
                    .with_arg("date", date),
            )
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use brain_core::{ToolFailure, ToolResult};
    use serde_json::json;

    fn think(query: &str, trace: &Trace) -> Decision {
        let brain = PlanBrain::new();
        let plan = brain.router().route(query);
        match brain.next_call(&plan, trace) {
            Some(call) => Decision::Act(call),
            None => Decision::Answer(compose_answer(&plan, trace)),
        }
    }

    fn expect_call(decision: Decision) -> ToolCall {
        match decision {
            Decision::Act(call) => call,
            Decision::Answer(answer) => panic!("expected a call, got answer: {}", answer),
        }
    }

    fn invalid(tool: ToolId, field: &str) -> ToolResult {
        ToolResult::error(
            tool,
            ToolFailure::new(FailureKind::Validation, format!("Invalid parameter '{}'", field))
                .with_field(field),
        )
    }

    #[tokio::test]
    async fn test_help_for_unroutable_query() {
        let decision = PlanBrain::new()
            .think(&Query::new("hello"), &Trace::new())
            .await
            .unwrap();
        assert_eq!(decision, Decision::Answer(HELP_TEXT.to_string()));
    }

    #[test]
    fn test_prediction_uses_distance_result() {
        let query = "Predict a van delivery in sunny weather from 52.5200, 13.4050 to 52.4981, 13.3918";
        let mut trace = Trace::new();

        let distance = expect_call(think(query, &trace));
        assert_eq!(distance.tool, ToolId::Distance);
        assert_eq!(distance.plan_step, Some(0));
        trace.record(
            distance,
            ToolResult::success(ToolId::Distance, "Distance: 2.59 km", json!({"distance_km": 2.59})),
        );

        let predict = expect_call(think(query, &trace));
        assert_eq!(predict.tool, ToolId::Predict);
        assert_eq!(predict.get_f64("distance_km"), Some(2.59));
        assert_eq!(predict.get_string("weather"), Some("sunny"));
        assert_eq!(predict.get_string("vehicle_type"), Some("van"));
    }

    #[test]
    fn test_invalid_optional_field_is_dropped_once() {
        let query = "Predict a bike delivery of 3 km in rain with gridlock traffic";
        let mut trace = Trace::new();

        let first = expect_call(think(query, &trace));
        assert_eq!(first.get_string("traffic_level"), Some("gridlock"));
        trace.record(first, invalid(ToolId::Predict, "traffic_level"));

        let retry = expect_call(think(query, &trace));
        assert_eq!(retry.tool, ToolId::Predict);
        assert!(!retry.arguments.contains_key("traffic_level"));
        assert_eq!(retry.get_string("vehicle_type"), Some("bike"));
        trace.record(retry, invalid(ToolId::Predict, "vehicle_type"));

        // vehicle_type is required, so the failure is surfaced
        match think(query, &trace) {
            Decision::Answer(answer) => {
                assert!(answer.starts_with("Could not predict the delivery time"))
            }
            Decision::Act(call) => panic!("unexpected call {:?}", call),
        }
    }

    #[test]
    fn test_invalid_weather_triggers_lookup() {
        let query = "Predict a scooter delivery of 5 km in foggy weather on 2026-01-15";
        let mut trace = Trace::new();

        let first = expect_call(think(query, &trace));
        assert_eq!(first.get_string("weather"), Some("foggy"));
        trace.record(first, invalid(ToolId::Predict, "weather"));

        let lookup = expect_call(think(query, &trace));
        assert_eq!(lookup.tool, ToolId::Weather);
        assert_eq!(lookup.plan_step, Some(0));
        assert_eq!(lookup.get_string("date"), Some("2026-01-15"));
        trace.record(
            lookup,
            ToolResult::success(
                ToolId::Weather,
                "Weather in Berlin on 2026-01-15: Rainy (elevated delivery risk)",
                json!({"date": "2026-01-15", "weather": "Rainy", "risk": "elevated"}),
            ),
        );

        let retry = expect_call(think(query, &trace));
        assert_eq!(retry.tool, ToolId::Predict);
        assert_eq!(retry.get_string("weather"), Some("Rainy"));
        assert_eq!(retry.get_f64("distance_km"), Some(5.0));
    }

    #[test]
    fn test_recovery_is_bounded() {
        let query = "Predict a scooter delivery of 5 km in foggy weather on 2026-01-15";
        let mut trace = Trace::new();
        let mut calls = 0;
        while let Decision::Act(call) = think(query, &trace) {
            calls += 1;
            assert!(calls <= MAX_CALLS_PER_STEP);
            let result = match call.tool {
                ToolId::Weather => ToolResult::success(
                    ToolId::Weather,
                    "Weather in Berlin on 2026-01-15: Rainy (elevated delivery risk)",
                    json!({"date": "2026-01-15", "weather": "Rainy", "risk": "elevated"}),
                ),
                tool => invalid(tool, "weather"),
            };
            trace.record(call, result);
        }
        assert_eq!(calls, 3);
    }
}
