//! End-to-end runs of the reasoning loop over the bundled model artifacts.

use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use brain_core::{FailureKind, ToolId};
use orchestrator::{AgentConfig, AppContext, CancellationToken, Orchestrator, Outcome, HELP_TEXT};
use tracing_subscriber::EnvFilter;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("orchestrator=debug,agent_tools=debug")),
        )
        .with_test_writer()
        .try_init();
}

fn models_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../models")
}

fn config() -> AgentConfig {
    AgentConfig::default()
        .with_model_path(models_dir().join("delivery_model.json"))
        .with_baseline_path(models_dir().join("training_stats.json"))
}

fn orchestrator_with(config: AgentConfig) -> Orchestrator {
    init_tracing();
    let context = AppContext::load(&config).expect("artifacts load");
    Orchestrator::from_context(&context)
}

fn orchestrator() -> Orchestrator {
    orchestrator_with(config())
}

#[tokio::test]
async fn test_distance_feeds_prediction() {
    let response = orchestrator()
        .run_with_trace(
            "Predict the delivery time for a bike in rainy weather with heavy traffic \
             and a junior driver from 52.5200, 13.4050 to 52.4981, 13.3918",
        )
        .await;

    assert_eq!(response.outcome, Outcome::Answered);
    let entries = response.trace.entries();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].call.tool, ToolId::Distance);
    assert_eq!(entries[1].call.tool, ToolId::Predict);

    let distance = entries[0].result.number("distance_km").unwrap();
    let used = entries[1].call.get_f64("distance_km").unwrap();
    assert!((distance - used).abs() < 1e-9);
    assert!((distance - 2.59).abs() < 0.01);

    assert!(entries[1].result.success);
    assert!(entries[1].result.number("duration_mins").unwrap() > 0.0);
    assert!(response.answer.contains("Distance: 2.59 km"));
    assert!(response.answer.contains("Predicted delivery time:"));
}

#[tokio::test]
async fn test_predict_then_explain() {
    let response = orchestrator()
        .run_with_trace(
            "Explain the factors: predict a bike delivery of 3.98 km in rainy weather \
             with heavy traffic and a junior driver",
        )
        .await;

    assert_eq!(
        response
            .trace
            .iter()
            .map(|e| e.call.tool)
            .collect::<Vec<_>>(),
        vec![ToolId::Predict, ToolId::Explain]
    );
    assert_eq!(response.trace.success_count(), 2);
    assert!(response.answer.contains("35.5 minutes"));
    assert!(response.answer.contains("Impact of factors:"));
}

#[tokio::test]
async fn test_explain_without_prediction_is_missing_context() {
    let response = orchestrator()
        .run_with_trace("Why was the last delivery so slow?")
        .await;

    let entries = response.trace.entries();
    assert_eq!(entries.len(), 1);
    assert_eq!(
        entries[0].result.failure_kind(),
        Some(FailureKind::MissingContext)
    );
    assert!(response.answer.starts_with("Could not explain the prediction:"));
}

#[tokio::test]
async fn test_invalid_traffic_falls_back_to_default() {
    let response = orchestrator()
        .run_with_trace("Predict a van delivery of 3 km in sunny weather with gridlock traffic")
        .await;

    let entries = response.trace.entries();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].result.failure_kind(), Some(FailureKind::Validation));
    assert!(entries[1].result.success);
    assert_eq!(
        entries[1].result.data["features"]["traffic_level"],
        serde_json::json!("Medium")
    );
    assert!(response.answer.contains("so the default (Medium) was used"));
}

#[tokio::test]
async fn test_invalid_weather_is_looked_up() {
    let response = orchestrator()
        .run_with_trace("Predict a scooter delivery of 5 km in foggy weather on 2026-01-15")
        .await;

    let tools: Vec<ToolId> = response.trace.iter().map(|e| e.call.tool).collect();
    assert_eq!(tools, vec![ToolId::Predict, ToolId::Weather, ToolId::Predict]);
    assert_eq!(
        response.trace.entries()[2].call.get_string("weather"),
        Some("Rainy")
    );
    assert!(response.trace.entries()[2].result.success);
    assert!(response.answer.contains("the weather for 2026-01-15 (Rainy) was used"));
}

#[tokio::test]
async fn test_dated_prediction_looks_up_weather_first() {
    let response = orchestrator()
        .run_with_trace("Estimate a scooter delivery of 4 km on 2026-07-10")
        .await;

    let entries = response.trace.entries();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].result.text("weather"), Some("Sunny"));
    assert_eq!(entries[1].call.get_string("weather"), Some("Sunny"));
    assert_eq!(response.outcome, Outcome::Answered);
}

#[tokio::test]
async fn test_drift_against_baseline() {
    let mut baseline = tempfile::NamedTempFile::new().unwrap();
    write!(
        baseline,
        r#"{{"mean_duration": 90.0, "std_duration": 5.0, "count": 1000}}"#
    )
    .unwrap();
    let orchestrator = orchestrator_with(config().with_baseline_path(baseline.path()));

    let stable = orchestrator
        .run_with_trace("Check drift for [90, 85, 95, 88, 92]")
        .await;
    assert_eq!(
        stable.trace.entries()[0].result.data["is_drifted"],
        serde_json::json!(false)
    );
    assert!(stable.answer.ends_with("Data is stable. Model is healthy."));

    let drifted = orchestrator
        .run_with_trace("Check drift for [150, 155, 160, 152]")
        .await;
    assert_eq!(
        drifted.trace.entries()[0].result.data["is_drifted"],
        serde_json::json!(true)
    );
    assert!(drifted.answer.contains("Drift detected."));
}

#[tokio::test]
async fn test_drift_needs_two_observations() {
    let response = orchestrator()
        .run_with_trace("Has the data drifted? [31.0]")
        .await;
    assert_eq!(
        response.trace.entries()[0].result.failure_kind(),
        Some(FailureKind::InsufficientData)
    );
    assert!(response.answer.starts_with("Could not check for data drift"));
}

#[tokio::test]
async fn test_anonymize() {
    let answer = orchestrator()
        .run("Anonymize: Frau Lena Vogel, lena@vogel.de, +49 170 1234567")
        .await;
    assert_eq!(answer, "Frau [NAME], [EMAIL], [PHONE]");
}

/// Log output collected in memory.
#[derive(Clone, Default)]
struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

impl CapturedLogs {
    fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

impl Write for CapturedLogs {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[tokio::test]
async fn test_response_and_logs_carry_no_raw_pii() {
    let logs = CapturedLogs::default();
    let writer = logs.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new("debug"))
        .with_writer(move || writer.clone())
        .with_ansi(false)
        .finish();
    let _guard = tracing::subscriber::set_default(subscriber);

    let context = AppContext::load(&config()).expect("artifacts load");
    let response = Orchestrator::from_context(&context)
        .run_with_trace("Anonymize: Frau Lena Vogel, lena@vogel.de, +49 170 1234567")
        .await;

    let serialized = serde_json::to_string(&response).unwrap();
    assert!(serialized.contains("[EMAIL]"));
    assert_eq!(
        response.trace.entries()[0].call.get_string("text"),
        Some("Frau [NAME], [EMAIL], [PHONE]")
    );

    let logged = logs.contents();
    assert!(logged.contains("Processing query"));
    for raw in ["Lena", "Vogel", "lena@vogel.de", "1234567"] {
        assert!(!serialized.contains(raw), "{} in response: {}", raw, serialized);
        assert!(!logged.contains(raw), "{} in logs: {}", raw, logged);
    }
}

#[tokio::test]
async fn test_zone_per_point() {
    let response = orchestrator()
        .run_with_trace("Which district are 52.4981, 13.3918 and 52.3906, 13.0645 in?")
        .await;

    let entries = response.trace.entries();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].result.text("zone"), Some("Kreuzberg"));
    assert!(entries[1].result.data["zone"].is_null());
    assert!(response.answer.contains("outside the Berlin service area"));
}

#[tokio::test]
async fn test_call_cap_always_answers() {
    let orchestrator = orchestrator_with(config().with_max_iterations(1));
    let response = orchestrator
        .run_with_trace(
            "Predict a bike delivery in rain from 52.5200, 13.4050 to 52.4981, 13.3918",
        )
        .await;

    assert_eq!(response.outcome, Outcome::IterationCapReached);
    assert_eq!(response.trace.len(), 1);
    assert!(response.answer.contains("tool call limit (1)"));
}

#[tokio::test]
async fn test_every_call_failing_still_answers() {
    let response = orchestrator()
        .run_with_trace("Explain why, check the drift, and tell me which district")
        .await;

    assert_eq!(response.outcome, Outcome::AllToolsFailed);
    assert_eq!(response.trace.len(), 3);
    assert!(response.trace.all_failed());
    assert!(response.answer.contains("every tool call failed"));
    assert!(response.answer.contains("Partial results:"));
}

#[tokio::test]
async fn test_cancelled_run() {
    let cancel = CancellationToken::new();
    cancel.cancel();
    let response = orchestrator()
        .run_cancellable("Check drift for [30, 31, 32]", cancel)
        .await;
    assert_eq!(response.outcome, Outcome::Cancelled);
    assert!(response.trace.is_empty());
    assert!(!response.answer.is_empty());
}

#[tokio::test]
async fn test_help_text() {
    let orchestrator = orchestrator();
    assert_eq!(orchestrator.run("hello").await, HELP_TEXT);
    assert_eq!(orchestrator.run("").await, HELP_TEXT);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_runs_keep_separate_traces() {
    let orchestrator = Arc::new(orchestrator());

    let handles: Vec<_> = (1..=4)
        .map(|km| {
            let orchestrator = orchestrator.clone();
            tokio::spawn(async move {
                orchestrator
                    .run_with_trace(&format!("Predict a van delivery of {} km in snow", km))
                    .await
            })
        })
        .collect();

    for (km, handle) in (1..=4).zip(handles) {
        let response = handle.await.unwrap();
        assert_eq!(response.trace.len(), 1);
        assert_eq!(
            response.trace.entries()[0].call.get_f64("distance_km"),
            Some(km as f64)
        );
    }
}
