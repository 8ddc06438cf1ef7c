//! Simulated Berlin weather by date.

use async_trait::async_trait;
use brain_core::ToolId;
use chrono::{Datelike, NaiveDate};
use delivery_model::{Category, Weather};
use serde_json::json;

use crate::error::ToolError;
use crate::spec::{ParamSpec, ParamType, ToolSpec};
use crate::tool::{Tool, ToolArgs, ToolOutput};

/// Berlin climatology: wet winters, a sunny July, cloudy otherwise.
pub fn simulated_weather(date: NaiveDate) -> Weather {
    match date.month() {
        1 | 2 => Weather::Rainy,
        7 => Weather::Sunny,
        _ => Weather::Cloudy,
    }
}

fn delivery_risk(weather: Weather) -> &'static str {
    match weather {
        Weather::Snow => "high",
        Weather::Rainy => "elevated",
        Weather::Sunny | Weather::Cloudy => "normal",
    }
}

/// Looks up the weather condition for a date.
///
/// # Parameters
///
/// - `date` (required): `YYYY-MM-DD`.
pub struct WeatherRisk {
    spec: ToolSpec,
}

impl WeatherRisk {
    pub fn new() -> Self {
        Self {
            spec: ToolSpec::new(
                ToolId::Weather,
                "Checks the weather for Berlin on a specific date. \
                 Returns 'Sunny', 'Rainy', 'Snow', or 'Cloudy'.",
                vec![ParamSpec::required(
                    "date",
                    "Date in YYYY-MM-DD format",
                    ParamType::Date,
                )],
            ),
        }
    }
}

impl Default for WeatherRisk {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Tool for WeatherRisk {
    fn id(&self) -> ToolId {
        ToolId::Weather
    }

    fn spec(&self) -> &ToolSpec {
        &self.spec
    }

    async fn execute(&self, args: ToolArgs) -> Result<ToolOutput, ToolError> {
        let raw = args.get_string("date")?;
        let date = NaiveDate::parse_from_str(&raw, "%Y-%m-%d").map_err(|_| {
            ToolError::invalid("date", format!("'{}' is not a YYYY-MM-DD date", raw))
        })?;

        let weather = simulated_weather(date);
        let risk = delivery_risk(weather);

        Ok(ToolOutput::new(
            format!("Weather in Berlin on {}: {} ({} delivery risk)", raw, weather, risk),
            json!({
                "date": raw,
                "weather": weather.as_str(),
                "risk": risk,
            }),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ToolRegistry;

    #[test]
    fn test_climatology() {
        let date = |s: &str| NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap();
        assert_eq!(simulated_weather(date("2026-01-15")), Weather::Rainy);
        assert_eq!(simulated_weather(date("2026-02-28")), Weather::Rainy);
        assert_eq!(simulated_weather(date("2026-07-04")), Weather::Sunny);
        assert_eq!(simulated_weather(date("2026-10-16")), Weather::Cloudy);
    }

    #[tokio::test]
    async fn test_weather_tool() {
        let mut registry = ToolRegistry::new();
        registry.register(WeatherRisk::new());

        let output = registry
            .execute_json(ToolId::Weather, r#"{"date": "2026-01-15"}"#)
            .await
            .unwrap();
        assert_eq!(output.data["weather"], json!("Rainy"));
        assert_eq!(output.data["risk"], json!("elevated"));

        let invalid = registry
            .execute_json(ToolId::Weather, r#"{"date": "next tuesday"}"#)
            .await;
        assert!(matches!(invalid, Err(ToolError::Validation { .. })));
    }
}
