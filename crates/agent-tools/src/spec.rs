//! Declared tool schemas and the argument validator.
//!
//! Every tool declares an ordered parameter list. [`validate`] checks raw
//! arguments against it and returns the coerced parameter map the tool will
//! see. Rejection is total: one bad argument rejects the whole call.
//!
//! Normalization rules:
//! - categorical: trimmed, case-insensitive match on canonical names and the
//!   alias table of the category; the canonical name is passed on
//! - numeric: JSON numbers or strings parsing as finite decimals
//! - number lists: arrays whose elements follow the numeric rule
//! - dates: `YYYY-MM-DD`
//! - a declared default applies only when the argument is absent (or null)

use std::collections::HashMap;

use brain_core::ToolId;
use chrono::NaiveDate;
use delivery_model::{canonical_name, Category};
use serde_json::{json, Map, Value};

use crate::error::ToolError;

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Type and domain of a parameter.
#[derive(Debug, Clone)]
pub enum ParamType {
    Number {
        min: Option<f64>,
        max: Option<f64>,
        /// `min` itself is not allowed.
        exclusive_min: bool,
    },
    Text {
        max_len: Option<usize>,
    },
    Category {
        allowed: Vec<&'static str>,
        normalize: fn(&str) -> Option<&'static str>,
    },
    NumberList {
        min: Option<f64>,
    },
    Date,
}

impl ParamType {
    /// Inclusive numeric range.
    pub fn range(min: f64, max: f64) -> Self {
        Self::Number {
            min: Some(min),
            max: Some(max),
            exclusive_min: false,
        }
    }

    /// A closed category set with its alias table.
    pub fn category<C: Category>() -> Self {
        Self::Category {
            allowed: C::names(),
            normalize: canonical_name::<C>,
        }
    }

    fn type_name(&self) -> &'static str {
        match self {
            Self::Number { .. } => "number",
            Self::Text { .. } => "string",
            Self::Category { .. } => "string",
            Self::NumberList { .. } => "array",
            Self::Date => "string",
        }
    }
}

/// One declared parameter.
#[derive(Debug, Clone)]
pub struct ParamSpec {
    pub name: &'static str,
    pub description: &'static str,
    pub kind: ParamType,
    pub required: bool,
    pub default: Option<Value>,
}

impl ParamSpec {
    pub fn required(name: &'static str, description: &'static str, kind: ParamType) -> Self {
        Self {
            name,
            description,
            kind,
            required: true,
            default: None,
        }
    }

    pub fn optional(name: &'static str, description: &'static str, kind: ParamType) -> Self {
        Self {
            name,
            description,
            kind,
            required: false,
            default: None,
        }
    }

    pub fn with_default(mut self, default: impl Into<Value>) -> Self {
        self.default = Some(default.into());
        self
    }

    fn schema(&self) -> Value {
        let mut schema = Map::new();
        schema.insert("type".into(), json!(self.kind.type_name()));
        schema.insert("description".into(), json!(self.description));

        match &self.kind {
            ParamType::Number {
                min,
                max,
                exclusive_min,
            } => {
                if let Some(min) = min {
                    let key = if *exclusive_min {
                        "exclusiveMinimum"
                    } else {
                        "minimum"
                    };
                    schema.insert(key.into(), json!(min));
                }
                if let Some(max) = max {
                    schema.insert("maximum".into(), json!(max));
                }
            }
            ParamType::Text { max_len } => {
                if let Some(max_len) = max_len {
                    schema.insert("maxLength".into(), json!(max_len));
                }
            }
            ParamType::Category { allowed, .. } => {
                schema.insert("enum".into(), json!(allowed));
            }
            ParamType::NumberList { min } => {
                let mut items = json!({"type": "number"});
                if let Some(min) = min {
                    items["minimum"] = json!(min);
                }
                schema.insert("items".into(), items);
            }
            ParamType::Date => {
                schema.insert("format".into(), json!("date"));
            }
        }

        if let Some(default) = &self.default {
            schema.insert("default".into(), default.clone());
        }
        Value::Object(schema)
    }
}

/// Declared schema of a tool.
#[derive(Debug, Clone)]
pub struct ToolSpec {
    pub id: ToolId,
    pub description: &'static str,
    pub params: Vec<ParamSpec>,
}

impl ToolSpec {
    pub fn new(id: ToolId, description: &'static str, params: Vec<ParamSpec>) -> Self {
        Self {
            id,
            description,
            params,
        }
    }

    pub fn param(&self, name: &str) -> Option<&ParamSpec> {
        self.params.iter().find(|p| p.name == name)
    }

    /// JSON Schema of the parameter object.
    pub fn to_json_schema(&self) -> Value {
        let properties: Map<String, Value> = self
            .params
            .iter()
            .map(|p| (p.name.to_string(), p.schema()))
            .collect();
        let required: Vec<&str> = self
            .params
            .iter()
            .filter(|p| p.required)
            .map(|p| p.name)
            .collect();

        json!({
            "type": "object",
            "properties": properties,
            "required": required,
            "additionalProperties": false,
        })
    }

    /// Function-style definition: name, description and parameter schema.
    pub fn definition(&self) -> Value {
        json!({
            "name": self.id.name(),
            "description": self.description,
            "parameters": self.to_json_schema(),
        })
    }
}

/// Validate raw arguments against a tool's declared parameters.
pub fn validate(
    spec: &ToolSpec,
    args: &HashMap<String, Value>,
) -> Result<HashMap<String, Value>, ToolError> {
    let mut unknown: Vec<&String> = args.keys().filter(|k| spec.param(k).is_none()).collect();
    unknown.sort();
    if let Some(name) = unknown.first() {
        return Err(ToolError::UnexpectedParameter(name.to_string()));
    }

    let mut params = HashMap::with_capacity(spec.params.len());
    for param in &spec.params {
        match args.get(param.name).filter(|v| !v.is_null()) {
            Some(raw) => {
                params.insert(param.name.to_string(), coerce(param, raw)?);
            }
            None if param.required => {
                return Err(ToolError::MissingParameter(param.name.to_string()));
            }
            None => {
                if let Some(default) = &param.default {
                    params.insert(param.name.to_string(), default.clone());
                }
            }
        }
    }

    Ok(params)
}

fn coerce(param: &ParamSpec, raw: &Value) -> Result<Value, ToolError> {
    match &param.kind {
        ParamType::Number {
            min,
            max,
            exclusive_min,
        } => {
            let value = number(param.name, raw)?;
            check_bounds(param.name, value, *min, *max, *exclusive_min)?;
            Ok(json!(value))
        }
        ParamType::Text { max_len } => {
            let text = raw
                .as_str()
                .ok_or_else(|| ToolError::invalid(param.name, "expected string"))?;
            if let Some(max_len) = max_len {
                let len = text.chars().count();
                if len > *max_len {
                    return Err(ToolError::invalid(
                        param.name,
                        format!("text is {} characters, limit is {}", len, max_len),
                    ));
                }
            }
            Ok(json!(text))
        }
        ParamType::Category { allowed, normalize } => {
            let text = raw
                .as_str()
                .ok_or_else(|| ToolError::invalid(param.name, "expected string"))?;
            let canonical = normalize(text).ok_or_else(|| {
                ToolError::invalid(
                    param.name,
                    format!("unknown value '{}' (allowed: {})", text.trim(), allowed.join(", ")),
                )
            })?;
            Ok(json!(canonical))
        }
        ParamType::NumberList { min } => {
            let items = raw
                .as_array()
                .ok_or_else(|| ToolError::invalid(param.name, "expected array of numbers"))?;
            let values = items
                .iter()
                .map(|item| {
                    let value = number(param.name, item)?;
                    check_bounds(param.name, value, *min, None, false)?;
                    Ok(value)
                })
                .collect::<Result<Vec<f64>, ToolError>>()?;
            Ok(json!(values))
        }
        ParamType::Date => {
            let text = raw
                .as_str()
                .ok_or_else(|| ToolError::invalid(param.name, "expected YYYY-MM-DD string"))?;
            let date = NaiveDate::parse_from_str(text.trim(), DATE_FORMAT).map_err(|_| {
                ToolError::invalid(param.name, format!("'{}' is not a YYYY-MM-DD date", text))
            })?;
            Ok(json!(date.format(DATE_FORMAT).to_string()))
        }
    }
}

fn number(name: &str, raw: &Value) -> Result<f64, ToolError> {
    let value = match raw {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
    .ok_or_else(|| ToolError::invalid(name, format!("expected number, got {}", raw)))?;

    if !value.is_finite() {
        return Err(ToolError::invalid(name, "number must be finite"));
    }
    Ok(value)
}

fn check_bounds(
    name: &str,
    value: f64,
    min: Option<f64>,
    max: Option<f64>,
    exclusive_min: bool,
) -> Result<(), ToolError> {
    if let Some(min) = min {
        if value < min || (exclusive_min && value == min) {
            let op = if exclusive_min { ">" } else { ">=" };
            return Err(ToolError::invalid(
                name,
                format!("must be {} {}, got {}", op, min, value),
            ));
        }
    }
    if let Some(max) = max {
        if value > max {
            return Err(ToolError::invalid(
                name,
                format!("must be <= {}, got {}", max, value),
            ));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use delivery_model::{TrafficLevel, Weather};

    fn spec() -> ToolSpec {
        ToolSpec::new(
            ToolId::Predict,
            "test",
            vec![
                ParamSpec::required(
                    "distance_km",
                    "km",
                    ParamType::Number {
                        min: Some(0.0),
                        max: Some(100.0),
                        exclusive_min: true,
                    },
                ),
                ParamSpec::required("weather", "w", ParamType::category::<Weather>()),
                ParamSpec::optional("traffic_level", "t", ParamType::category::<TrafficLevel>())
                    .with_default("Medium"),
                ParamSpec::optional("date", "d", ParamType::Date),
                ParamSpec::optional("observations", "o", ParamType::NumberList { min: Some(0.0) }),
            ],
        )
    }

    fn args(value: Value) -> HashMap<String, Value> {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_coerces_and_normalizes() {
        let params = validate(
            &spec(),
            &args(json!({"distance_km": " 3.98 ", "weather": "rain"})),
        )
        .unwrap();

        assert_eq!(params["distance_km"], json!(3.98));
        assert_eq!(params["weather"], json!("Rainy"));
        assert_eq!(params["traffic_level"], json!("Medium"));
        assert!(!params.contains_key("date"));
    }

    #[test]
    fn test_default_never_replaces_invalid_value() {
        let err = validate(
            &spec(),
            &args(json!({"distance_km": 2, "weather": "Sunny", "traffic_level": "gridlock"})),
        )
        .unwrap_err();
        assert_eq!(err.field(), Some("traffic_level"));
    }

    #[test]
    fn test_null_counts_as_absent() {
        let params = validate(
            &spec(),
            &args(json!({"distance_km": 2, "weather": "Sunny", "traffic_level": null})),
        )
        .unwrap();
        assert_eq!(params["traffic_level"], json!("Medium"));
    }

    #[test]
    fn test_rejections() {
        let cases = [
            json!({"weather": "Sunny"}),
            json!({"distance_km": 0, "weather": "Sunny"}),
            json!({"distance_km": 101, "weather": "Sunny"}),
            json!({"distance_km": "NaN", "weather": "Sunny"}),
            json!({"distance_km": "far", "weather": "Sunny"}),
            json!({"distance_km": 2, "weather": "foggy"}),
            json!({"distance_km": 2, "weather": 3}),
            json!({"distance_km": 2, "weather": "Sunny", "date": "15.01.2026"}),
            json!({"distance_km": 2, "weather": "Sunny", "observations": [1, "x"]}),
            json!({"distance_km": 2, "weather": "Sunny", "observations": [-1]}),
            json!({"distance_km": 2, "weather": "Sunny", "speed": 3}),
        ];
        for case in cases {
            assert!(validate(&spec(), &args(case.clone())).is_err(), "{}", case);
        }
    }

    #[test]
    fn test_unexpected_parameter_is_named() {
        let err = validate(
            &spec(),
            &args(json!({"distance_km": 2, "weather": "Sunny", "speed": 3})),
        )
        .unwrap_err();
        assert!(matches!(err, ToolError::UnexpectedParameter(ref name) if name == "speed"));
    }

    #[test]
    fn test_date_and_list() {
        let params = validate(
            &spec(),
            &args(json!({
                "distance_km": 2,
                "weather": "Sunny",
                "date": "2026-01-15",
                "observations": [90, "85.5", 95]
            })),
        )
        .unwrap();
        assert_eq!(params["date"], json!("2026-01-15"));
        assert_eq!(params["observations"], json!([90.0, 85.5, 95.0]));
    }

    #[test]
    fn test_json_schema() {
        let schema = spec().to_json_schema();
        assert_eq!(schema["required"], json!(["distance_km", "weather"]));
        assert_eq!(
            schema["properties"]["weather"]["enum"],
            json!(["Sunny", "Cloudy", "Rainy", "Snow"])
        );
        assert_eq!(schema["properties"]["distance_km"]["exclusiveMinimum"], json!(0.0));
        assert_eq!(schema["properties"]["traffic_level"]["default"], json!("Medium"));
        assert_eq!(schema["additionalProperties"], json!(false));
    }
}
