//! Routing plan and action types for orchestration.

use brain_core::ToolId;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A GPS point as written in the query.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lon: f64,
}

impl Coordinates {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }
}

/// The routing plan for one query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct RoutingPlan {
    /// Ordered list of actions to execute.
    pub actions: Vec<PlanAction>,
}

impl RoutingPlan {
    /// Create a new routing plan with the given actions.
    pub fn new(actions: Vec<PlanAction>) -> Self {
        Self { actions }
    }

    /// Parse a plan from its JSON form.
    pub fn from_json(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }

    /// Check if the plan is empty.
    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    /// Check if the plan contains an action for a tool.
    pub fn has(&self, tool: ToolId) -> bool {
        self.position(tool).is_some()
    }

    /// Index of the first action for a tool.
    pub fn position(&self, tool: ToolId) -> Option<usize> {
        self.actions.iter().position(|a| a.tool() == tool)
    }

    /// Tools in plan order.
    pub fn tools(&self) -> Vec<ToolId> {
        self.actions.iter().map(PlanAction::tool).collect()
    }
}

/// Individual action in the routing plan.
///
/// Slots the query did not provide stay `None`; the call is still made and
/// the validator reports what is missing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PlanAction {
    /// Distance between two points.
    Distance {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        from: Option<Coordinates>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        to: Option<Coordinates>,
    },

    /// District lookup for one point.
    Zone {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        point: Option<Coordinates>,
    },

    /// Weather lookup for a date.
    Weather {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        date: Option<String>,
    },

    /// Delivery-time prediction. Missing distance and weather are taken from
    /// earlier distance and weather results.
    Predict {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        vehicle_type: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        weather: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        distance_km: Option<f64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        traffic_level: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        driver_experience: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        date: Option<String>,
    },

    /// Attribution of the latest prediction.
    Explain,

    /// Drift check of recent durations.
    Drift {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        observations: Option<Vec<Value>>,
    },

    /// PII redaction of a piece of text.
    Mask { text: String },
}

impl PlanAction {
    /// The tool this action is executed with.
    pub fn tool(&self) -> ToolId {
        match self {
            Self::Distance { .. } => ToolId::Distance,
            Self::Zone { .. } => ToolId::Zone,
            Self::Weather { .. } => ToolId::Weather,
            Self::Predict { .. } => ToolId::Predict,
            Self::Explain => ToolId::Explain,
            Self::Drift { .. } => ToolId::Drift,
            Self::Mask { .. } => ToolId::Mask,
        }
    }

    /// Get a description of this action for logging.
    pub fn description(&self) -> String {
        match self {
            Self::Distance { .. } => "compute the delivery distance".to_string(),
            Self::Zone { point: Some(p) } => {
                format!("look up the district of ({:.4}, {:.4})", p.lat, p.lon)
            }
            Self::Zone { point: None } => "look up the district".to_string(),
            Self::Weather { date: Some(date) } => format!("look up the weather for {}", date),
            Self::Weather { date: None } => "look up the weather".to_string(),
            Self::Predict { .. } => "predict the delivery time".to_string(),
            Self::Explain => "explain the prediction".to_string(),
            Self::Drift { .. } => "check for data drift".to_string(),
            Self::Mask { .. } => "anonymize the text".to_string(),
        }
    }
}
