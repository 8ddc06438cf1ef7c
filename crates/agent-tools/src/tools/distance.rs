//! Haversine distance between two GPS points.

use async_trait::async_trait;
use brain_core::ToolId;
use serde_json::json;

use crate::error::ToolError;
use crate::geo::{haversine_km, round2};
use crate::spec::{ParamSpec, ParamType, ToolSpec};
use crate::tool::{Tool, ToolArgs, ToolOutput};

/// Great-circle distance in km between two points, rounded to 2 decimals.
///
/// # Parameters
///
/// - `lat1`, `lon1` (required): Pickup point.
/// - `lat2`, `lon2` (required): Drop-off point.
pub struct DeliveryDistance {
    spec: ToolSpec,
}

impl DeliveryDistance {
    pub fn new() -> Self {
        let lat = || ParamType::range(-90.0, 90.0);
        let lon = || ParamType::range(-180.0, 180.0);
        Self {
            spec: ToolSpec::new(
                ToolId::Distance,
                "Calculates the Haversine distance (in km) between two GPS points. \
                 Useful for estimating delivery travel time.",
                vec![
                    ParamSpec::required("lat1", "Latitude of the start point", lat()),
                    ParamSpec::required("lon1", "Longitude of the start point", lon()),
                    ParamSpec::required("lat2", "Latitude of the destination", lat()),
                    ParamSpec::required("lon2", "Longitude of the destination", lon()),
                ],
            ),
        }
    }
}

impl Default for DeliveryDistance {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Tool for DeliveryDistance {
    fn id(&self) -> ToolId {
        ToolId::Distance
    }

    fn spec(&self) -> &ToolSpec {
        &self.spec
    }

    async fn execute(&self, args: ToolArgs) -> Result<ToolOutput, ToolError> {
        let distance = round2(haversine_km(
            args.get_f64("lat1")?,
            args.get_f64("lon1")?,
            args.get_f64("lat2")?,
            args.get_f64("lon2")?,
        ));

        Ok(ToolOutput::new(
            format!("Distance: {:.2} km", distance),
            json!({ "distance_km": distance }),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ToolRegistry;

    #[tokio::test]
    async fn test_distance_between_districts() {
        let mut registry = ToolRegistry::new();
        registry.register(DeliveryDistance::new());

        let output = registry
            .execute_json(
                ToolId::Distance,
                r#"{"lat1": 52.5200, "lon1": 13.4050, "lat2": "52.4981", "lon2": 13.3918}"#,
            )
            .await
            .unwrap();
        assert_eq!(output.data["distance_km"], json!(2.59));
        assert_eq!(output.content, "Distance: 2.59 km");
    }

    #[tokio::test]
    async fn test_out_of_range_latitude() {
        let mut registry = ToolRegistry::new();
        registry.register(DeliveryDistance::new());

        let result = registry
            .execute_json(
                ToolId::Distance,
                r#"{"lat1": 152.5, "lon1": 13.4, "lat2": 52.4, "lon2": 13.3}"#,
            )
            .await;
        assert!(matches!(result, Err(ToolError::Validation { ref name, .. }) if name == "lat1"));
    }
}
