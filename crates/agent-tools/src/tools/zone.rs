//! Berlin district lookup.

use async_trait::async_trait;
use brain_core::ToolId;
use serde_json::json;

use crate::error::ToolError;
use crate::geo::{nearest_district, round2, SERVICE_RADIUS_KM};
use crate::spec::{ParamSpec, ParamType, ToolSpec};
use crate::tool::{Tool, ToolArgs, ToolOutput};

/// Classifies a GPS point into the nearest Berlin district.
///
/// A point farther than [`SERVICE_RADIUS_KM`] from every district centre is
/// reported as outside the service area (`zone: null`), which is a result,
/// not an error.
pub struct ZoneLookup {
    spec: ToolSpec,
}

impl ZoneLookup {
    pub fn new() -> Self {
        Self {
            spec: ToolSpec::new(
                ToolId::Zone,
                "Identifies the Berlin district (delivery zone) of a GPS point.",
                vec![
                    ParamSpec::required("lat", "Latitude", ParamType::range(-90.0, 90.0)),
                    ParamSpec::required("lon", "Longitude", ParamType::range(-180.0, 180.0)),
                ],
            ),
        }
    }
}

impl Default for ZoneLookup {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Tool for ZoneLookup {
    fn id(&self) -> ToolId {
        ToolId::Zone
    }

    fn spec(&self) -> &ToolSpec {
        &self.spec
    }

    async fn execute(&self, args: ToolArgs) -> Result<ToolOutput, ToolError> {
        let lat = args.get_f64("lat")?;
        let lon = args.get_f64("lon")?;
        let (district, distance) = nearest_district(lat, lon);
        let distance = round2(distance);

        if distance > SERVICE_RADIUS_KM {
            return Ok(ToolOutput::new(
                format!(
                    "({:.4}, {:.4}) is outside the Berlin service area (nearest district: {}, {:.2} km away)",
                    lat, lon, district.name, distance
                ),
                json!({
                    "zone": null,
                    "in_service_area": false,
                    "nearest_district": district.name,
                    "distance_to_centre_km": distance,
                }),
            ));
        }

        Ok(ToolOutput::new(
            format!("({:.4}, {:.4}) is in {}", lat, lon, district.name),
            json!({
                "zone": district.name,
                "in_service_area": true,
                "nearest_district": district.name,
                "distance_to_centre_km": distance,
            }),
        ))
    }
}
