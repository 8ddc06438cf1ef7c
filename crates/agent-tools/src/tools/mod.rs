//! Built-in tool implementations.

mod distance;
mod drift;
mod explain;
mod mask;
mod predict;
mod weather;
mod zone;

pub use distance::DeliveryDistance;
pub use drift::DataDrift;
pub use explain::ExplainPrediction;
pub use mask::AnonymizePii;
pub use predict::{PredictDeliveryTime, DEFAULT_EXPERIENCE, DEFAULT_TRAFFIC};
pub use weather::{simulated_weather, WeatherRisk};
pub use zone::ZoneLookup;
