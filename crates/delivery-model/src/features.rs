//! Feature vector and the closed category sets it is built from.
//!
//! Normalization rules live here and nowhere else: input is trimmed,
//! lowercased and whitespace-collapsed, then matched against the canonical
//! names plus a fixed alias table. There is no fuzzy matching and no
//! fallback category; anything else is rejected.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::FeatureError;

/// Upper bound of the model's operating range.
pub const MAX_DISTANCE_KM: f64 = 100.0;

/// A closed categorical feature.
pub trait Category: Sized + Copy + Eq + 'static {
    /// Field name used in schemas and error messages.
    const FIELD: &'static str;
    /// Every category, in model encoding order.
    const ALL: &'static [Self];

    /// Canonical name.
    fn as_str(&self) -> &'static str;

    /// Map cleaned input (see [`clean_input`]) onto a category.
    fn from_cleaned(cleaned: &str) -> Option<Self>;

    /// Normalize raw input onto a category.
    fn normalize(raw: &str) -> Option<Self> {
        Self::from_cleaned(&clean_input(raw))
    }

    /// Canonical names of every category.
    fn names() -> Vec<&'static str> {
        Self::ALL.iter().map(|c| c.as_str()).collect()
    }

    /// Parse raw input, rejecting anything outside the category set.
    fn parse(raw: &str) -> Result<Self, FeatureError> {
        Self::normalize(raw).ok_or_else(|| FeatureError::UnknownCategory {
            field: Self::FIELD,
            value: raw.trim().to_string(),
            allowed: Self::names().join(", "),
        })
    }
}

/// Normalize raw input to the canonical name of a category, if any.
pub fn canonical_name<C: Category>(raw: &str) -> Option<&'static str> {
    C::normalize(raw).map(|c| c.as_str())
}

fn clean_input(raw: &str) -> String {
    let cleaned: String = raw
        .trim()
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || c == ' ' {
                c.to_lowercase().next().unwrap_or(c)
            } else {
                ' '
            }
        })
        .collect();

    cleaned.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Delivery vehicle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VehicleType {
    Bike,
    Scooter,
    Van,
}

impl Category for VehicleType {
    const FIELD: &'static str = "vehicle_type";
    const ALL: &'static [Self] = &[Self::Bike, Self::Scooter, Self::Van];

    fn as_str(&self) -> &'static str {
        match self {
            Self::Bike => "Bike",
            Self::Scooter => "Scooter",
            Self::Van => "Van",
        }
    }

    fn from_cleaned(cleaned: &str) -> Option<Self> {
        match cleaned {
            "bike" | "bicycle" | "cycle" | "ebike" | "e bike" | "cargo bike" => Some(Self::Bike),
            "scooter" | "e scooter" | "escooter" | "moped" => Some(Self::Scooter),
            "van" | "delivery van" | "transporter" => Some(Self::Van),
            _ => None,
        }
    }
}

/// Weather condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Weather {
    Sunny,
    Cloudy,
    Rainy,
    Snow,
}

impl Category for Weather {
    const FIELD: &'static str = "weather";
    const ALL: &'static [Self] = &[Self::Sunny, Self::Cloudy, Self::Rainy, Self::Snow];

    fn as_str(&self) -> &'static str {
        match self {
            Self::Sunny => "Sunny",
            Self::Cloudy => "Cloudy",
            Self::Rainy => "Rainy",
            Self::Snow => "Snow",
        }
    }

    fn from_cleaned(cleaned: &str) -> Option<Self> {
        match cleaned {
            "sunny" | "sun" | "clear" => Some(Self::Sunny),
            "cloudy" | "cloud" | "clouds" | "overcast" => Some(Self::Cloudy),
            "rainy" | "rain" | "raining" | "drizzle" | "wet" => Some(Self::Rainy),
            "snow" | "snowy" | "snowing" => Some(Self::Snow),
            _ => None,
        }
    }
}

/// Traffic density.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TrafficLevel {
    Low,
    Medium,
    High,
}

impl Category for TrafficLevel {
    const FIELD: &'static str = "traffic_level";
    const ALL: &'static [Self] = &[Self::Low, Self::Medium, Self::High];

    fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "Low",
            Self::Medium => "Medium",
            Self::High => "High",
        }
    }

    fn from_cleaned(cleaned: &str) -> Option<Self> {
        match cleaned {
            "low" | "light" => Some(Self::Low),
            "medium" | "moderate" | "normal" => Some(Self::Medium),
            "high" | "heavy" | "rush hour" => Some(Self::High),
            _ => None,
        }
    }
}

/// Driver skill level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DriverExperience {
    Junior,
    Senior,
    Expert,
}

impl Category for DriverExperience {
    const FIELD: &'static str = "driver_experience";
    const ALL: &'static [Self] = &[Self::Junior, Self::Senior, Self::Expert];

    fn as_str(&self) -> &'static str {
        match self {
            Self::Junior => "Junior",
            Self::Senior => "Senior",
            Self::Expert => "Expert",
        }
    }

    fn from_cleaned(cleaned: &str) -> Option<Self> {
        match cleaned {
            "junior" | "beginner" | "novice" | "new" => Some(Self::Junior),
            "senior" | "experienced" => Some(Self::Senior),
            "expert" | "veteran" => Some(Self::Expert),
            _ => None,
        }
    }
}

macro_rules! impl_display {
    ($($ty:ty),*) => {
        $(impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        })*
    };
}

impl_display!(VehicleType, Weather, TrafficLevel, DriverExperience);

/// Names of the model's input features.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeatureName {
    DistanceKm,
    Weather,
    TrafficLevel,
    DriverExperience,
    VehicleType,
}

impl FeatureName {
    /// Every feature, in model column order.
    pub const ALL: [FeatureName; 5] = [
        FeatureName::DistanceKm,
        FeatureName::Weather,
        FeatureName::TrafficLevel,
        FeatureName::DriverExperience,
        FeatureName::VehicleType,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DistanceKm => "distance_km",
            Self::Weather => "weather",
            Self::TrafficLevel => "traffic_level",
            Self::DriverExperience => "driver_experience",
            Self::VehicleType => "vehicle_type",
        }
    }
}

impl fmt::Display for FeatureName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Validated input to the delivery-time model.
///
/// Construction always goes through [`FeatureVector::new`] (deserialization
/// included), so a value of this type is in-domain by construction.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawFeatureVector")]
pub struct FeatureVector {
    vehicle_type: VehicleType,
    weather: Weather,
    traffic_level: TrafficLevel,
    driver_experience: DriverExperience,
    distance_km: f64,
}

#[derive(Deserialize)]
struct RawFeatureVector {
    vehicle_type: VehicleType,
    weather: Weather,
    traffic_level: TrafficLevel,
    driver_experience: DriverExperience,
    distance_km: f64,
}

impl TryFrom<RawFeatureVector> for FeatureVector {
    type Error = FeatureError;

    fn try_from(raw: RawFeatureVector) -> Result<Self, Self::Error> {
        FeatureVector::new(
            raw.vehicle_type,
            raw.weather,
            raw.traffic_level,
            raw.driver_experience,
            raw.distance_km,
        )
    }
}

impl FeatureVector {
    /// Build a feature vector, rejecting an out-of-range distance.
    pub fn new(
        vehicle_type: VehicleType,
        weather: Weather,
        traffic_level: TrafficLevel,
        driver_experience: DriverExperience,
        distance_km: f64,
    ) -> Result<Self, FeatureError> {
        if !distance_km.is_finite() || distance_km <= 0.0 || distance_km > MAX_DISTANCE_KM {
            return Err(FeatureError::InvalidDistance {
                value: distance_km,
                max: MAX_DISTANCE_KM,
            });
        }

        Ok(Self {
            vehicle_type,
            weather,
            traffic_level,
            driver_experience,
            distance_km,
        })
    }

    /// Build a feature vector from raw strings, normalizing each category.
    pub fn parse(
        vehicle_type: &str,
        weather: &str,
        traffic_level: &str,
        driver_experience: &str,
        distance_km: f64,
    ) -> Result<Self, FeatureError> {
        Self::new(
            VehicleType::parse(vehicle_type)?,
            Weather::parse(weather)?,
            TrafficLevel::parse(traffic_level)?,
            DriverExperience::parse(driver_experience)?,
            distance_km,
        )
    }

    pub fn vehicle_type(&self) -> VehicleType {
        self.vehicle_type
    }

    pub fn weather(&self) -> Weather {
        self.weather
    }

    pub fn traffic_level(&self) -> TrafficLevel {
        self.traffic_level
    }

    pub fn driver_experience(&self) -> DriverExperience {
        self.driver_experience
    }

    pub fn distance_km(&self) -> f64 {
        self.distance_km
    }

    /// Take the features selected by `mask` (bit `i` = `FeatureName::ALL[i]`)
    /// from `self` and the rest from `other`.
    pub(crate) fn blend(&self, other: &FeatureVector, mask: usize) -> FeatureVector {
        let pick = |feature: FeatureName| {
            let index = FeatureName::ALL
                .iter()
                .position(|f| *f == feature)
                .unwrap_or(0);
            mask & (1 << index) != 0
        };

        FeatureVector {
            distance_km: if pick(FeatureName::DistanceKm) {
                self.distance_km
            } else {
                other.distance_km
            },
            weather: if pick(FeatureName::Weather) {
                self.weather
            } else {
                other.weather
            },
            traffic_level: if pick(FeatureName::TrafficLevel) {
                self.traffic_level
            } else {
                other.traffic_level
            },
            driver_experience: if pick(FeatureName::DriverExperience) {
                self.driver_experience
            } else {
                other.driver_experience
            },
            vehicle_type: if pick(FeatureName::VehicleType) {
                self.vehicle_type
            } else {
                other.vehicle_type
            },
        }
    }

    /// One-line description used in answers.
    pub fn describe(&self) -> String {
        format!(
            "{}, {} weather, {} traffic, {} driver, {:.2} km",
            self.vehicle_type,
            self.weather,
            self.traffic_level,
            self.driver_experience,
            self.distance_km
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonical_and_alias_names() {
        assert_eq!(VehicleType::normalize("Bike"), Some(VehicleType::Bike));
        assert_eq!(VehicleType::normalize("  bike "), Some(VehicleType::Bike));
        assert_eq!(VehicleType::normalize("BICYCLE"), Some(VehicleType::Bike));
        assert_eq!(VehicleType::normalize("e-scooter"), Some(VehicleType::Scooter));
        assert_eq!(Weather::normalize("Rain"), Some(Weather::Rainy));
        assert_eq!(Weather::normalize("snowy"), Some(Weather::Snow));
        assert_eq!(TrafficLevel::normalize("heavy"), Some(TrafficLevel::High));
        assert_eq!(TrafficLevel::normalize("Rush  Hour"), Some(TrafficLevel::High));
        assert_eq!(DriverExperience::normalize("new"), Some(DriverExperience::Junior));
    }

    #[test]
    fn test_unknown_category_is_rejected_not_defaulted() {
        assert_eq!(Weather::normalize("foggy"), None);
        // Substrings of canonical names are not matches.
        assert_eq!(Weather::normalize("sun shower"), None);
        assert_eq!(VehicleType::normalize("car"), None);

        let err = Weather::parse("foggy").unwrap_err();
        assert_eq!(err.field(), "weather");
        assert!(err.to_string().contains("Sunny, Cloudy, Rainy, Snow"));
    }

    #[test]
    fn test_canonical_name_helper() {
        assert_eq!(canonical_name::<TrafficLevel>("light"), Some("Low"));
        assert_eq!(canonical_name::<TrafficLevel>("gridlock"), None);
    }

    #[test]
    fn test_distance_domain() {
        let ok = FeatureVector::parse("Bike", "Sunny", "Low", "Senior", 3.5).unwrap();
        assert_eq!(ok.distance_km(), 3.5);

        for bad in [0.0, -1.0, f64::NAN, f64::INFINITY, MAX_DISTANCE_KM + 0.1] {
            let err = FeatureVector::parse("Bike", "Sunny", "Low", "Senior", bad).unwrap_err();
            assert_eq!(err.field(), "distance_km");
        }
    }

    #[test]
    fn test_deserialization_validates() {
        let json = r#"{"vehicle_type":"Van","weather":"Snow","traffic_level":"High",
                       "driver_experience":"Expert","distance_km":12.0}"#;
        let features: FeatureVector = serde_json::from_str(json).unwrap();
        assert_eq!(features.vehicle_type(), VehicleType::Van);

        let bad = r#"{"vehicle_type":"Van","weather":"Snow","traffic_level":"High",
                      "driver_experience":"Expert","distance_km":-2.0}"#;
        assert!(serde_json::from_str::<FeatureVector>(bad).is_err());

        let unknown = r#"{"vehicle_type":"Truck","weather":"Snow","traffic_level":"High",
                          "driver_experience":"Expert","distance_km":2.0}"#;
        assert!(serde_json::from_str::<FeatureVector>(unknown).is_err());
    }

    #[test]
    fn test_blend_takes_masked_features_from_self() {
        let a = FeatureVector::parse("Bike", "Rainy", "High", "Junior", 4.0).unwrap();
        let b = FeatureVector::parse("Van", "Sunny", "Low", "Expert", 9.0).unwrap();

        assert_eq!(a.blend(&b, 0), b);
        assert_eq!(a.blend(&b, 0b11111), a);

        let only_distance = a.blend(&b, 0b00001);
        assert_eq!(only_distance.distance_km(), 4.0);
        assert_eq!(only_distance.weather(), Weather::Sunny);
        assert_eq!(only_distance.vehicle_type(), VehicleType::Van);
    }
}
