//! Great-circle distance and Berlin district lookup.

/// Mean Earth radius in km.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Points farther than this from every district centre are outside the
/// service area.
pub const SERVICE_RADIUS_KM: f64 = 6.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct District {
    pub name: &'static str,
    pub lat: f64,
    pub lon: f64,
}

impl District {
    const fn new(name: &'static str, lat: f64, lon: f64) -> Self {
        Self { name, lat, lon }
    }
}

pub const BERLIN_DISTRICTS: [District; 12] = [
    District::new("Mitte", 52.5200, 13.4050),
    District::new("Kreuzberg", 52.4981, 13.3918),
    District::new("Prenzlauer Berg", 52.5423, 13.4140),
    District::new("Charlottenburg", 52.5167, 13.3000),
    District::new("Schöneberg", 52.4822, 13.3571),
    District::new("Friedrichshain", 52.5117, 13.4333),
    District::new("Neukölln", 52.4800, 13.4333),
    District::new("Pankow", 52.5667, 13.4000),
    District::new("Lichtenberg", 52.5333, 13.5000),
    District::new("Spandau", 52.5333, 13.1975),
    District::new("Tempelhof", 52.4667, 13.3833),
    District::new("Steglitz", 52.4492, 13.3217),
];

/// Haversine distance in km.
pub fn haversine_km(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let phi1 = lat1.to_radians();
    let phi2 = lat2.to_radians();
    let dphi = (lat2 - lat1).to_radians();
    let dlambda = (lon2 - lon1).to_radians();

    let a = (dphi / 2.0).sin().powi(2) + phi1.cos() * phi2.cos() * (dlambda / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());
    EARTH_RADIUS_KM * c
}

/// Round to two decimals.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Nearest district centre and the distance to it.
pub fn nearest_district(lat: f64, lon: f64) -> (&'static District, f64) {
    BERLIN_DISTRICTS
        .iter()
        .map(|d| (d, haversine_km(lat, lon, d.lat, d.lon)))
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .unwrap_or((&BERLIN_DISTRICTS[0], f64::INFINITY))
}
