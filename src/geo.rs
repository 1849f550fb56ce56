use serde::{Deserialize, Serialize};

pub const EARTH_RADIUS_KM: f64 = 6371.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
}

impl GeoPoint {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    pub fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lon.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lon)
    }
}

pub fn haversine_km(a: GeoPoint, b: GeoPoint) -> f64 {
    let lat_diff = (b.lat - a.lat).to_radians();
    let lon_diff = (b.lon - a.lon).to_radians();

    let h = (lat_diff / 2.0).sin().powi(2)
        + a.lat.to_radians().cos() * b.lat.to_radians().cos() * (lon_diff / 2.0).sin().powi(2);
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());

    EARTH_RADIUS_KM * c
}

pub fn resolve_distance(viewer: Option<GeoPoint>, origin: Option<GeoPoint>) -> Option<f64> {
    match (viewer, origin) {
        (Some(viewer), Some(origin)) if viewer.is_valid() && origin.is_valid() => {
            Some(haversine_km(viewer, origin))
        }
        _ => None,
    }
}
