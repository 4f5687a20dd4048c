//! Geographic coordinates.

use serde::{Deserialize, Serialize};

/// A geographic coordinate in degrees, stored `(latitude, longitude)`.
///
/// This is the axis order used by the capture and rendering side. GeoJSON
/// uses the inverse order; conversions live in [`crate::geometry`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    /// Latitude in degrees, `[-90, 90]`
    pub lat: f64,
    /// Longitude in degrees, wrapped into `[-180, 180]` where it enters the model
    pub lng: f64,
}

impl LatLng {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Build a coordinate from raw event values, rejecting anything that
    /// cannot be a point on the globe.
    ///
    /// Longitude is wrapped, latitude outside `[-90, 90]` is rejected.
    pub fn checked(lat: f64, lng: f64) -> Option<Self> {
        if !lat.is_finite() || !lng.is_finite() || !(-90.0..=90.0).contains(&lat) {
            return None;
        }
        Some(Self::new(lat, lng).wrap())
    }

    /// Both components are finite numbers.
    pub fn is_finite(&self) -> bool {
        self.lat.is_finite() && self.lng.is_finite()
    }

    /// Normalize longitude into `[-180, 180]` without moving the point.
    ///
    /// `180` itself is kept, everything else lands in `[-180, 180)`.
    pub fn wrap(self) -> Self {
        Self {
            lat: self.lat,
            lng: wrap_longitude(self.lng),
        }
    }
}

/// Map any longitude onto `[-180, 180]`, e.g. `190 -> -170`.
pub fn wrap_longitude(lng: f64) -> f64 {
    if lng == 180.0 {
        return lng;
    }
    (lng + 180.0).rem_euclid(360.0) - 180.0
}

impl From<(f64, f64)> for LatLng {
    fn from((lat, lng): (f64, f64)) -> Self {
        Self::new(lat, lng)
    }
}
