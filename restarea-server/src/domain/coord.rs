//! Geographic coordinates.

use serde::{Deserialize, Serialize};

/// A WGS84 point in decimal degrees.
///
/// Route polylines and catalog entries both use this type. A value can be
/// constructed from any pair of floats; use [`Coordinate::is_valid`] before
/// trusting it in distance computations.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinate {
    /// Create a new coordinate.
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Check that the coordinate is a usable location.
    ///
    /// Both components must be finite and in range. `(0, 0)` is rejected
    /// because upstream feeds use it as a placeholder for "no location".
    pub fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lng.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lng)
            && !(self.lat == 0.0 && self.lng == 0.0)
    }
}
