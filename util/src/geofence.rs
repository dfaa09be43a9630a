//! Great-circle distance and radius checks for session check-ins.
//!
//! Everything here is pure: the same inputs always give the same result, and
//! invalid coordinates are rejected before any arithmetic happens.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Mean earth radius in metres.
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum GeofenceError {
    #[error("latitude must be a finite number between -90 and 90 (got {0})")]
    InvalidLatitude(f64),
    #[error("longitude must be a finite number between -180 and 180 (got {0})")]
    InvalidLongitude(f64),
    #[error("radius must be a finite, non-negative number of metres (got {0})")]
    InvalidRadius(f64),
}

/// A point on the earth's surface in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    /// Builds a validated coordinate pair.
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, GeofenceError> {
        let coords = Self {
            latitude,
            longitude,
        };
        coords.validate()?;
        Ok(coords)
    }

    pub fn validate(&self) -> Result<(), GeofenceError> {
        if !self.latitude.is_finite() || !(-90.0..=90.0).contains(&self.latitude) {
            return Err(GeofenceError::InvalidLatitude(self.latitude));
        }
        if !self.longitude.is_finite() || !(-180.0..=180.0).contains(&self.longitude) {
            return Err(GeofenceError::InvalidLongitude(self.longitude));
        }
        Ok(())
    }
}

/// Outcome of comparing a reported location against a session's geofence.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GeofenceCheck {
    pub within_radius: bool,
    pub distance_m: f64,
}

/// Haversine distance in metres between two points.
///
/// Inputs are assumed valid; use [`evaluate`] when they come from a client.
pub fn haversine_distance(a: &Coordinates, b: &Coordinates) -> f64 {
    let phi1 = a.latitude.to_radians();
    let phi2 = b.latitude.to_radians();
    let d_phi = (b.latitude - a.latitude).to_radians();
    let d_lambda = (b.longitude - a.longitude).to_radians();

    let h = (d_phi / 2.0).sin().powi(2)
        + phi1.cos() * phi2.cos() * (d_lambda / 2.0).sin().powi(2);
    // Rounding can push h a hair above 1 for antipodal points.
    let c = 2.0 * h.sqrt().min(1.0).asin();

    EARTH_RADIUS_M * c
}

/// Checks whether `point` lies within `radius_m` metres of `center`.
///
/// A point exactly on the boundary counts as inside.
pub fn evaluate(
    center: &Coordinates,
    point: &Coordinates,
    radius_m: f64,
) -> Result<GeofenceCheck, GeofenceError> {
    center.validate()?;
    point.validate()?;
    if !radius_m.is_finite() || radius_m < 0.0 {
        return Err(GeofenceError::InvalidRadius(radius_m));
    }

    let distance_m = haversine_distance(center, point);
    Ok(GeofenceCheck {
        within_radius: distance_m <= radius_m,
        distance_m,
    })
}
