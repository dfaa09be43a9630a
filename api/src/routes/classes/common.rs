use db::models::attendance_session::SessionLocation;
use db::models::class::Model as ClassModel;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::ApiError;

#[derive(Debug, Deserialize)]
pub struct ClassListQuery {
    pub archived: Option<bool>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateClassRequest {
    #[validate(length(
        min = 1,
        max = 100,
        message = "Class name must be between 1 and 100 characters"
    ))]
    pub name: String,

    #[validate(length(max = 100, message = "Subject must be at most 100 characters"))]
    pub subject: Option<String>,

    #[validate(length(max = 50, message = "Room must be at most 50 characters"))]
    pub room: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct EditClassRequest {
    #[validate(length(max = 100, message = "Class name must be at most 100 characters"))]
    pub name: Option<String>,

    #[validate(length(max = 100, message = "Subject must be at most 100 characters"))]
    pub subject: Option<String>,

    #[validate(length(max = 50, message = "Room must be at most 50 characters"))]
    pub room: Option<String>,
}

/// Class with its current enrollment count.
#[derive(Debug, Serialize)]
pub struct ClassResponse {
    #[serde(flatten)]
    pub class: ClassModel,
    pub student_count: usize,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateSessionRequest {
    #[validate(length(max = 200, message = "Title must be at most 200 characters"))]
    pub title: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub radius_m: Option<f64>,
    #[serde(default)]
    pub start_now: bool,
}

/// Builds a geofence from optional coordinates. Both coordinates or neither.
pub fn location_from_parts(
    latitude: Option<f64>,
    longitude: Option<f64>,
    radius_m: Option<f64>,
) -> Result<Option<SessionLocation>, ApiError> {
    match (latitude, longitude) {
        (Some(latitude), Some(longitude)) => Ok(Some(SessionLocation {
            latitude,
            longitude,
            radius_m,
        })),
        (None, None) if radius_m.is_none() => Ok(None),
        _ => Err(ApiError::BadRequest(
            "Latitude and longitude must be provided together".into(),
        )),
    }
}
