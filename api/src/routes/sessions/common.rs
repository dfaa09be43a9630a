use db::error::DomainError;
use db::models::attendance_record::AttendanceStatus;
use db::models::attendance_session::SessionStatus;
use serde::{Deserialize, Serialize};
use util::geofence::Coordinates;

use crate::error::ApiError;

#[derive(Debug, Deserialize, Default)]
pub struct SessionListQuery {
    /// A session status, or `all` for no filter.
    pub status: Option<String>,
    pub class_id: Option<i64>,
}

impl SessionListQuery {
    pub fn status(&self) -> Result<Option<SessionStatus>, ApiError> {
        match self.status.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some(s) if s.eq_ignore_ascii_case("all") => Ok(None),
            Some(s) => s
                .parse::<SessionStatus>()
                .map(Some)
                .map_err(|_| ApiError::BadRequest(format!("Unknown session status '{s}'"))),
        }
    }
}

#[derive(Debug, Deserialize, Default)]
pub struct LocationRequest {
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub radius_m: Option<f64>,
}

#[derive(Debug, Deserialize, Default)]
pub struct CheckInRequest {
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

impl CheckInRequest {
    pub fn coordinates(&self) -> Result<Option<Coordinates>, ApiError> {
        match (self.latitude, self.longitude) {
            (Some(latitude), Some(longitude)) => Coordinates::new(latitude, longitude)
                .map(Some)
                .map_err(|e| ApiError::from(DomainError::from(e))),
            (None, None) => Ok(None),
            _ => Err(ApiError::BadRequest(
                "Latitude and longitude must be provided together".into(),
            )),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct MarkAttendanceRequest {
    pub status: String,
}

impl MarkAttendanceRequest {
    pub fn status(&self) -> Result<AttendanceStatus, ApiError> {
        self.status
            .parse::<AttendanceStatus>()
            .map_err(|_| {
                ApiError::BadRequest(format!("Unknown attendance status '{}'", self.status))
            })
    }
}

#[derive(Debug, Serialize, Default)]
pub struct ToggleResponse {
    pub session_id: i64,
    pub student_id: i64,
    pub present: bool,
}
