//! Read-only attendance views for teachers and students.
//!
//! Sessions that never ran (`scheduled` or `cancelled`) are left out of class
//! statistics and student histories. Counts only consider students who are
//! currently enrolled.

use chrono::{DateTime, Utc};
use sea_orm::{ColumnTrait, DbConn, EntityTrait, QueryFilter, QueryOrder};
use serde::Serialize;
use std::collections::{HashMap, HashSet};

use crate::error::DomainResult;
use crate::models::attendance_record::{self, AttendanceStatus};
use crate::models::attendance_session::{self, SessionStatus};
use crate::models::{class, class_student, user_class};

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StatusCounts {
    /// Enrolled students with any record.
    pub attendance_count: u64,
    pub verified: u64,
    pub checked_in: u64,
    pub failed_location: u64,
    pub failed_other: u64,
    pub checked_out_early: u64,
    /// Enrolled students without a record.
    pub absent: u64,
}

impl StatusCounts {
    fn record(&mut self, status: AttendanceStatus) {
        self.attendance_count += 1;
        match status {
            AttendanceStatus::Verified => self.verified += 1,
            AttendanceStatus::CheckedIn => self.checked_in += 1,
            AttendanceStatus::FailedLocation => self.failed_location += 1,
            AttendanceStatus::FailedOther => self.failed_other += 1,
            AttendanceStatus::CheckedOutEarly => self.checked_out_early += 1,
            // Never stored on a record.
            AttendanceStatus::Pending | AttendanceStatus::Absent => {}
        }
    }

    fn add(&mut self, other: &StatusCounts) {
        self.attendance_count += other.attendance_count;
        self.verified += other.verified;
        self.checked_in += other.checked_in;
        self.failed_location += other.failed_location;
        self.failed_other += other.failed_other;
        self.checked_out_early += other.checked_out_early;
        self.absent += other.absent;
    }
}

/// Percentage rounded to two decimals; zero when there is nothing to divide by.
pub fn attendance_rate(attended: u64, possible: u64) -> f64 {
    if possible == 0 {
        return 0.0;
    }
    let rate = attended as f64 / possible as f64 * 100.0;
    (rate * 100.0).round() / 100.0
}

#[derive(Debug, Clone, Serialize)]
pub struct RosterEntry {
    pub student_id: i64,
    pub student_name: String,
    pub status: AttendanceStatus,
    pub check_in_time: Option<DateTime<Utc>>,
    pub check_out_time: Option<DateTime<Utc>>,
    pub distance_m: Option<f64>,
    pub is_gps_verified: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct SessionRoster {
    pub session: attendance_session::Model,
    pub counts: StatusCounts,
    pub students: Vec<RosterEntry>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SessionSummary {
    pub session_id: i64,
    pub title: String,
    pub status: SessionStatus,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    #[serde(flatten)]
    pub counts: StatusCounts,
    pub attendance_rate: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct ClassAttendanceReport {
    pub class_id: i64,
    pub total_sessions: usize,
    pub enrolled_student_count: u64,
    pub overall_attendance_rate: f64,
    pub totals: StatusCounts,
    pub sessions: Vec<SessionSummary>,
}

#[derive(Debug, Clone, Serialize)]
pub struct StudentAttendanceEntry {
    pub session_id: i64,
    pub class_id: i64,
    pub class_name: String,
    pub session_title: String,
    pub session_status: SessionStatus,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub status: AttendanceStatus,
    pub check_in_time: Option<DateTime<Utc>>,
    pub check_out_time: Option<DateTime<Utc>>,
    pub distance_m: Option<f64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ActiveSessionView {
    #[serde(flatten)]
    pub session: attendance_session::Model,
    pub class_name: String,
    /// The student's own record, if they have checked in.
    pub attendance_status: Option<AttendanceStatus>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TeacherSessionView {
    #[serde(flatten)]
    pub session: attendance_session::Model,
    pub class_name: String,
    /// Records on the session, whatever their status.
    pub attendance_count: u64,
}

/// Session states that count towards statistics.
const RAN: [SessionStatus; 2] = [SessionStatus::Active, SessionStatus::Ended];

/// Every enrolled student with their status for one session. Students
/// without a record are listed as `absent`.
pub async fn session_roster(
    db: &DbConn,
    teacher_id: i64,
    session_id: i64,
) -> DomainResult<SessionRoster> {
    let session = attendance_session::Model::get_owned(db, session_id, teacher_id).await?;
    let enrolled = class_student::Model::list_for_class(db, session.class_id).await?;
    let mut records: HashMap<i64, attendance_record::Model> =
        attendance_record::Model::list_for_session(db, session_id)
            .await?
            .into_iter()
            .map(|r| (r.student_id, r))
            .collect();

    let mut counts = StatusCounts::default();
    let students = enrolled
        .into_iter()
        .map(|student| match records.remove(&student.student_id) {
            Some(record) => {
                counts.record(record.status);
                RosterEntry {
                    student_id: student.student_id,
                    student_name: student.student_name,
                    status: record.status,
                    check_in_time: record.check_in_time,
                    check_out_time: record.check_out_time,
                    distance_m: record.distance_m,
                    is_gps_verified: record.is_gps_verified,
                }
            }
            None => {
                counts.absent += 1;
                RosterEntry {
                    student_id: student.student_id,
                    student_name: student.student_name,
                    status: AttendanceStatus::Absent,
                    check_in_time: None,
                    check_out_time: None,
                    distance_m: None,
                    is_gps_verified: false,
                }
            }
        })
        .collect();

    Ok(SessionRoster {
        session,
        counts,
        students,
    })
}

/// Per-session statistics for an owned class, most recent first.
pub async fn class_attendance(
    db: &DbConn,
    teacher_id: i64,
    class_id: i64,
) -> DomainResult<ClassAttendanceReport> {
    class::Model::get_owned(db, class_id, teacher_id).await?;

    let enrolled: HashSet<i64> = class_student::Model::list_for_class(db, class_id)
        .await?
        .into_iter()
        .map(|s| s.student_id)
        .collect();
    let enrolled_count = enrolled.len() as u64;

    let sessions = attendance_session::Entity::find()
        .filter(attendance_session::Column::ClassId.eq(class_id))
        .filter(attendance_session::Column::Status.is_in(RAN))
        .order_by_desc(attendance_session::Column::StartTime)
        .all(db)
        .await?;

    let mut by_session: HashMap<i64, Vec<attendance_record::Model>> = HashMap::new();
    for record in attendance_record::Entity::find()
        .filter(attendance_record::Column::ClassId.eq(class_id))
        .all(db)
        .await?
    {
        if enrolled.contains(&record.student_id) {
            by_session.entry(record.session_id).or_default().push(record);
        }
    }

    let mut totals = StatusCounts::default();
    let summaries: Vec<SessionSummary> = sessions
        .into_iter()
        .map(|session| {
            let mut counts = StatusCounts::default();
            for record in by_session.get(&session.id).into_iter().flatten() {
                counts.record(record.status);
            }
            counts.absent = enrolled_count.saturating_sub(counts.attendance_count);
            totals.add(&counts);

            SessionSummary {
                session_id: session.id,
                title: session.title,
                status: session.status,
                start_time: session.start_time,
                end_time: session.end_time,
                attendance_rate: attendance_rate(counts.attendance_count, enrolled_count),
                counts,
            }
        })
        .collect();

    let possible = enrolled_count * summaries.len() as u64;
    Ok(ClassAttendanceReport {
        class_id,
        total_sessions: summaries.len(),
        enrolled_student_count: enrolled_count,
        overall_attendance_rate: attendance_rate(totals.attendance_count, possible),
        totals,
        sessions: summaries,
    })
}

/// A student's attendance across the classes they are enrolled in,
/// most recent session first. Sessions without a record show as `absent`.
pub async fn student_history(
    db: &DbConn,
    student_id: i64,
    class_id: Option<i64>,
) -> DomainResult<Vec<StudentAttendanceEntry>> {
    let class_names: HashMap<i64, String> = user_class::Model::list_for_user(db, student_id)
        .await?
        .into_iter()
        .filter(|c| class_id.is_none_or(|id| id == c.class_id))
        .map(|c| (c.class_id, c.class_name))
        .collect();
    if class_names.is_empty() {
        return Ok(Vec::new());
    }

    let sessions = attendance_session::Entity::find()
        .filter(attendance_session::Column::ClassId.is_in(class_names.keys().copied()))
        .filter(attendance_session::Column::Status.is_in(RAN))
        .order_by_desc(attendance_session::Column::StartTime)
        .order_by_desc(attendance_session::Column::Id)
        .all(db)
        .await?;

    let mut records: HashMap<i64, attendance_record::Model> =
        attendance_record::Model::list_for_student(db, student_id, class_id)
            .await?
            .into_iter()
            .map(|r| (r.session_id, r))
            .collect();

    Ok(sessions
        .into_iter()
        .map(|session| {
            let record = records.remove(&session.id);
            StudentAttendanceEntry {
                session_id: session.id,
                class_id: session.class_id,
                class_name: class_names
                    .get(&session.class_id)
                    .cloned()
                    .unwrap_or_default(),
                session_title: session.title,
                session_status: session.status,
                start_time: session.start_time,
                end_time: session.end_time,
                status: record
                    .as_ref()
                    .map_or(AttendanceStatus::Absent, |r| r.status),
                check_in_time: record.as_ref().and_then(|r| r.check_in_time),
                check_out_time: record.as_ref().and_then(|r| r.check_out_time),
                distance_m: record.as_ref().and_then(|r| r.distance_m),
            }
        })
        .collect())
}

/// Active sessions the student can check in to, with their own status.
pub async fn active_sessions_for_student(
    db: &DbConn,
    student_id: i64,
) -> DomainResult<Vec<ActiveSessionView>> {
    let sessions = attendance_session::Model::active_for_student(db, student_id).await?;
    let class_names: HashMap<i64, String> = user_class::Model::list_for_user(db, student_id)
        .await?
        .into_iter()
        .map(|c| (c.class_id, c.class_name))
        .collect();

    let mut views = Vec::with_capacity(sessions.len());
    for session in sessions {
        let attendance_status = attendance_record::Model::find(db, session.id, student_id)
            .await?
            .map(|r| r.status);
        views.push(ActiveSessionView {
            class_name: class_names
                .get(&session.class_id)
                .cloned()
                .unwrap_or_default(),
            attendance_status,
            session,
        });
    }
    Ok(views)
}

/// A teacher's sessions across all their classes, most recently started
/// first, each with its class name and number of attendance records.
pub async fn teacher_sessions(
    db: &DbConn,
    teacher_id: i64,
    status: Option<SessionStatus>,
    class_id: Option<i64>,
) -> DomainResult<Vec<TeacherSessionView>> {
    let sessions =
        attendance_session::Model::list_for_teacher(db, teacher_id, status, class_id).await?;
    if sessions.is_empty() {
        return Ok(Vec::new());
    }

    let class_names: HashMap<i64, String> =
        class::Model::list_for_teacher(db, teacher_id, None)
            .await?
            .into_iter()
            .map(|c| (c.id, c.name))
            .collect();

    let mut counts: HashMap<i64, u64> = HashMap::new();
    let records = attendance_record::Entity::find()
        .filter(attendance_record::Column::SessionId.is_in(sessions.iter().map(|s| s.id)))
        .all(db)
        .await?;
    for record in records {
        *counts.entry(record.session_id).or_default() += 1;
    }

    Ok(sessions
        .into_iter()
        .map(|session| TeacherSessionView {
            class_name: class_names
                .get(&session.class_id)
                .cloned()
                .unwrap_or_else(|| "Unknown Class".to_owned()),
            attendance_count: counts.get(&session.id).copied().unwrap_or(0),
            session,
        })
        .collect())
}
