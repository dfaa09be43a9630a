use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use sea_orm::{QueryFilter, QueryOrder, Set, SqlErr, TransactionTrait};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use util::geofence::{self, Coordinates};

use crate::batch::{WriteBatch, WriteOp};
use crate::error::{DomainError, DomainResult};
use crate::models::{attendance_session, class_student, user_class};

/// One student's attendance for one session.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "attendance_records")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub session_id: i64,
    #[sea_orm(primary_key, auto_increment = false)]
    pub student_id: i64,

    pub class_id: i64,
    pub status: AttendanceStatus,
    pub check_in_time: Option<DateTime<Utc>>,
    pub check_out_time: Option<DateTime<Utc>>,
    pub check_in_latitude: Option<f64>,
    pub check_in_longitude: Option<f64>,
    /// Metres from the session centre at check-in.
    pub distance_m: Option<f64>,
    pub is_gps_verified: bool,
    /// Teacher who last changed the record by hand.
    pub updated_by: Option<i64>,
    pub last_updated: DateTime<Utc>,
}

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    EnumIter,
    DeriveActiveEnum,
    Display,
    EnumString,
    Serialize,
    Deserialize,
)]
#[serde(rename_all = "snake_case")]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "attendance_status_type")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum AttendanceStatus {
    #[sea_orm(string_value = "pending")]
    Pending,

    #[sea_orm(string_value = "checked_in")]
    CheckedIn,

    #[sea_orm(string_value = "verified")]
    Verified,

    #[sea_orm(string_value = "failed_location")]
    FailedLocation,

    #[sea_orm(string_value = "failed_other")]
    FailedOther,

    #[sea_orm(string_value = "absent")]
    Absent,

    #[sea_orm(string_value = "checked_out_early")]
    CheckedOutEarly,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::attendance_session::Entity",
        from = "Column::SessionId",
        to = "super::attendance_session::Column::Id"
    )]
    Session,
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::StudentId",
        to = "super::user::Column::Id"
    )]
    Student,
}

impl Related<super::attendance_session::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Session.def()
    }
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Student.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

fn already_checked_in(err: DbErr) -> DomainError {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => {
            DomainError::Conflict("You have already checked in to this session".into())
        }
        _ => DomainError::Database(err),
    }
}

impl Model {
    pub async fn find(
        db: &DbConn,
        session_id: i64,
        student_id: i64,
    ) -> Result<Option<Model>, DbErr> {
        Entity::find_by_id((session_id, student_id)).one(db).await
    }

    pub async fn list_for_session(db: &DbConn, session_id: i64) -> Result<Vec<Model>, DbErr> {
        Entity::find()
            .filter(Column::SessionId.eq(session_id))
            .all(db)
            .await
    }

    /// A student's records, newest first, optionally limited to one class.
    pub async fn list_for_student(
        db: &DbConn,
        student_id: i64,
        class_id: Option<i64>,
    ) -> Result<Vec<Model>, DbErr> {
        let mut query = Entity::find().filter(Column::StudentId.eq(student_id));
        if let Some(class_id) = class_id {
            query = query.filter(Column::ClassId.eq(class_id));
        }
        query
            .order_by_desc(Column::LastUpdated)
            .order_by_desc(Column::SessionId)
            .all(db)
            .await
    }

    /// Student check-in.
    ///
    /// Sessions with a geofence need a location; the record is `verified`
    /// inside the radius and `failed_location` outside it, with the distance
    /// kept either way. Sessions without one record a plain `checked_in`.
    pub async fn check_in(
        db: &DbConn,
        session_id: i64,
        student_id: i64,
        location: Option<Coordinates>,
    ) -> DomainResult<Model> {
        let session = attendance_session::Model::get(db, session_id).await?;
        if !session.is_active() {
            return Err(DomainError::Validation(format!(
                "Session is {}, not active",
                session.status
            )));
        }
        if !user_class::Model::is_enrolled(db, student_id, session.class_id).await? {
            return Err(DomainError::Permission(
                "You are not enrolled in this class".into(),
            ));
        }
        if Self::find(db, session_id, student_id).await?.is_some() {
            return Err(DomainError::Conflict(
                "You have already checked in to this session".into(),
            ));
        }
        if let Some(location) = &location {
            location.validate()?;
        }

        let (status, distance_m, is_gps_verified) = match session.geofence() {
            Some((center, radius)) => {
                let point = location.ok_or_else(|| {
                    DomainError::Validation("Location is required for this session".into())
                })?;
                let check = geofence::evaluate(&center, &point, radius)?;
                let status = if check.within_radius {
                    AttendanceStatus::Verified
                } else {
                    AttendanceStatus::FailedLocation
                };
                (status, Some(check.distance_m), check.within_radius)
            }
            None => (AttendanceStatus::CheckedIn, None, false),
        };

        let now = Utc::now();
        let active_model = ActiveModel {
            session_id: Set(session_id),
            student_id: Set(student_id),
            class_id: Set(session.class_id),
            status: Set(status),
            check_in_time: Set(Some(now)),
            check_out_time: Set(None),
            check_in_latitude: Set(location.map(|l| l.latitude)),
            check_in_longitude: Set(location.map(|l| l.longitude)),
            distance_m: Set(distance_m),
            is_gps_verified: Set(is_gps_verified),
            updated_by: Set(None),
            last_updated: Set(now),
        };

        let record = active_model.insert(db).await.map_err(already_checked_in)?;
        tracing::info!(
            session_id,
            student_id,
            status = %record.status,
            distance_m = ?record.distance_m,
            "Student checked in"
        );
        Ok(record)
    }

    /// Student leaves before the session ends.
    pub async fn check_out(db: &DbConn, session_id: i64, student_id: i64) -> DomainResult<Model> {
        let session = attendance_session::Model::get(db, session_id).await?;
        if !session.is_active() {
            return Err(DomainError::Validation(format!(
                "Session is {}, not active",
                session.status
            )));
        }

        let record = Self::find(db, session_id, student_id)
            .await?
            .ok_or_else(|| {
                DomainError::NotFound("You have not checked in to this session".into())
            })?;
        if record.check_out_time.is_some() {
            return Err(DomainError::Conflict(
                "You have already checked out from this session".into(),
            ));
        }

        let now = Utc::now();
        let mut active_model: ActiveModel = record.into();
        active_model.status = Set(AttendanceStatus::CheckedOutEarly);
        active_model.check_out_time = Set(Some(now));
        active_model.last_updated = Set(now);

        let updated = active_model.update(db).await?;
        tracing::info!(session_id, student_id, "Student checked out");
        Ok(updated)
    }

    /// Flips a student between present and not present.
    ///
    /// An existing record is deleted; otherwise a `verified` record is written.
    /// The read and the write share one transaction. Returns whether the
    /// student is now marked present.
    pub async fn toggle(
        db: &DbConn,
        teacher_id: i64,
        session_id: i64,
        student_id: i64,
    ) -> DomainResult<bool> {
        let session = attendance_session::Model::get_owned(db, session_id, teacher_id).await?;
        let enrolled = class_student::Model::is_enrolled(db, session.class_id, student_id).await?;

        let txn = db.begin().await?;
        let existing = Entity::find_by_id((session_id, student_id)).one(&txn).await?;

        let mut batch = WriteBatch::new();
        let present = match existing {
            Some(_) => {
                batch.push(WriteOp::DeleteAttendance {
                    session_id,
                    student_id,
                });
                false
            }
            None => {
                if !enrolled {
                    txn.rollback().await?;
                    return Err(DomainError::NotFound(
                        "Student is not enrolled in this class".into(),
                    ));
                }
                let now = Utc::now();
                batch.push(WriteOp::InsertAttendance(ActiveModel {
                    session_id: Set(session_id),
                    student_id: Set(student_id),
                    class_id: Set(session.class_id),
                    status: Set(AttendanceStatus::Verified),
                    check_in_time: Set(Some(now)),
                    check_out_time: Set(None),
                    check_in_latitude: Set(None),
                    check_in_longitude: Set(None),
                    distance_m: Set(None),
                    is_gps_verified: Set(true),
                    updated_by: Set(Some(teacher_id)),
                    last_updated: Set(now),
                }));
                true
            }
        };

        batch.apply(&txn).await?;
        txn.commit().await?;

        tracing::info!(session_id, student_id, present, "Attendance toggled");
        Ok(present)
    }

    /// Teacher override. `absent` removes any record; other statuses are
    /// written over whatever is there. Returns the record after the change.
    pub async fn mark(
        db: &DbConn,
        teacher_id: i64,
        session_id: i64,
        student_id: i64,
        status: AttendanceStatus,
    ) -> DomainResult<Option<Model>> {
        if status == AttendanceStatus::Pending {
            return Err(DomainError::Validation(
                "Status cannot be set to pending".into(),
            ));
        }

        let session = attendance_session::Model::get_owned(db, session_id, teacher_id).await?;
        if !class_student::Model::is_enrolled(db, session.class_id, student_id).await? {
            return Err(DomainError::NotFound(
                "Student is not enrolled in this class".into(),
            ));
        }

        if status == AttendanceStatus::Absent {
            let mut batch = WriteBatch::new();
            batch.push(WriteOp::DeleteAttendance {
                session_id,
                student_id,
            });
            batch.commit(db).await?;
            tracing::info!(session_id, student_id, "Attendance marked absent");
            return Ok(None);
        }

        let now = Utc::now();
        let record = match Self::find(db, session_id, student_id).await? {
            Some(existing) => {
                let mut active_model: ActiveModel = existing.into();
                active_model.status = Set(status);
                active_model.updated_by = Set(Some(teacher_id));
                active_model.last_updated = Set(now);
                active_model.update(db).await?
            }
            None => {
                ActiveModel {
                    session_id: Set(session_id),
                    student_id: Set(student_id),
                    class_id: Set(session.class_id),
                    status: Set(status),
                    check_in_time: Set(Some(now)),
                    check_out_time: Set(None),
                    check_in_latitude: Set(None),
                    check_in_longitude: Set(None),
                    distance_m: Set(None),
                    is_gps_verified: Set(status == AttendanceStatus::Verified),
                    updated_by: Set(Some(teacher_id)),
                    last_updated: Set(now),
                }
                .insert(db)
                .await?
            }
        };

        tracing::info!(session_id, student_id, status = %status, "Attendance marked");
        Ok(Some(record))
    }
}
