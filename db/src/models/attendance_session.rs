use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use sea_orm::{ConnectionTrait, QueryFilter, QueryOrder, Set, TransactionTrait};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use util::config;
use util::geofence::Coordinates;

use crate::error::{DomainError, DomainResult};
use crate::models::{class, user, user_class};

/// Smallest geofence radius a session may use, in metres.
pub const MIN_RADIUS_M: f64 = 10.0;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "attendance_sessions")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub class_id: i64,
    pub teacher_id: i64,
    pub title: String,
    pub status: SessionStatus,
    /// Geofence centre and radius. Either all three are set or none are.
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub radius_m: Option<f64>,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    EnumIter,
    DeriveActiveEnum,
    Display,
    EnumString,
    Serialize,
    Deserialize,
)]
#[serde(rename_all = "lowercase")]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "session_status_type")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum SessionStatus {
    #[sea_orm(string_value = "scheduled")]
    Scheduled,

    #[sea_orm(string_value = "active")]
    Active,

    #[sea_orm(string_value = "ended")]
    Ended,

    #[sea_orm(string_value = "cancelled")]
    Cancelled,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::class::Entity",
        from = "Column::ClassId",
        to = "super::class::Column::Id"
    )]
    Class,
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::TeacherId",
        to = "super::user::Column::Id"
    )]
    Teacher,
    #[sea_orm(has_many = "super::attendance_record::Entity")]
    Records,
}

impl Related<super::class::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Class.def()
    }
}

impl Related<super::attendance_record::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Records.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// Geofence as supplied by a teacher. A missing radius falls back to the
/// configured default.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
pub struct SessionLocation {
    pub latitude: f64,
    pub longitude: f64,
    pub radius_m: Option<f64>,
}

#[derive(Debug, Clone, Default)]
pub struct SessionOptions {
    /// Defaults to the class name.
    pub title: Option<String>,
    pub location: Option<SessionLocation>,
    /// Create the session already active.
    pub start_now: bool,
}

type ResolvedLocation = (Option<f64>, Option<f64>, Option<f64>);

fn resolve_location(location: Option<&SessionLocation>) -> DomainResult<ResolvedLocation> {
    let Some(location) = location else {
        return Ok((None, None, None));
    };

    let center = Coordinates::new(location.latitude, location.longitude)?;
    let radius = location
        .radius_m
        .unwrap_or_else(config::default_session_radius_m);
    if !radius.is_finite() || radius < MIN_RADIUS_M {
        return Err(DomainError::Validation(format!(
            "Radius must be at least {MIN_RADIUS_M} metres"
        )));
    }

    Ok((Some(center.latitude), Some(center.longitude), Some(radius)))
}

impl Model {
    /// Centre and radius when the session has a geofence.
    pub fn geofence(&self) -> Option<(Coordinates, f64)> {
        match (self.latitude, self.longitude, self.radius_m) {
            (Some(latitude), Some(longitude), Some(radius)) => Some((
                Coordinates {
                    latitude,
                    longitude,
                },
                radius,
            )),
            _ => None,
        }
    }

    pub fn is_active(&self) -> bool {
        self.status == SessionStatus::Active
    }

    pub async fn create(
        db: &DbConn,
        teacher_id: i64,
        class_id: i64,
        options: SessionOptions,
    ) -> DomainResult<Model> {
        let class = class::Model::get_owned(db, class_id, teacher_id).await?;
        if class.is_archived {
            return Err(DomainError::Validation(
                "Cannot create a session for an archived class".into(),
            ));
        }

        let title = options
            .title
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_owned)
            .unwrap_or(class.name);
        let (latitude, longitude, radius_m) = resolve_location(options.location.as_ref())?;

        let now = Utc::now();
        let active_model = ActiveModel {
            class_id: Set(class_id),
            teacher_id: Set(teacher_id),
            title: Set(title),
            status: Set(if options.start_now {
                SessionStatus::Active
            } else {
                SessionStatus::Scheduled
            }),
            latitude: Set(latitude),
            longitude: Set(longitude),
            radius_m: Set(radius_m),
            start_time: Set(options.start_now.then_some(now)),
            end_time: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };

        let session = if options.start_now {
            let txn = db.begin().await?;
            Self::ensure_no_active(&txn, class_id).await?;
            let session = active_model.insert(&txn).await?;
            txn.commit().await?;
            session
        } else {
            active_model.insert(db).await?
        };

        tracing::info!(
            session_id = session.id,
            class_id,
            status = %session.status,
            "Attendance session created"
        );
        Ok(session)
    }

    pub async fn get(db: &DbConn, session_id: i64) -> DomainResult<Model> {
        Entity::find_by_id(session_id)
            .one(db)
            .await?
            .ok_or_else(|| DomainError::NotFound("Session not found".into()))
    }

    /// Loads a session and checks that `teacher_id` runs it.
    pub async fn get_owned(db: &DbConn, session_id: i64, teacher_id: i64) -> DomainResult<Model> {
        let session = Self::get(db, session_id).await?;
        if session.teacher_id != teacher_id {
            return Err(DomainError::Permission(
                "You do not have permission to manage this session".into(),
            ));
        }
        Ok(session)
    }

    /// Loads a session visible to `user`: the teacher running it or a student
    /// enrolled in its class.
    pub async fn get_for_user(
        db: &DbConn,
        session_id: i64,
        user: &user::Model,
    ) -> DomainResult<Model> {
        let session = Self::get(db, session_id).await?;
        let allowed = if user.is_teacher() {
            session.teacher_id == user.id
        } else {
            user_class::Model::is_enrolled(db, user.id, session.class_id).await?
        };
        if !allowed {
            return Err(DomainError::Permission(
                "You do not have access to this session".into(),
            ));
        }
        Ok(session)
    }

    /// Sessions of an owned class, newest first.
    pub async fn list_for_class(
        db: &DbConn,
        class_id: i64,
        teacher_id: i64,
    ) -> DomainResult<Vec<Model>> {
        class::Model::get_owned(db, class_id, teacher_id).await?;
        Ok(Entity::find()
            .filter(Column::ClassId.eq(class_id))
            .order_by_desc(Column::CreatedAt)
            .order_by_desc(Column::Id)
            .all(db)
            .await?)
    }

    /// Every session a teacher runs, most recently started first. Sessions
    /// that never started sort after the rest.
    pub async fn list_for_teacher(
        db: &DbConn,
        teacher_id: i64,
        status: Option<SessionStatus>,
        class_id: Option<i64>,
    ) -> Result<Vec<Model>, DbErr> {
        let mut query = Entity::find().filter(Column::TeacherId.eq(teacher_id));
        if let Some(status) = status {
            query = query.filter(Column::Status.eq(status));
        }
        if let Some(class_id) = class_id {
            query = query.filter(Column::ClassId.eq(class_id));
        }
        query
            .order_by_desc(Column::StartTime)
            .order_by_desc(Column::CreatedAt)
            .order_by_desc(Column::Id)
            .all(db)
            .await
    }

    pub async fn find_active_for_class<C: ConnectionTrait>(
        conn: &C,
        class_id: i64,
    ) -> Result<Option<Model>, DbErr> {
        Entity::find()
            .filter(Column::ClassId.eq(class_id))
            .filter(Column::Status.eq(SessionStatus::Active))
            .one(conn)
            .await
    }

    async fn ensure_no_active<C: ConnectionTrait>(conn: &C, class_id: i64) -> DomainResult<()> {
        if Self::find_active_for_class(conn, class_id).await?.is_some() {
            return Err(DomainError::Conflict(
                "This class already has an active session".into(),
            ));
        }
        Ok(())
    }

    /// Active sessions across every class the student is enrolled in.
    pub async fn active_for_student(db: &DbConn, student_id: i64) -> Result<Vec<Model>, DbErr> {
        let class_ids: Vec<i64> = user_class::Model::list_for_user(db, student_id)
            .await?
            .into_iter()
            .map(|c| c.class_id)
            .collect();
        if class_ids.is_empty() {
            return Ok(Vec::new());
        }

        Entity::find()
            .filter(Column::ClassId.is_in(class_ids))
            .filter(Column::Status.eq(SessionStatus::Active))
            .order_by_desc(Column::StartTime)
            .all(db)
            .await
    }

    /// `scheduled -> active`. Starting an active session is a no-op.
    pub async fn start(db: &DbConn, session_id: i64, teacher_id: i64) -> DomainResult<Model> {
        let session = Self::get_owned(db, session_id, teacher_id).await?;
        match session.status {
            SessionStatus::Active => return Ok(session),
            SessionStatus::Ended | SessionStatus::Cancelled => {
                return Err(DomainError::Validation(format!(
                    "Cannot start a session that is {}",
                    session.status
                )));
            }
            SessionStatus::Scheduled => {}
        }

        let class_id = session.class_id;
        let now = Utc::now();
        let mut active_model: ActiveModel = session.into();
        active_model.status = Set(SessionStatus::Active);
        active_model.start_time = Set(Some(now));
        active_model.end_time = Set(None);
        active_model.updated_at = Set(now);

        let txn = db.begin().await?;
        Self::ensure_no_active(&txn, class_id).await?;
        let updated = active_model.update(&txn).await?;
        txn.commit().await?;

        tracing::info!(session_id, class_id, "Attendance session started");
        Ok(updated)
    }

    /// `active | scheduled -> ended`. Ending an ended session is a no-op.
    pub async fn end(db: &DbConn, session_id: i64, teacher_id: i64) -> DomainResult<Model> {
        let session = Self::get_owned(db, session_id, teacher_id).await?;
        match session.status {
            SessionStatus::Ended => return Ok(session),
            SessionStatus::Cancelled => {
                return Err(DomainError::Validation(
                    "Cannot end a cancelled session".into(),
                ));
            }
            SessionStatus::Active | SessionStatus::Scheduled => {}
        }

        let now = Utc::now();
        let mut active_model: ActiveModel = session.into();
        active_model.status = Set(SessionStatus::Ended);
        active_model.end_time = Set(Some(now));
        active_model.updated_at = Set(now);

        let updated = active_model.update(db).await?;
        tracing::info!(session_id, "Attendance session ended");
        Ok(updated)
    }

    /// `scheduled -> cancelled`.
    pub async fn cancel(db: &DbConn, session_id: i64, teacher_id: i64) -> DomainResult<Model> {
        let session = Self::get_owned(db, session_id, teacher_id).await?;
        if session.status != SessionStatus::Scheduled {
            return Err(DomainError::Validation(format!(
                "Only scheduled sessions can be cancelled (session is {})",
                session.status
            )));
        }

        let mut active_model: ActiveModel = session.into();
        active_model.status = Set(SessionStatus::Cancelled);
        active_model.updated_at = Set(Utc::now());

        Ok(active_model.update(db).await?)
    }

    /// Sets or clears the geofence.
    pub async fn update_location(
        db: &DbConn,
        session_id: i64,
        teacher_id: i64,
        location: Option<SessionLocation>,
    ) -> DomainResult<Model> {
        let session = Self::get_owned(db, session_id, teacher_id).await?;
        let (latitude, longitude, radius_m) = resolve_location(location.as_ref())?;

        let mut active_model: ActiveModel = session.into();
        active_model.latitude = Set(latitude);
        active_model.longitude = Set(longitude);
        active_model.radius_m = Set(radius_m);
        active_model.updated_at = Set(Utc::now());

        Ok(active_model.update(db).await?)
    }
}
