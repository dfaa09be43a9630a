use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use sea_orm::sea_query::Expr;
use sea_orm::{QueryFilter, QueryOrder, Set, TransactionTrait};
use serde::Serialize;

use crate::error::{DomainError, DomainResult};
use crate::join_code;
use crate::models::user_class;

/// Join code generation gives up after this many collisions.
const JOIN_CODE_ATTEMPTS: usize = 10;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "classes")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub name: String,
    pub teacher_id: i64,
    /// Six characters from `A-Z0-9`. Students type this to join.
    #[sea_orm(unique)]
    pub join_code: Option<String>,
    pub subject: Option<String>,
    pub room: Option<String>,
    pub is_archived: bool,
    pub archived_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::TeacherId",
        to = "super::user::Column::Id"
    )]
    Teacher,
    #[sea_orm(has_many = "super::attendance_session::Entity")]
    Sessions,
    #[sea_orm(has_many = "super::class_student::Entity")]
    Students,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Teacher.def()
    }
}

impl Related<super::attendance_session::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Sessions.def()
    }
}

impl Related<super::class_student::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Students.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// Editable class fields. `None` leaves a field untouched; an empty
/// `subject` or `room` clears it.
#[derive(Debug, Clone, Default)]
pub struct ClassChanges {
    pub name: Option<String>,
    pub subject: Option<String>,
    pub room: Option<String>,
}

fn optional_text(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_owned)
}

impl Model {
    pub async fn create(
        db: &DbConn,
        teacher_id: i64,
        name: &str,
        subject: Option<&str>,
        room: Option<&str>,
    ) -> DomainResult<Model> {
        let name = name.trim();
        if name.is_empty() {
            return Err(DomainError::Validation("Class name is required".into()));
        }

        let now = Utc::now();
        let active_model = ActiveModel {
            name: Set(name.to_owned()),
            teacher_id: Set(teacher_id),
            join_code: Set(Some(Self::unused_join_code(db).await?)),
            subject: Set(optional_text(subject)),
            room: Set(optional_text(room)),
            is_archived: Set(false),
            archived_at: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };

        let class = active_model.insert(db).await?;
        tracing::info!(class_id = class.id, teacher_id, "Class created");
        Ok(class)
    }

    async fn unused_join_code(db: &DbConn) -> DomainResult<String> {
        for _ in 0..JOIN_CODE_ATTEMPTS {
            let code = join_code::generate();
            if Self::find_by_join_code(db, &code).await?.is_none() {
                return Ok(code);
            }
        }
        Err(DomainError::Conflict(
            "Could not generate a unique join code".into(),
        ))
    }

    pub async fn get(db: &DbConn, class_id: i64) -> DomainResult<Model> {
        Entity::find_by_id(class_id)
            .one(db)
            .await?
            .ok_or_else(|| DomainError::NotFound("Class not found".into()))
    }

    /// Loads a class and checks that `teacher_id` owns it.
    pub async fn get_owned(db: &DbConn, class_id: i64, teacher_id: i64) -> DomainResult<Model> {
        let class = Self::get(db, class_id).await?;
        if class.teacher_id != teacher_id {
            return Err(DomainError::Permission(
                "You do not have permission to manage this class".into(),
            ));
        }
        Ok(class)
    }

    pub async fn find_by_join_code(db: &DbConn, code: &str) -> Result<Option<Model>, DbErr> {
        Entity::find()
            .filter(Column::JoinCode.eq(join_code::normalize(code)))
            .one(db)
            .await
    }

    /// Classes owned by a teacher, newest first. `archived` filters on the flag when given.
    pub async fn list_for_teacher(
        db: &DbConn,
        teacher_id: i64,
        archived: Option<bool>,
    ) -> Result<Vec<Model>, DbErr> {
        let mut query = Entity::find().filter(Column::TeacherId.eq(teacher_id));
        if let Some(archived) = archived {
            query = query.filter(Column::IsArchived.eq(archived));
        }
        query.order_by_desc(Column::CreatedAt).all(db).await
    }

    /// Applies `changes` to an owned class. A rename is copied into every
    /// student's class list in the same transaction.
    pub async fn update_details(
        db: &DbConn,
        class_id: i64,
        teacher_id: i64,
        changes: ClassChanges,
    ) -> DomainResult<Model> {
        let class = Self::get_owned(db, class_id, teacher_id).await?;

        let new_name = match changes.name.as_deref().map(str::trim) {
            Some("") => {
                return Err(DomainError::Validation("Class name cannot be empty".into()));
            }
            Some(name) if name != class.name => Some(name.to_owned()),
            _ => None,
        };

        let mut active_model: ActiveModel = class.into();
        if let Some(name) = &new_name {
            active_model.name = Set(name.clone());
        }
        if let Some(subject) = changes.subject.as_deref() {
            active_model.subject = Set(optional_text(Some(subject)));
        }
        if let Some(room) = changes.room.as_deref() {
            active_model.room = Set(optional_text(Some(room)));
        }
        active_model.updated_at = Set(Utc::now());

        let txn = db.begin().await?;
        let updated = active_model.update(&txn).await?;
        if let Some(name) = new_name {
            user_class::Entity::update_many()
                .col_expr(user_class::Column::ClassName, Expr::value(name))
                .filter(user_class::Column::ClassId.eq(class_id))
                .exec(&txn)
                .await?;
        }
        txn.commit().await?;

        Ok(updated)
    }

    /// Archives or restores an owned class.
    pub async fn set_archived(
        db: &DbConn,
        class_id: i64,
        teacher_id: i64,
        archived: bool,
    ) -> DomainResult<Model> {
        let class = Self::get_owned(db, class_id, teacher_id).await?;
        if class.is_archived == archived {
            return Ok(class);
        }

        let now = Utc::now();
        let mut active_model: ActiveModel = class.into();
        active_model.is_archived = Set(archived);
        active_model.archived_at = Set(archived.then_some(now));
        active_model.updated_at = Set(now);

        let updated = active_model.update(db).await?;
        tracing::info!(class_id, archived, "Class archive flag changed");
        Ok(updated)
    }

    /// Replaces the join code. The old code stops working immediately.
    pub async fn regenerate_join_code(
        db: &DbConn,
        class_id: i64,
        teacher_id: i64,
    ) -> DomainResult<Model> {
        let class = Self::get_owned(db, class_id, teacher_id).await?;
        let code = Self::unused_join_code(db).await?;

        let mut active_model: ActiveModel = class.into();
        active_model.join_code = Set(Some(code));
        active_model.updated_at = Set(Utc::now());

        Ok(active_model.update(db).await?)
    }
}
