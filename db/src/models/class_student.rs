use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use sea_orm::{QueryFilter, QueryOrder, SqlErr};
use serde::Serialize;

use crate::batch::WriteBatch;
use crate::error::{DomainError, DomainResult};
use crate::join_code;
use crate::models::{attendance_session, class, user, user_class};

/// A student as listed under a class. Mirror of `user_classes`.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "class_students")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub class_id: i64,
    #[sea_orm(primary_key, auto_increment = false)]
    pub student_id: i64,
    /// Display name at the time the student joined.
    pub student_name: String,
    pub join_date: DateTime<Utc>,
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
        from = "Column::StudentId",
        to = "super::user::Column::Id"
    )]
    Student,
}

impl Related<super::class::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Class.def()
    }
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Student.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Joins `student` to the class identified by `code`.
    ///
    /// Both mirror rows are written in one batch. Returns the student's view
    /// of the new enrollment.
    pub async fn enroll(
        db: &DbConn,
        student: &user::Model,
        code: &str,
    ) -> DomainResult<user_class::Model> {
        let code = join_code::normalize(code);
        if code.is_empty() {
            return Err(DomainError::Validation("Join code is required".into()));
        }
        if !student.is_student() {
            return Err(DomainError::Permission(
                "Only students can join classes".into(),
            ));
        }

        let class = class::Model::find_by_join_code(db, &code)
            .await?
            .ok_or_else(|| DomainError::NotFound("Invalid join code".into()))?;
        if class.is_archived {
            return Err(DomainError::Validation(
                "This class is archived and is not accepting students".into(),
            ));
        }
        if user_class::Model::is_enrolled(db, student.id, class.id).await? {
            return Err(DomainError::Conflict(
                "You are already enrolled in this class".into(),
            ));
        }

        let teacher_name = user::Model::get_by_id(db, class.teacher_id)
            .await?
            .map(|t| t.display_name);
        let join_date = Utc::now();

        let mut batch = WriteBatch::new();
        batch.enroll(
            class.id,
            &class.name,
            teacher_name.as_deref(),
            student.id,
            &student.display_name,
            join_date,
        );
        batch.commit(db).await.map_err(|err| match err.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(_)) => {
                DomainError::Conflict("You are already enrolled in this class".into())
            }
            _ => DomainError::Database(err),
        })?;

        tracing::info!(class_id = class.id, student_id = student.id, "Student joined class");

        Ok(user_class::Model {
            user_id: student.id,
            class_id: class.id,
            class_name: class.name,
            teacher_name,
            join_date,
        })
    }

    /// Student leaves a class of their own accord.
    pub async fn leave(db: &DbConn, student_id: i64, class_id: i64) -> DomainResult<()> {
        if !user_class::Model::is_enrolled(db, student_id, class_id).await? {
            return Err(DomainError::NotFound(
                "You are not enrolled in this class".into(),
            ));
        }
        Self::unenroll(db, class_id, student_id).await?;
        tracing::info!(class_id, student_id, "Student left class");
        Ok(())
    }

    /// Owning teacher removes a student from a class.
    pub async fn remove(
        db: &DbConn,
        teacher_id: i64,
        class_id: i64,
        student_id: i64,
    ) -> DomainResult<()> {
        class::Model::get_owned(db, class_id, teacher_id).await?;
        if !Self::is_enrolled(db, class_id, student_id).await? {
            return Err(DomainError::NotFound(
                "Student is not enrolled in this class".into(),
            ));
        }
        Self::unenroll(db, class_id, student_id).await?;
        tracing::info!(class_id, student_id, teacher_id, "Student removed from class");
        Ok(())
    }

    async fn unenroll(db: &DbConn, class_id: i64, student_id: i64) -> DomainResult<()> {
        if attendance_session::Model::find_active_for_class(db, class_id)
            .await?
            .is_some()
        {
            return Err(DomainError::Conflict(
                "Cannot change enrollment while an attendance session is active".into(),
            ));
        }

        let mut batch = WriteBatch::new();
        batch.unenroll(class_id, student_id);
        batch.commit(db).await?;
        Ok(())
    }

    pub async fn is_enrolled(db: &DbConn, class_id: i64, student_id: i64) -> Result<bool, DbErr> {
        Ok(Entity::find_by_id((class_id, student_id))
            .one(db)
            .await?
            .is_some())
    }

    /// Class roster ordered by name.
    pub async fn list_for_class(db: &DbConn, class_id: i64) -> Result<Vec<Model>, DbErr> {
        Entity::find()
            .filter(Column::ClassId.eq(class_id))
            .order_by_asc(Column::StudentName)
            .all(db)
            .await
    }
}
