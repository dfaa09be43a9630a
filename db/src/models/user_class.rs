use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use sea_orm::{QueryFilter, QueryOrder};
use serde::Serialize;

/// A class as listed under a student. Mirror of `class_students`.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "user_classes")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub user_id: i64,
    #[sea_orm(primary_key, auto_increment = false)]
    pub class_id: i64,
    /// Cached at join time and kept current on rename.
    pub class_name: String,
    pub teacher_name: Option<String>,
    pub join_date: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id"
    )]
    User,
    #[sea_orm(
        belongs_to = "super::class::Entity",
        from = "Column::ClassId",
        to = "super::class::Column::Id"
    )]
    Class,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl Related<super::class::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Class.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub async fn find(db: &DbConn, user_id: i64, class_id: i64) -> Result<Option<Model>, DbErr> {
        Entity::find_by_id((user_id, class_id)).one(db).await
    }

    pub async fn is_enrolled(db: &DbConn, user_id: i64, class_id: i64) -> Result<bool, DbErr> {
        Ok(Self::find(db, user_id, class_id).await?.is_some())
    }

    /// The student's classes, most recently joined first.
    pub async fn list_for_user(db: &DbConn, user_id: i64) -> Result<Vec<Model>, DbErr> {
        Entity::find()
            .filter(Column::UserId.eq(user_id))
            .order_by_desc(Column::JoinDate)
            .all(db)
            .await
    }
}
