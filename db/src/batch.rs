//! Multi-row writes that must land together.
//!
//! A [`WriteBatch`] collects insert and delete operations for the enrollment
//! mirror and attendance tables and applies them inside one transaction.
//! If any operation fails the transaction is rolled back and nothing is written.

use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseTransaction, DbErr, EntityTrait,
    QueryFilter, Set, TransactionTrait,
};

use crate::models::{attendance_record, class_student, user_class};

#[derive(Debug, Clone)]
pub enum WriteOp {
    InsertClassStudent(class_student::ActiveModel),
    DeleteClassStudent { class_id: i64, student_id: i64 },
    InsertUserClass(user_class::ActiveModel),
    DeleteUserClass { user_id: i64, class_id: i64 },
    InsertAttendance(attendance_record::ActiveModel),
    DeleteAttendance { session_id: i64, student_id: i64 },
}

impl WriteOp {
    async fn apply<C: ConnectionTrait>(self, conn: &C) -> Result<(), DbErr> {
        match self {
            WriteOp::InsertClassStudent(row) => {
                row.insert(conn).await?;
            }
            WriteOp::DeleteClassStudent {
                class_id,
                student_id,
            } => {
                class_student::Entity::delete_many()
                    .filter(class_student::Column::ClassId.eq(class_id))
                    .filter(class_student::Column::StudentId.eq(student_id))
                    .exec(conn)
                    .await?;
            }
            WriteOp::InsertUserClass(row) => {
                row.insert(conn).await?;
            }
            WriteOp::DeleteUserClass { user_id, class_id } => {
                user_class::Entity::delete_many()
                    .filter(user_class::Column::UserId.eq(user_id))
                    .filter(user_class::Column::ClassId.eq(class_id))
                    .exec(conn)
                    .await?;
            }
            WriteOp::InsertAttendance(row) => {
                row.insert(conn).await?;
            }
            WriteOp::DeleteAttendance {
                session_id,
                student_id,
            } => {
                attendance_record::Entity::delete_many()
                    .filter(attendance_record::Column::SessionId.eq(session_id))
                    .filter(attendance_record::Column::StudentId.eq(student_id))
                    .exec(conn)
                    .await?;
            }
        }
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct WriteBatch {
    ops: Vec<WriteOp>,
}

impl WriteBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, op: WriteOp) -> &mut Self {
        self.ops.push(op);
        self
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Queues both sides of an enrollment.
    pub fn enroll(
        &mut self,
        class_id: i64,
        class_name: &str,
        teacher_name: Option<&str>,
        student_id: i64,
        student_name: &str,
        join_date: DateTime<Utc>,
    ) -> &mut Self {
        self.push(WriteOp::InsertClassStudent(class_student::ActiveModel {
            class_id: Set(class_id),
            student_id: Set(student_id),
            student_name: Set(student_name.to_owned()),
            join_date: Set(join_date),
        }));
        self.push(WriteOp::InsertUserClass(user_class::ActiveModel {
            user_id: Set(student_id),
            class_id: Set(class_id),
            class_name: Set(class_name.to_owned()),
            teacher_name: Set(teacher_name.map(str::to_owned)),
            join_date: Set(join_date),
        }))
    }

    /// Queues removal of both sides of an enrollment.
    pub fn unenroll(&mut self, class_id: i64, student_id: i64) -> &mut Self {
        self.push(WriteOp::DeleteClassStudent {
            class_id,
            student_id,
        });
        self.push(WriteOp::DeleteUserClass {
            user_id: student_id,
            class_id,
        })
    }

    /// Applies every queued operation on an already open transaction.
    ///
    /// The caller decides whether to commit.
    pub async fn apply(self, txn: &DatabaseTransaction) -> Result<(), DbErr> {
        for op in self.ops {
            op.apply(txn).await?;
        }
        Ok(())
    }

    /// Applies every queued operation in a fresh transaction and commits.
    pub async fn commit<C: TransactionTrait>(self, db: &C) -> Result<(), DbErr> {
        let count = self.ops.len();
        let txn = db.begin().await?;
        if let Err(err) = self.apply(&txn).await {
            tracing::warn!(ops = count, error = %err, "Write batch failed, rolling back");
            txn.rollback().await?;
            return Err(err);
        }
        txn.commit().await?;
        tracing::debug!(ops = count, "Write batch committed");
        Ok(())
    }
}
