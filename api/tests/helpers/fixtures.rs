use db::models::{
    attendance_session::{self, SessionLocation, SessionOptions},
    class, class_student,
    user::{Model as UserModel, UserRole},
};
use sea_orm::DatabaseConnection;

pub const PASSWORD: &str = "password123";

pub async fn teacher(db: &DatabaseConnection, email: &str) -> UserModel {
    UserModel::create(db, email, "Ms Smith", PASSWORD, UserRole::Teacher)
        .await
        .unwrap()
}

pub async fn student(db: &DatabaseConnection, email: &str, name: &str) -> UserModel {
    UserModel::create(db, email, name, PASSWORD, UserRole::Student)
        .await
        .unwrap()
}

pub async fn class_for(db: &DatabaseConnection, owner: &UserModel, name: &str) -> class::Model {
    class::Model::create(db, owner.id, name, None, None)
        .await
        .unwrap()
}

pub async fn enroll(db: &DatabaseConnection, student: &UserModel, class: &class::Model) {
    class_student::Model::enroll(db, student, class.join_code.as_deref().unwrap())
        .await
        .unwrap();
}

/// Active session with a 100 m geofence centred on (0, 0).
pub async fn active_geofenced_session(
    db: &DatabaseConnection,
    owner: &UserModel,
    class: &class::Model,
) -> attendance_session::Model {
    attendance_session::Model::create(
        db,
        owner.id,
        class.id,
        SessionOptions {
            title: Some("Field trip".into()),
            location: Some(SessionLocation {
                latitude: 0.0,
                longitude: 0.0,
                radius_m: Some(100.0),
            }),
            start_now: true,
        },
    )
    .await
    .unwrap()
}
