use axum::{
    body::Body,
    http::{Request, StatusCode, header},
};
use db::models::attendance_session::Model as SessionModel;
use db::models::user::Model as UserModel;
use serde_json::{Value, json};
use serial_test::serial;
use tower::ServiceExt;

use crate::helpers::fixtures;
use crate::helpers::{bearer, get_json_body, make_test_app};

fn request(method: &str, uri: &str, user: &UserModel, body: Option<Value>) -> Request<Body> {
    let builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::AUTHORIZATION, bearer(user));
    match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

#[tokio::test]
#[serial]
async fn join_by_code() {
    let (app, state) = make_test_app().await;
    let db = state.db();
    let teacher = fixtures::teacher(db, "t@example.com").await;
    let student = fixtures::student(db, "s@example.com", "Sam").await;
    let class = fixtures::class_for(db, &teacher, "Chemistry").await;
    let code = class.join_code.clone().unwrap().to_lowercase();

    let response = app
        .clone()
        .oneshot(request(
            "POST",
            "/api/me/classes/join",
            &student,
            Some(json!({ "join_code": format!(" {code} ") })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let json = get_json_body(response).await;
    assert_eq!(json["data"]["class_id"], class.id);
    assert_eq!(json["data"]["teacher_name"], "Ms Smith");

    let response = app
        .clone()
        .oneshot(request(
            "POST",
            "/api/me/classes/join",
            &student,
            Some(json!({ "join_code": code })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let response = app
        .clone()
        .oneshot(request(
            "POST",
            "/api/me/classes/join",
            &student,
            Some(json!({ "join_code": "NOPE00" })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = app
        .clone()
        .oneshot(request("GET", "/api/me/classes", &student, None))
        .await
        .unwrap();
    let json = get_json_body(response).await;
    assert_eq!(json["data"][0]["class_name"], "Chemistry");

    let response = app
        .oneshot(request(
            "GET",
            &format!("/api/classes/{}/students", class.id),
            &teacher,
            None,
        ))
        .await
        .unwrap();
    let json = get_json_body(response).await;
    assert_eq!(json["data"][0]["student_id"], student.id);
}

#[tokio::test]
#[serial]
async fn teachers_cannot_use_student_routes() {
    let (app, state) = make_test_app().await;
    let teacher = fixtures::teacher(state.db(), "t@example.com").await;

    let response = app
        .oneshot(request("GET", "/api/me/classes", &teacher, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
#[serial]
async fn archived_class_refuses_join() {
    let (app, state) = make_test_app().await;
    let db = state.db();
    let teacher = fixtures::teacher(db, "t@example.com").await;
    let student = fixtures::student(db, "s@example.com", "Sam").await;
    let class = fixtures::class_for(db, &teacher, "Old class").await;
    db::models::class::Model::set_archived(db, class.id, teacher.id, true)
        .await
        .unwrap();

    let response = app
        .oneshot(request(
            "POST",
            "/api/me/classes/join",
            &student,
            Some(json!({ "join_code": class.join_code })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
#[serial]
async fn active_sessions_show_own_status() {
    let (app, state) = make_test_app().await;
    let db = state.db();
    let teacher = fixtures::teacher(db, "t@example.com").await;
    let student = fixtures::student(db, "s@example.com", "Sam").await;
    let class = fixtures::class_for(db, &teacher, "Geography").await;
    fixtures::enroll(db, &student, &class).await;
    let session = fixtures::active_geofenced_session(db, &teacher, &class).await;

    let response = app
        .clone()
        .oneshot(request("GET", "/api/me/sessions/active", &student, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = get_json_body(response).await;
    assert_eq!(json["data"][0]["id"], session.id);
    assert_eq!(json["data"][0]["class_name"], "Geography");
    assert!(json["data"][0]["attendance_status"].is_null());

    app.clone()
        .oneshot(request(
            "POST",
            &format!("/api/sessions/{}/check-in", session.id),
            &student,
            Some(json!({ "latitude": 0.0, "longitude": 0.0 })),
        ))
        .await
        .unwrap();

    let response = app
        .oneshot(request("GET", "/api/me/sessions/active", &student, None))
        .await
        .unwrap();
    let json = get_json_body(response).await;
    assert_eq!(json["data"][0]["attendance_status"], "verified");
}

#[tokio::test]
#[serial]
async fn attendance_history_includes_missed_sessions() {
    let (app, state) = make_test_app().await;
    let db = state.db();
    let teacher = fixtures::teacher(db, "t@example.com").await;
    let student = fixtures::student(db, "s@example.com", "Sam").await;
    let geography = fixtures::class_for(db, &teacher, "Geography").await;
    let history = fixtures::class_for(db, &teacher, "History").await;
    fixtures::enroll(db, &student, &geography).await;
    fixtures::enroll(db, &student, &history).await;

    let missed = fixtures::active_geofenced_session(db, &teacher, &geography).await;
    SessionModel::end(db, missed.id, teacher.id).await.unwrap();
    fixtures::active_geofenced_session(db, &teacher, &history).await;

    let response = app
        .clone()
        .oneshot(request(
            "GET",
            &format!("/api/me/attendance?class_id={}", geography.id),
            &student,
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = get_json_body(response).await;
    let entries = json["data"].as_array().unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0]["session_id"], missed.id);
    assert_eq!(entries[0]["status"], "absent");

    let response = app
        .oneshot(request("GET", "/api/me/attendance", &student, None))
        .await
        .unwrap();
    let json = get_json_body(response).await;
    assert_eq!(json["data"].as_array().unwrap().len(), 2);
}

#[tokio::test]
#[serial]
async fn leave_is_refused_during_active_session() {
    let (app, state) = make_test_app().await;
    let db = state.db();
    let teacher = fixtures::teacher(db, "t@example.com").await;
    let student = fixtures::student(db, "s@example.com", "Sam").await;
    let class = fixtures::class_for(db, &teacher, "Geography").await;
    fixtures::enroll(db, &student, &class).await;
    let session = fixtures::active_geofenced_session(db, &teacher, &class).await;
    let uri = format!("/api/me/classes/{}", class.id);

    let response = app
        .clone()
        .oneshot(request("DELETE", &uri, &student, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);

    SessionModel::end(db, session.id, teacher.id).await.unwrap();

    let response = app
        .clone()
        .oneshot(request("DELETE", &uri, &student, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .oneshot(request("GET", "/api/me/classes", &student, None))
        .await
        .unwrap();
    let json = get_json_body(response).await;
    assert!(json["data"].as_array().unwrap().is_empty());
}
