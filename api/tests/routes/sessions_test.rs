use axum::{
    body::Body,
    http::{Request, StatusCode, header},
};
use db::models::{
    attendance_record, attendance_session, class,
    user::Model as UserModel,
};
use sea_orm::DatabaseConnection;
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

struct Classroom {
    teacher: UserModel,
    student: UserModel,
    class: class::Model,
}

async fn classroom(db: &DatabaseConnection) -> Classroom {
    let teacher = fixtures::teacher(db, "t@example.com").await;
    let student = fixtures::student(db, "s@example.com", "Sam").await;
    let class = fixtures::class_for(db, &teacher, "Geography").await;
    fixtures::enroll(db, &student, &class).await;
    Classroom {
        teacher,
        student,
        class,
    }
}

#[tokio::test]
#[serial]
async fn create_session_and_single_active_rule() {
    let (app, state) = make_test_app().await;
    let room = classroom(state.db()).await;
    let uri = format!("/api/classes/{}/sessions", room.class.id);

    let response = app
        .clone()
        .oneshot(request(
            "POST",
            &uri,
            &room.teacher,
            Some(json!({ "latitude": 0.0, "longitude": 0.0, "start_now": true })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let json = get_json_body(response).await;
    assert_eq!(json["data"]["status"], "active");
    assert_eq!(json["data"]["title"], "Geography");
    assert_eq!(json["data"]["radius_m"], 100.0);

    let response = app
        .clone()
        .oneshot(request(
            "POST",
            &uri,
            &room.teacher,
            Some(json!({ "start_now": true })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let response = app
        .clone()
        .oneshot(request(
            "POST",
            &uri,
            &room.teacher,
            Some(json!({ "latitude": 10.0 })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .oneshot(request("GET", &uri, &room.teacher, None))
        .await
        .unwrap();
    let json = get_json_body(response).await;
    assert_eq!(json["data"].as_array().unwrap().len(), 1);
}

#[tokio::test]
#[serial]
async fn lifecycle_transitions() {
    let (app, state) = make_test_app().await;
    let room = classroom(state.db()).await;

    let response = app
        .clone()
        .oneshot(request(
            "POST",
            &format!("/api/classes/{}/sessions", room.class.id),
            &room.teacher,
            Some(json!({ "title": "Morning" })),
        ))
        .await
        .unwrap();
    let json = get_json_body(response).await;
    assert_eq!(json["data"]["status"], "scheduled");
    let id = json["data"]["id"].as_i64().unwrap();

    let response = app
        .clone()
        .oneshot(request("PUT", &format!("/api/sessions/{id}/start"), &room.teacher, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = get_json_body(response).await;
    assert_eq!(json["data"]["status"], "active");
    assert!(json["data"]["start_time"].is_string());

    let response = app
        .clone()
        .oneshot(request("PUT", &format!("/api/sessions/{id}/cancel"), &room.teacher, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .clone()
        .oneshot(request("PUT", &format!("/api/sessions/{id}/end"), &room.teacher, None))
        .await
        .unwrap();
    let json = get_json_body(response).await;
    assert_eq!(json["data"]["status"], "ended");

    let response = app
        .clone()
        .oneshot(request(
            "POST",
            &format!("/api/sessions/{id}/check-in"),
            &room.student,
            Some(json!({})),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .oneshot(request("PUT", &format!("/api/sessions/{id}/start"), &room.student, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
#[serial]
async fn check_in_evaluates_geofence() {
    let (app, state) = make_test_app().await;
    let db = state.db();
    let room = classroom(db).await;
    let far = fixtures::student(db, "far@example.com", "Far").await;
    fixtures::enroll(db, &far, &room.class).await;
    let session = fixtures::active_geofenced_session(db, &room.teacher, &room.class).await;
    let uri = format!("/api/sessions/{}/check-in", session.id);

    let response = app
        .clone()
        .oneshot(request("POST", &uri, &room.student, Some(json!({}))))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // ~55 m east of the centre.
    let response = app
        .clone()
        .oneshot(request(
            "POST",
            &uri,
            &room.student,
            Some(json!({ "latitude": 0.0, "longitude": 0.0005 })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let json = get_json_body(response).await;
    assert_eq!(json["data"]["status"], "verified");
    assert_eq!(json["data"]["is_gps_verified"], true);

    // ~1.1 km north.
    let response = app
        .clone()
        .oneshot(request(
            "POST",
            &uri,
            &far,
            Some(json!({ "latitude": 0.01, "longitude": 0.0 })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let json = get_json_body(response).await;
    assert_eq!(json["data"]["status"], "failed_location");
    let distance = json["data"]["distance_m"].as_f64().unwrap();
    assert!((distance - 1111.95).abs() < 1.0);

    let response = app
        .clone()
        .oneshot(request(
            "POST",
            &uri,
            &room.student,
            Some(json!({ "latitude": 0.0, "longitude": 0.0 })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let response = app
        .clone()
        .oneshot(request(
            "POST",
            &format!("/api/sessions/{}/check-out", session.id),
            &room.student,
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = get_json_body(response).await;
    assert_eq!(json["data"]["status"], "checked_out_early");

    let response = app
        .oneshot(request(
            "POST",
            &uri,
            &room.teacher,
            Some(json!({ "latitude": 0.0, "longitude": 0.0 })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
#[serial]
async fn check_in_refuses_students_outside_the_class() {
    let (app, state) = make_test_app().await;
    let db = state.db();
    let room = classroom(db).await;
    let outsider = fixtures::student(db, "o@example.com", "Outsider").await;
    let session = fixtures::active_geofenced_session(db, &room.teacher, &room.class).await;

    let response = app
        .clone()
        .oneshot(request(
            "POST",
            &format!("/api/sessions/{}/check-in", session.id),
            &outsider,
            Some(json!({ "latitude": 0.0, "longitude": 0.0 })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = app
        .clone()
        .oneshot(request(
            "GET",
            &format!("/api/sessions/{}", session.id),
            &outsider,
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = app
        .oneshot(request(
            "GET",
            &format!("/api/sessions/{}", session.id),
            &room.student,
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
#[serial]
async fn toggle_twice_restores_state() {
    let (app, state) = make_test_app().await;
    let db = state.db();
    let room = classroom(db).await;
    let session = fixtures::active_geofenced_session(db, &room.teacher, &room.class).await;
    let uri = format!(
        "/api/sessions/{}/attendance/{}/toggle",
        session.id, room.student.id
    );
    let roster_uri = format!("/api/sessions/{}/attendance", session.id);

    let response = app
        .clone()
        .oneshot(request("POST", &uri, &room.teacher, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = get_json_body(response).await;
    assert_eq!(json["data"]["present"], true);

    let response = app
        .clone()
        .oneshot(request("GET", &roster_uri, &room.teacher, None))
        .await
        .unwrap();
    let json = get_json_body(response).await;
    assert_eq!(json["data"]["students"][0]["status"], "verified");

    let response = app
        .clone()
        .oneshot(request("POST", &uri, &room.teacher, None))
        .await
        .unwrap();
    let json = get_json_body(response).await;
    assert_eq!(json["data"]["present"], false);

    let response = app
        .oneshot(request("GET", &roster_uri, &room.teacher, None))
        .await
        .unwrap();
    let json = get_json_body(response).await;
    assert_eq!(json["data"]["students"][0]["status"], "absent");
    assert_eq!(json["data"]["counts"]["absent"], 1);
}

#[tokio::test]
#[serial]
async fn manual_mark_overrides_and_clears() {
    let (app, state) = make_test_app().await;
    let db = state.db();
    let room = classroom(db).await;
    let session = fixtures::active_geofenced_session(db, &room.teacher, &room.class).await;
    let uri = format!("/api/sessions/{}/attendance/{}", session.id, room.student.id);

    let response = app
        .clone()
        .oneshot(request(
            "PUT",
            &uri,
            &room.teacher,
            Some(json!({ "status": "failed_other" })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = get_json_body(response).await;
    assert_eq!(json["data"]["status"], "failed_other");
    assert_eq!(json["data"]["updated_by"], room.teacher.id);

    let response = app
        .clone()
        .oneshot(request(
            "PUT",
            &uri,
            &room.teacher,
            Some(json!({ "status": "absent" })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = get_json_body(response).await;
    assert!(json["data"].is_null());

    let response = app
        .clone()
        .oneshot(request(
            "PUT",
            &uri,
            &room.teacher,
            Some(json!({ "status": "verified" })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = get_json_body(response).await;
    assert_eq!(json["data"]["status"], "verified");
    assert_eq!(json["data"]["is_gps_verified"], true);

    let response = app
        .clone()
        .oneshot(request(
            "PUT",
            &uri,
            &room.teacher,
            Some(json!({ "status": "pending" })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .oneshot(request(
            "PUT",
            &uri,
            &room.teacher,
            Some(json!({ "status": "late" })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
#[serial]
async fn location_can_be_set_and_cleared() {
    let (app, state) = make_test_app().await;
    let db = state.db();
    let room = classroom(db).await;
    let session = fixtures::active_geofenced_session(db, &room.teacher, &room.class).await;
    let uri = format!("/api/sessions/{}/location", session.id);

    let response = app
        .clone()
        .oneshot(request(
            "PUT",
            &uri,
            &room.teacher,
            Some(json!({ "latitude": 1.0, "longitude": 2.0, "radius_m": 5.0 })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .clone()
        .oneshot(request("PUT", &uri, &room.teacher, Some(json!({}))))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = get_json_body(response).await;
    assert!(json["data"]["latitude"].is_null());

    let response = app
        .oneshot(request(
            "POST",
            &format!("/api/sessions/{}/check-in", session.id),
            &room.student,
            Some(json!({})),
        ))
        .await
        .unwrap();
    let json = get_json_body(response).await;
    assert_eq!(json["data"]["status"], "checked_in");
    assert_eq!(json["data"]["is_gps_verified"], false);
}

#[tokio::test]
#[serial]
async fn teacher_lists_own_sessions_with_filters() {
    let (app, state) = make_test_app().await;
    let db = state.db();
    let room = classroom(db).await;

    let ended = fixtures::active_geofenced_session(db, &room.teacher, &room.class).await;
    attendance_record::Model::toggle(db, room.teacher.id, ended.id, room.student.id)
        .await
        .unwrap();
    attendance_session::Model::end(db, ended.id, room.teacher.id)
        .await
        .unwrap();
    let active = fixtures::active_geofenced_session(db, &room.teacher, &room.class).await;

    let response = app
        .clone()
        .oneshot(request("GET", "/api/sessions", &room.teacher, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = get_json_body(response).await;
    let sessions = json["data"].as_array().unwrap();
    assert_eq!(sessions.len(), 2);
    assert_eq!(sessions[0]["id"], active.id);
    assert_eq!(sessions[0]["attendance_count"], 0);
    assert_eq!(sessions[1]["id"], ended.id);
    assert_eq!(sessions[1]["attendance_count"], 1);
    assert_eq!(sessions[1]["class_name"], "Geography");

    let uri = format!("/api/sessions?status=ended&class_id={}", room.class.id);
    let response = app
        .clone()
        .oneshot(request("GET", &uri, &room.teacher, None))
        .await
        .unwrap();
    let json = get_json_body(response).await;
    let sessions = json["data"].as_array().unwrap();
    assert_eq!(sessions.len(), 1);
    assert_eq!(sessions[0]["status"], "ended");

    let response = app
        .clone()
        .oneshot(request("GET", "/api/sessions?status=all", &room.teacher, None))
        .await
        .unwrap();
    let json = get_json_body(response).await;
    assert_eq!(json["data"].as_array().unwrap().len(), 2);

    let response = app
        .clone()
        .oneshot(request("GET", "/api/sessions?status=finished", &room.teacher, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .oneshot(request("GET", "/api/sessions", &room.student, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}
