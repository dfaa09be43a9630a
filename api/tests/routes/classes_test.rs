use axum::{
    body::Body,
    http::{Request, StatusCode, header},
};
use db::models::attendance_record::{AttendanceStatus, Model as RecordModel};
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
async fn teacher_creates_and_lists_classes() {
    let (app, state) = make_test_app().await;
    let teacher = fixtures::teacher(state.db(), "t@example.com").await;

    let response = app
        .clone()
        .oneshot(request(
            "POST",
            "/api/classes",
            &teacher,
            Some(json!({ "name": "Geography", "subject": "Humanities", "room": "B12" })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let json = get_json_body(response).await;
    assert_eq!(json["data"]["name"], "Geography");
    assert_eq!(json["data"]["teacher_id"], teacher.id);
    assert_eq!(json["data"]["join_code"].as_str().unwrap().len(), 6);
    let class_id = json["data"]["id"].as_i64().unwrap();

    let response = app
        .clone()
        .oneshot(request("GET", "/api/classes", &teacher, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = get_json_body(response).await;
    assert_eq!(json["data"].as_array().unwrap().len(), 1);

    let response = app
        .clone()
        .oneshot(request(
            "PUT",
            &format!("/api/classes/{class_id}/archive"),
            &teacher,
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .clone()
        .oneshot(request("GET", "/api/classes?archived=false", &teacher, None))
        .await
        .unwrap();
    let json = get_json_body(response).await;
    assert!(json["data"].as_array().unwrap().is_empty());

    let response = app
        .oneshot(request("GET", "/api/classes?archived=true", &teacher, None))
        .await
        .unwrap();
    let json = get_json_body(response).await;
    assert_eq!(json["data"][0]["is_archived"], true);
}

#[tokio::test]
#[serial]
async fn create_class_requires_name() {
    let (app, state) = make_test_app().await;
    let teacher = fixtures::teacher(state.db(), "t@example.com").await;

    let response = app
        .oneshot(request(
            "POST",
            "/api/classes",
            &teacher,
            Some(json!({ "name": "" })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
#[serial]
async fn students_and_other_teachers_are_refused() {
    let (app, state) = make_test_app().await;
    let db = state.db();
    let owner = fixtures::teacher(db, "owner@example.com").await;
    let other = fixtures::teacher(db, "other@example.com").await;
    let student = fixtures::student(db, "s@example.com", "Sam").await;
    let class = fixtures::class_for(db, &owner, "History").await;

    let response = app
        .clone()
        .oneshot(request(
            "POST",
            "/api/classes",
            &student,
            Some(json!({ "name": "Sneaky" })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = app
        .clone()
        .oneshot(request(
            "GET",
            &format!("/api/classes/{}", class.id),
            &other,
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = app
        .oneshot(request("GET", "/api/classes/9999", &owner, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
#[serial]
async fn rename_reaches_student_class_list() {
    let (app, state) = make_test_app().await;
    let db = state.db();
    let teacher = fixtures::teacher(db, "t@example.com").await;
    let student = fixtures::student(db, "s@example.com", "Sam").await;
    let class = fixtures::class_for(db, &teacher, "Biology").await;
    fixtures::enroll(db, &student, &class).await;

    let response = app
        .clone()
        .oneshot(request(
            "PUT",
            &format!("/api/classes/{}", class.id),
            &teacher,
            Some(json!({ "name": "Biology II", "room": "Lab 3" })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = get_json_body(response).await;
    assert_eq!(json["data"]["room"], "Lab 3");

    let response = app
        .clone()
        .oneshot(request(
            "GET",
            &format!("/api/classes/{}", class.id),
            &teacher,
            None,
        ))
        .await
        .unwrap();
    let json = get_json_body(response).await;
    assert_eq!(json["data"]["name"], "Biology II");
    assert_eq!(json["data"]["student_count"], 1);

    let response = app
        .oneshot(request("GET", "/api/me/classes", &student, None))
        .await
        .unwrap();
    let json = get_json_body(response).await;
    assert_eq!(json["data"][0]["class_name"], "Biology II");
}

#[tokio::test]
#[serial]
async fn regenerated_join_code_replaces_old_one() {
    let (app, state) = make_test_app().await;
    let db = state.db();
    let teacher = fixtures::teacher(db, "t@example.com").await;
    let student = fixtures::student(db, "s@example.com", "Sam").await;
    let class = fixtures::class_for(db, &teacher, "Art").await;
    let old_code = class.join_code.clone().unwrap();

    let response = app
        .clone()
        .oneshot(request(
            "POST",
            &format!("/api/classes/{}/join-code", class.id),
            &teacher,
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = get_json_body(response).await;
    assert_ne!(json["data"]["join_code"], old_code.as_str());

    let response = app
        .oneshot(request(
            "POST",
            "/api/me/classes/join",
            &student,
            Some(json!({ "join_code": old_code })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
#[serial]
async fn roster_and_removal() {
    let (app, state) = make_test_app().await;
    let db = state.db();
    let teacher = fixtures::teacher(db, "t@example.com").await;
    let zoe = fixtures::student(db, "zoe@example.com", "Zoe").await;
    let adam = fixtures::student(db, "adam@example.com", "Adam").await;
    let class = fixtures::class_for(db, &teacher, "Maths").await;
    fixtures::enroll(db, &zoe, &class).await;
    fixtures::enroll(db, &adam, &class).await;

    let response = app
        .clone()
        .oneshot(request(
            "GET",
            &format!("/api/classes/{}/students", class.id),
            &teacher,
            None,
        ))
        .await
        .unwrap();
    let json = get_json_body(response).await;
    let names: Vec<_> = json["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s["student_name"].as_str().unwrap().to_owned())
        .collect();
    assert_eq!(names, vec!["Adam", "Zoe"]);

    let uri = format!("/api/classes/{}/students/{}", class.id, zoe.id);
    let response = app
        .clone()
        .oneshot(request("DELETE", &uri, &teacher, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .clone()
        .oneshot(request("DELETE", &uri, &teacher, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = app
        .oneshot(request("GET", "/api/me/classes", &zoe, None))
        .await
        .unwrap();
    let json = get_json_body(response).await;
    assert!(json["data"].as_array().unwrap().is_empty());
}

#[tokio::test]
#[serial]
async fn attendance_report_counts_absent_students() {
    let (app, state) = make_test_app().await;
    let db = state.db();
    let teacher = fixtures::teacher(db, "t@example.com").await;
    let present = fixtures::student(db, "p@example.com", "Present").await;
    let missing = fixtures::student(db, "m@example.com", "Missing").await;
    let class = fixtures::class_for(db, &teacher, "Physics").await;
    fixtures::enroll(db, &present, &class).await;
    fixtures::enroll(db, &missing, &class).await;

    let session = fixtures::active_geofenced_session(db, &teacher, &class).await;
    RecordModel::mark(db, teacher.id, session.id, present.id, AttendanceStatus::Verified)
        .await
        .unwrap();

    let response = app
        .oneshot(request(
            "GET",
            &format!("/api/classes/{}/attendance", class.id),
            &teacher,
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = get_json_body(response).await;
    let report = &json["data"];
    assert_eq!(report["total_sessions"], 1);
    assert_eq!(report["enrolled_student_count"], 2);
    assert_eq!(report["overall_attendance_rate"], 50.0);
    assert_eq!(report["sessions"][0]["verified"], 1);
    assert_eq!(report["sessions"][0]["absent"], 1);
}
