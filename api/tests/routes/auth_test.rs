use axum::{
    body::Body,
    http::{Request, StatusCode, header},
};
use db::models::user::Model as UserModel;
use serde_json::json;
use serial_test::serial;
use tower::ServiceExt;

use crate::helpers::fixtures::{self, PASSWORD};
use crate::helpers::{bearer, get_json_body, make_test_app};

fn post_json(uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
#[serial]
async fn register_issues_token() {
    let (app, _) = make_test_app().await;

    let response = app
        .oneshot(post_json(
            "/api/auth/register",
            json!({
                "email": "New.Teacher@Example.com",
                "display_name": "Ms New",
                "password": PASSWORD,
                "role": "teacher"
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);
    let json = get_json_body(response).await;
    assert_eq!(json["success"], true);
    assert_eq!(json["data"]["email"], "new.teacher@example.com");
    assert_eq!(json["data"]["role"], "teacher");
    assert!(!json["data"]["token"].as_str().unwrap().is_empty());
}

#[tokio::test]
#[serial]
async fn register_rejects_duplicate_email() {
    let (app, state) = make_test_app().await;
    fixtures::student(state.db(), "taken@example.com", "Sam").await;

    let response = app
        .oneshot(post_json(
            "/api/auth/register",
            json!({
                "email": "taken@example.com",
                "display_name": "Someone",
                "password": PASSWORD,
                "role": "student"
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CONFLICT);
    let json = get_json_body(response).await;
    assert_eq!(json["success"], false);
    assert_eq!(json["message"], "A user with this email already exists");
}

#[tokio::test]
#[serial]
async fn register_validates_input() {
    let (app, _) = make_test_app().await;

    let response = app
        .clone()
        .oneshot(post_json(
            "/api/auth/register",
            json!({
                "email": "a@example.com",
                "display_name": "A",
                "password": "short",
                "role": "student"
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = get_json_body(response).await;
    assert_eq!(json["message"], "Password must be at least 8 characters");

    let response = app
        .oneshot(post_json(
            "/api/auth/register",
            json!({
                "email": "a@example.com",
                "display_name": "A",
                "password": PASSWORD,
                "role": "admin"
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
#[serial]
async fn login_checks_password() {
    let (app, state) = make_test_app().await;
    let user = fixtures::student(state.db(), "sam@example.com", "Sam").await;

    let response = app
        .clone()
        .oneshot(post_json(
            "/api/auth/login",
            json!({ "email": "SAM@example.com", "password": PASSWORD }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = get_json_body(response).await;
    assert_eq!(json["data"]["id"], user.id);
    assert_eq!(json["data"]["role"], "student");

    let response = app
        .oneshot(post_json(
            "/api/auth/login",
            json!({ "email": "sam@example.com", "password": "wrong-password" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let json = get_json_body(response).await;
    assert_eq!(json["message"], "Invalid email or password");
}

#[tokio::test]
#[serial]
async fn me_requires_token() {
    let (app, state) = make_test_app().await;
    let user = fixtures::teacher(state.db(), "t@example.com").await;

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/auth/me")
                .header(header::AUTHORIZATION, bearer(&user))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = get_json_body(response).await;
    assert_eq!(json["data"]["email"], "t@example.com");
    assert!(json["data"].get("password_hash").is_none());

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/auth/me")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/auth/me")
                .header(header::AUTHORIZATION, "Bearer not-a-token")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

fn put_me(user: &UserModel, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("PUT")
        .uri("/api/auth/me")
        .header(header::AUTHORIZATION, bearer(user))
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
#[serial]
async fn update_me_changes_display_name_only() {
    let (app, state) = make_test_app().await;
    let user = fixtures::student(state.db(), "s@example.com", "Sam").await;

    let response = app
        .clone()
        .oneshot(put_me(
            &user,
            json!({ "display_name": "Samantha", "role": "teacher", "id": 999 }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = get_json_body(response).await;
    assert_eq!(json["data"]["display_name"], "Samantha");
    assert_eq!(json["data"]["role"], "student");
    assert_eq!(json["data"]["id"], user.id);

    let stored = UserModel::get_by_id(state.db(), user.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.display_name, "Samantha");
    assert!(stored.is_student());

    let response = app
        .clone()
        .oneshot(put_me(&user, json!({ "display_name": "" })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .oneshot(
            Request::builder()
                .method("PUT")
                .uri("/api/auth/me")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json!({ "display_name": "Nobody" }).to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}
