//! # auth Routes Module
//!
//! - `post.rs`: register and login
//! - `get.rs`: current user info
//! - `put.rs`: profile update

pub mod get;
pub mod post;
pub mod put;

use axum::{
    Router,
    middleware::from_fn,
    routing::{get, post},
};
use util::state::AppState;

use crate::auth::guards::allow_authenticated;
use get::get_me;
use post::{login, register};
use put::update_me;

/// Builds the `/auth` route group.
///
/// - `POST /auth/register` → `register`
/// - `POST /auth/login` → `login`
/// - `GET /auth/me` → `get_me` (authenticated)
/// - `PUT /auth/me` → `update_me` (authenticated)
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route(
            "/me",
            get(get_me)
                .put(update_me)
                .route_layer(from_fn(allow_authenticated)),
        )
}
