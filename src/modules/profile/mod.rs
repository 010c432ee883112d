use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use crate::common::upload::MAX_AVATAR_BYTES;
use crate::state::AppState;
use axum::middleware;

pub mod dto;
pub mod handler;
pub mod repository;
pub mod service;

pub fn router(state: AppState) -> axum::Router<AppState> {
    Router::new()
        .route("/", get(handler::get_profile).put(handler::update_profile))
        .route(
            "/avatar",
            post(handler::upload_avatar).layer(DefaultBodyLimit::max(MAX_AVATAR_BYTES + 64 * 1024)),
        )
        .route_layer(middleware::from_fn_with_state(
            state,
            crate::middleware::auth::auth_middleware
        ))
}
