use axum::Router;
use axum::routing::{get, put};
use crate::state::AppState;
use axum::middleware;

pub mod dto;
pub mod handler;
pub mod repository;
pub mod service;

/// Every route requires a bearer token whose subject is an admin.
pub fn router(state: AppState) -> axum::Router<AppState> {
    Router::new()
        .route("/users", get(handler::list_users))
        .route("/users/role", put(handler::update_role))
        .route("/stats", get(handler::get_stats))
        .route(
            "/content",
            get(handler::list_content).delete(handler::delete_content),
        )
        .nest("/parser", crate::modules::parser::router())
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            crate::middleware::role::admin_guard,
        ))
        .route_layer(middleware::from_fn_with_state(
            state,
            crate::middleware::auth::auth_middleware,
        ))
}
