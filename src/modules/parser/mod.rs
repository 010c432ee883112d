use axum::Router;
use axum::routing::get;
use crate::state::AppState;

pub mod dto;
pub mod handler;
pub mod model;
pub mod providers;
pub mod repository;
pub mod service;
pub mod video_processor;

#[cfg(test)]
pub(crate) mod testing;

/// Routes mounted under `/admin/parser`; guards are applied by the admin router.
pub fn router() -> axum::Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handler::get_parser)
                .post(handler::control_parser)
                .put(handler::update_settings),
        )
        .route("/logs", get(handler::list_logs))
        .route("/history", get(handler::list_history))
}
