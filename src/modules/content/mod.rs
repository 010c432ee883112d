use axum::Router;
use axum::routing::get;
use crate::state::AppState;

pub mod handler;
pub mod dto;
pub mod model;
pub mod repository;
pub mod service;

pub fn router() -> axum::Router<AppState> {
    Router::new()
        .route("/movies/{id}", get(handler::get_movie))
}
