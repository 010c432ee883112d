use crate::common::extract::AppPath;
use crate::common::response::{ApiResponse, ApiSuccess};
use crate::state::AppState;
use crate::modules::content::dto::MediaResponse;
use crate::modules::content::service::ContentService;
use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
};
use uuid::Uuid;

#[utoipa::path(
    get,
    path = "/api/movies/{id}",
    params(
        ("id" = Uuid, Path, description = "Media ID")
    ),
    responses(
        (status = 200, description = "Get Movie", body = ApiResponse<MediaResponse>),
        (status = 404, description = "Movie Not Found"),
        (status = 500, description = "Internal Server Error")
    ),
    tag = "Content"
)]
pub async fn get_movie(
    State(state): State<AppState>,
    AppPath(id): AppPath<Uuid>,
) -> impl IntoResponse {
    match ContentService::get_media(state, id).await {
        Ok(res) => ApiSuccess(ApiResponse::success(res, "Movie retrieved successfully"), StatusCode::OK).into_response(),
        Err(e) => e.into_response(),
    }
}
