use super::dto::{AdminStats, UpdateRoleRequest, UserListQuery};
use super::service::AdminService;
use crate::common::extract::{AppJson, AppQuery};
use crate::common::response::{ApiResponse, ApiSuccess};
use crate::modules::auth::dto::{TokenClaims, UserResponse};
use crate::modules::content::dto::{ContentListQuery, DeleteContentQuery, Page};
use crate::modules::content::model::Media;
use crate::modules::content::service::ContentService;
use crate::state::AppState;
use axum::{
    extract::{Extension, State},
    http::StatusCode,
    response::IntoResponse,
};

/// List users
#[utoipa::path(
    get,
    path = "/api/admin/users",
    params(
        ("page" = Option<i64>, Query, description = "1-based page"),
        ("limit" = Option<i64>, Query, description = "Page size, max 100")
    ),
    responses(
        (status = 200, description = "Users", body = ApiResponse<Page<UserResponse>>),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    tag = "Admin",
    security(("bearer_auth" = []))
)]
pub async fn list_users(
    State(state): State<AppState>,
    AppQuery(query): AppQuery<UserListQuery>,
) -> impl IntoResponse {
    match AdminService::list_users(state, query).await {
        Ok(page) => ApiSuccess(ApiResponse::success(page, "Users retrieved successfully"), StatusCode::OK).into_response(),
        Err(e) => e.into_response(),
    }
}

/// Change a user's role
#[utoipa::path(
    put,
    path = "/api/admin/users/role",
    request_body = UpdateRoleRequest,
    responses(
        (status = 200, description = "Role updated", body = ApiResponse<UserResponse>),
        (status = 400, description = "Bad Request"),
        (status = 404, description = "User not found")
    ),
    tag = "Admin",
    security(("bearer_auth" = []))
)]
pub async fn update_role(
    State(state): State<AppState>,
    Extension(claims): Extension<TokenClaims>,
    AppJson(payload): AppJson<UpdateRoleRequest>,
) -> impl IntoResponse {
    match AdminService::update_role(state, claims.sub, payload).await {
        Ok(user) => ApiSuccess(ApiResponse::success(user, "Role updated successfully"), StatusCode::OK).into_response(),
        Err(e) => e.into_response(),
    }
}

/// Catalog and parser counters
#[utoipa::path(
    get,
    path = "/api/admin/stats",
    responses(
        (status = 200, description = "Statistics", body = ApiResponse<AdminStats>)
    ),
    tag = "Admin",
    security(("bearer_auth" = []))
)]
pub async fn get_stats(State(state): State<AppState>) -> impl IntoResponse {
    match AdminService::stats(state).await {
        Ok(stats) => ApiSuccess(ApiResponse::success(stats, "Statistics retrieved successfully"), StatusCode::OK).into_response(),
        Err(e) => e.into_response(),
    }
}

/// List catalog content
#[utoipa::path(
    get,
    path = "/api/admin/content",
    params(
        ("page" = Option<i64>, Query, description = "1-based page"),
        ("limit" = Option<i64>, Query, description = "Page size, max 100"),
        ("media_type" = Option<String>, Query, description = "`movie` or `series`"),
        ("status" = Option<String>, Query, description = "Content status, e.g. `READY`")
    ),
    responses(
        (status = 200, description = "Content page", body = ApiResponse<Page<Media>>),
        (status = 400, description = "Bad Request")
    ),
    tag = "Admin",
    security(("bearer_auth" = []))
)]
pub async fn list_content(
    State(state): State<AppState>,
    AppQuery(query): AppQuery<ContentListQuery>,
) -> impl IntoResponse {
    match ContentService::list_media(state, query).await {
        Ok(page) => ApiSuccess(ApiResponse::success(page, "Content retrieved successfully"), StatusCode::OK).into_response(),
        Err(e) => e.into_response(),
    }
}

/// Delete a media item and its video sources
#[utoipa::path(
    delete,
    path = "/api/admin/content",
    params(
        ("id" = uuid::Uuid, Query, description = "Media ID")
    ),
    responses(
        (status = 200, description = "Content deleted"),
        (status = 404, description = "Content not found")
    ),
    tag = "Admin",
    security(("bearer_auth" = []))
)]
pub async fn delete_content(
    State(state): State<AppState>,
    AppQuery(query): AppQuery<DeleteContentQuery>,
) -> impl IntoResponse {
    match ContentService::delete_media(state, query.id).await {
        Ok(()) => ApiSuccess(ApiResponse::<()>::success((), "Content deleted successfully"), StatusCode::OK).into_response(),
        Err(e) => e.into_response(),
    }
}
