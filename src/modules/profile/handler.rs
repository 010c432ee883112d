use super::dto::UpdateProfileRequest;
use super::service::ProfileService;
use crate::common::error::AppError;
use crate::common::extract::AppJson;
use crate::common::response::{ApiResponse, ApiSuccess};
use crate::modules::auth::dto::{TokenClaims, UserResponse};
use crate::state::AppState;
use axum::{
    extract::{Extension, Multipart, State},
    http::StatusCode,
    response::IntoResponse,
};

/// Current user's profile
#[utoipa::path(
    get,
    path = "/api/profile",
    responses(
        (status = 200, description = "Profile", body = ApiResponse<UserResponse>),
        (status = 401, description = "Unauthorized")
    ),
    tag = "Profile",
    security(("bearer_auth" = []))
)]
pub async fn get_profile(
    State(state): State<AppState>,
    Extension(claims): Extension<TokenClaims>,
) -> impl IntoResponse {
    match ProfileService::get(state, claims.sub).await {
        Ok(profile) => ApiSuccess(ApiResponse::success(profile, "Profile retrieved successfully"), StatusCode::OK).into_response(),
        Err(e) => e.into_response(),
    }
}

/// Update username, email or full name
#[utoipa::path(
    put,
    path = "/api/profile",
    request_body = UpdateProfileRequest,
    responses(
        (status = 200, description = "Profile updated", body = ApiResponse<UserResponse>),
        (status = 400, description = "Bad Request"),
        (status = 409, description = "Email or username taken")
    ),
    tag = "Profile",
    security(("bearer_auth" = []))
)]
pub async fn update_profile(
    State(state): State<AppState>,
    Extension(claims): Extension<TokenClaims>,
    AppJson(payload): AppJson<UpdateProfileRequest>,
) -> impl IntoResponse {
    match ProfileService::update(state, claims.sub, payload).await {
        Ok(profile) => ApiSuccess(ApiResponse::success(profile, "Profile updated successfully"), StatusCode::OK).into_response(),
        Err(e) => e.into_response(),
    }
}

/// Upload a new avatar image (multipart field `avatar`)
#[utoipa::path(
    post,
    path = "/api/profile/avatar",
    request_body(content = String, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Avatar updated", body = ApiResponse<UserResponse>),
        (status = 400, description = "Bad Request")
    ),
    tag = "Profile",
    security(("bearer_auth" = []))
)]
pub async fn upload_avatar(
    State(state): State<AppState>,
    Extension(claims): Extension<TokenClaims>,
    mut multipart: Multipart,
) -> impl IntoResponse {
    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => return AppError::validation(format!("Invalid multipart body: {}", e)).into_response(),
        };

        if field.name() != Some("avatar") {
            continue;
        }

        return match ProfileService::upload_avatar(state, claims.sub, field).await {
            Ok(profile) => ApiSuccess(ApiResponse::success(profile, "Avatar updated successfully"), StatusCode::OK).into_response(),
            Err(e) => e.into_response(),
        };
    }

    AppError::validation("No avatar field found in multipart request").into_response()
}
