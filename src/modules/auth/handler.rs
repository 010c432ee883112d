use super::dto::{AuthResponse, LoginRequest, RegisterRequest, TokenClaims, UserResponse, VerifyRequest};
use super::service::AuthService;
use crate::common::error::AppError;
use crate::common::extract::AppJson;
use crate::common::response::{ApiResponse, ApiSuccess};
use crate::common::security::bearer_token;
use crate::middleware::auth::BearerToken;
use crate::state::AppState;
use axum::{
    extract::{Extension, State},
    http::{header, HeaderMap, StatusCode},
    response::IntoResponse,
};

/// Register a new user
#[utoipa::path(
    post,
    path = "/api/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "User created successfully", body = ApiResponse<UserResponse>),
        (status = 400, description = "Bad Request"),
        (status = 409, description = "Email or username taken")
    ),
    tag = "Auth"
)]
pub async fn register(
    State(state): State<AppState>,
    AppJson(payload): AppJson<RegisterRequest>,
) -> impl IntoResponse {
    match AuthService::register(state, payload).await {
        Ok(user) => ApiSuccess(ApiResponse::success(user, "User registered successfully"), StatusCode::CREATED).into_response(),
        Err(e) => e.into_response(),
    }
}

/// Login user and get an access token
#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = ApiResponse<AuthResponse>),
        (status = 400, description = "Bad Request"),
        (status = 401, description = "Unauthorized")
    ),
    tag = "Auth"
)]
pub async fn login(
    State(state): State<AppState>,
    AppJson(payload): AppJson<LoginRequest>,
) -> impl IntoResponse {
    match AuthService::login(state, payload).await {
        Ok(response) => ApiSuccess(ApiResponse::success(response, "Login successful"), StatusCode::OK).into_response(),
        Err(e) => e.into_response(),
    }
}

/// Exchange the current bearer token for a new one
#[utoipa::path(
    post,
    path = "/api/auth/refresh",
    responses(
        (status = 200, description = "Token refreshed successfully", body = ApiResponse<AuthResponse>),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Auth"
)]
pub async fn refresh(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> impl IntoResponse {
    // Expired tokens are accepted here, so this route sits outside the auth middleware.
    let token = match headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(bearer_token)
    {
        Some(token) => token.to_owned(),
        None => return AppError::unauthorized("Missing bearer token").into_response(),
    };

    match AuthService::refresh(state, &token).await {
        Ok(response) => ApiSuccess(ApiResponse::success(response, "Token refreshed"), StatusCode::OK).into_response(),
        Err(e) => e.into_response(),
    }
}

/// Confirm an email address with a verification token
#[utoipa::path(
    post,
    path = "/api/auth/verify",
    request_body = VerifyRequest,
    responses(
        (status = 200, description = "Account verified", body = ApiResponse<UserResponse>),
        (status = 400, description = "Invalid or expired token")
    ),
    tag = "Auth"
)]
pub async fn verify(
    State(state): State<AppState>,
    AppJson(payload): AppJson<VerifyRequest>,
) -> impl IntoResponse {
    match AuthService::verify(state, payload).await {
        Ok(user) => ApiSuccess(ApiResponse::success(user, "Account verified"), StatusCode::OK).into_response(),
        Err(e) => e.into_response(),
    }
}

/// Logout user
#[utoipa::path(
    post,
    path = "/api/auth/logout",
    responses(
        (status = 200, description = "Logged out successfully", body = ApiResponse<String>),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Auth"
)]
pub async fn logout(
    State(state): State<AppState>,
    Extension(claims): Extension<TokenClaims>,
    Extension(BearerToken(token)): Extension<BearerToken>,
) -> impl IntoResponse {
    match AuthService::logout(state, &token, &claims).await {
        Ok(()) => ApiSuccess(ApiResponse::success((), "Logged out successfully"), StatusCode::OK).into_response(),
        Err(e) => e.into_response(),
    }
}
