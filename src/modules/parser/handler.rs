use super::dto::{LimitQuery, ParserAction, ParserActionQuery, ParserOverview, StartParserRequest};
use super::model::{ParserHistory, ParserLog, ParserSettings, ParserStatus};
use crate::common::error::AppError;
use crate::common::extract::{AppJson, AppQuery};
use crate::common::response::{ApiResponse, ApiSuccess};
use crate::modules::auth::dto::TokenClaims;
use crate::state::AppState;
use axum::{
    body::Bytes,
    extract::{Extension, State},
    http::StatusCode,
    response::IntoResponse,
};

/// Parser settings and run status
#[utoipa::path(
    get,
    path = "/api/admin/parser",
    responses(
        (status = 200, description = "Parser overview", body = ApiResponse<ParserOverview>),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    tag = "Parser",
    security(("bearer_auth" = []))
)]
pub async fn get_parser(
    State(state): State<AppState>,
    Extension(claims): Extension<TokenClaims>,
) -> impl IntoResponse {
    match state.parser.overview(claims.sub).await {
        Ok(overview) => ApiSuccess(ApiResponse::success(overview, "Parser status retrieved successfully"), StatusCode::OK).into_response(),
        Err(e) => e.into_response(),
    }
}

/// Start or stop the parser
#[utoipa::path(
    post,
    path = "/api/admin/parser",
    params(
        ("action" = String, Query, description = "`start` or `stop`")
    ),
    request_body(content = StartParserRequest, description = "Optional API key overrides for this run"),
    responses(
        (status = 200, description = "Parser status after the action", body = ApiResponse<ParserStatus>),
        (status = 400, description = "Bad Request"),
        (status = 409, description = "Parser already running or not running")
    ),
    tag = "Parser",
    security(("bearer_auth" = []))
)]
pub async fn control_parser(
    State(state): State<AppState>,
    AppQuery(query): AppQuery<ParserActionQuery>,
    body: Bytes,
) -> impl IntoResponse {
    let result = match query.action {
        ParserAction::Start => {
            let req = if body.iter().all(u8::is_ascii_whitespace) {
                StartParserRequest::default()
            } else {
                match serde_json::from_slice::<StartParserRequest>(&body) {
                    Ok(req) => req,
                    Err(e) => return AppError::validation(format!("Invalid request body: {}", e)).into_response(),
                }
            };
            state.parser.start(&req.api_keys).await.map(|status| (status, "Parser started"))
        }
        ParserAction::Stop => state.parser.stop().await.map(|status| (status, "Parser stopped")),
    };

    match result {
        Ok((status, message)) => ApiSuccess(ApiResponse::success(status, message), StatusCode::OK).into_response(),
        Err(e) => e.into_response(),
    }
}

/// Replace parser settings
#[utoipa::path(
    put,
    path = "/api/admin/parser",
    request_body = ParserSettings,
    responses(
        (status = 200, description = "Saved settings", body = ApiResponse<ParserSettings>),
        (status = 400, description = "Bad Request")
    ),
    tag = "Parser",
    security(("bearer_auth" = []))
)]
pub async fn update_settings(
    State(state): State<AppState>,
    AppJson(payload): AppJson<ParserSettings>,
) -> impl IntoResponse {
    match state.parser.update_settings(payload).await {
        Ok(settings) => ApiSuccess(ApiResponse::success(settings, "Parser settings updated successfully"), StatusCode::OK).into_response(),
        Err(e) => e.into_response(),
    }
}

/// Recent parser log entries, newest first
#[utoipa::path(
    get,
    path = "/api/admin/parser/logs",
    params(
        ("limit" = Option<i64>, Query, description = "Default 50, max 500")
    ),
    responses(
        (status = 200, description = "Parser logs", body = ApiResponse<Vec<ParserLog>>)
    ),
    tag = "Parser",
    security(("bearer_auth" = []))
)]
pub async fn list_logs(
    State(state): State<AppState>,
    AppQuery(query): AppQuery<LimitQuery>,
) -> impl IntoResponse {
    match state.parser.logs(query.limit()).await {
        Ok(logs) => ApiSuccess(ApiResponse::success(logs, "Parser logs retrieved successfully"), StatusCode::OK).into_response(),
        Err(e) => e.into_response(),
    }
}

/// Recent parser runs, newest first
#[utoipa::path(
    get,
    path = "/api/admin/parser/history",
    params(
        ("limit" = Option<i64>, Query, description = "Default 50, max 500")
    ),
    responses(
        (status = 200, description = "Parser history", body = ApiResponse<Vec<ParserHistory>>)
    ),
    tag = "Parser",
    security(("bearer_auth" = []))
)]
pub async fn list_history(
    State(state): State<AppState>,
    AppQuery(query): AppQuery<LimitQuery>,
) -> impl IntoResponse {
    match state.parser.history(query.limit()).await {
        Ok(history) => ApiSuccess(ApiResponse::success(history, "Parser history retrieved successfully"), StatusCode::OK).into_response(),
        Err(e) => e.into_response(),
    }
}
