use crate::common::error::AppError;
use crate::common::security::bearer_token;
use crate::modules::auth::repository::AuthRepository;
use crate::state::AppState;
use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};

/// Raw bearer token of the authenticated request, for handlers that revoke it.
#[derive(Debug, Clone)]
pub struct BearerToken(pub String);

pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    // 1. Extract token from header
    let token = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|auth_header| auth_header.to_str().ok())
        .and_then(bearer_token)
        .map(str::to_owned)
        .ok_or_else(|| AppError::unauthorized("Missing or invalid token"))?;

    // 2. Verify JWT
    let claims = state.tokens.verify(&token)?;

    // 3. Check if token is blocked in Redis
    let mut redis = state.redis.get_conn().await?;
    if AuthRepository::is_token_blocked(&mut redis, &token).await? {
        return Err(AppError::unauthorized("Token is blocked/revoked"));
    }

    // 4. Inject claims into request extensions
    req.extensions_mut().insert(claims);
    req.extensions_mut().insert(BearerToken(token));

    Ok(next.run(req).await)
}
