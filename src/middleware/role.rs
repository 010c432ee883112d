use crate::common::error::AppError;
use crate::modules::auth::dto::TokenClaims;
use crate::modules::auth::repository::AuthRepository;
use crate::state::AppState;
use axum::{
    extract::{Extension, Request, State},
    middleware::Next,
    response::Response,
};
use tracing::warn;

/// Requires the token subject to be an `ADMIN` in the database; the role claim alone is not trusted.
pub async fn admin_guard(
    State(state): State<AppState>,
    Extension(claims): Extension<TokenClaims>,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let role = AuthRepository::find_role(&state.db, claims.sub)
        .await?
        .ok_or_else(|| AppError::unauthorized("User not found"))?;

    if !role.is_admin() {
        warn!(user_id = %claims.sub, "Non-admin attempted admin access");
        return Err(AppError::Forbidden("Admin access required".to_string()));
    }

    Ok(next.run(req).await)
}
