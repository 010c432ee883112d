use super::dto::{AuthResponse, LoginRequest, RegisterRequest, TokenClaims, UserResponse, VerifyRequest};
use super::repository::AuthRepository;
use super::token::remaining_lifetime;
use crate::common::error::{AppError, AppResult};
use crate::common::security;
use crate::state::AppState;
use tracing::{info, warn};
use uuid::Uuid;
use validator::Validate;

const VERIFICATION_TTL_SECS: u64 = 24 * 60 * 60;

pub struct AuthService;

impl AuthService {
    pub async fn register(state: AppState, req: RegisterRequest) -> AppResult<UserResponse> {
        req.validate()?;

        // Check if user exists
        if AuthRepository::find_user_by_email(&state.db, &req.email)
            .await?
            .is_some()
        {
            return Err(AppError::conflict("Email already exists"));
        }

        if AuthRepository::find_user_by_username(&state.db, &req.username)
            .await?
            .is_some()
        {
            return Err(AppError::conflict("Username already exists"));
        }

        let password_hash = security::hash_password(&req.password)?;

        let user = AuthRepository::create_user(
            &state.db,
            &req.username,
            &req.email,
            &password_hash,
            &req.full_name,
        )
        .await?;

        let verification_token = Uuid::new_v4().simple().to_string();
        let mut redis_conn = state.redis.get_conn().await?;
        AuthRepository::store_verification_token(
            &mut redis_conn,
            &verification_token,
            user.id,
            VERIFICATION_TTL_SECS,
        )
        .await?;

        // Delivery is out of band; the token is logged for operators.
        info!(user_id = %user.id, "Registered user, verification token: {}", verification_token);

        Ok(UserResponse::from(user))
    }

    pub async fn login(state: AppState, req: LoginRequest) -> AppResult<AuthResponse> {
        req.validate()?;

        let user = AuthRepository::find_user_by_email(&state.db, &req.email)
            .await?
            .ok_or_else(|| AppError::unauthorized("Invalid credentials"))?;

        security::verify_password(&req.password, &user.password_hash)
            .map_err(|_| AppError::unauthorized("Invalid credentials"))?;

        let (access_token, claims) = state.tokens.issue(user.id, user.role)?;

        let mut redis_conn = state.redis.get_conn().await?;
        AuthRepository::store_session(
            &mut redis_conn,
            user.id,
            claims.jti,
            state.tokens.refresh_window_secs(),
        )
        .await?;

        info!(user_id = %user.id, "User logged in");

        Ok(AuthResponse {
            access_token,
            token_type: "Bearer".to_string(),
            expires_in: state.tokens.ttl_secs(),
            user: UserResponse::from(user),
        })
    }

    /// Exchanges a (possibly expired) bearer token for a fresh one.
    pub async fn refresh(state: AppState, token: &str) -> AppResult<AuthResponse> {
        let claims = state.tokens.verify_for_refresh(token)?;

        let mut redis_conn = state.redis.get_conn().await?;
        if AuthRepository::is_token_blocked(&mut redis_conn, token).await? {
            return Err(AppError::unauthorized("Token is blocked/revoked"));
        }

        let stored = AuthRepository::get_session(&mut redis_conn, claims.sub).await?;
        if stored.as_deref() != Some(claims.jti.to_string().as_str()) {
            warn!(user_id = %claims.sub, "Refresh attempted with a stale session");
            return Err(AppError::unauthorized("Refresh token expired or invalid"));
        }

        // Role comes from the database so demotions apply on the next refresh.
        let user = AuthRepository::find_user_by_id(&state.db, claims.sub)
            .await?
            .ok_or_else(|| AppError::unauthorized("User not found"))?;

        let (access_token, new_claims) = state.tokens.issue(user.id, user.role)?;
        AuthRepository::store_session(
            &mut redis_conn,
            user.id,
            new_claims.jti,
            state.tokens.refresh_window_secs(),
        )
        .await?;
        AuthRepository::block_token(&mut redis_conn, token, state.tokens.refresh_window_secs()).await?;

        Ok(AuthResponse {
            access_token,
            token_type: "Bearer".to_string(),
            expires_in: state.tokens.ttl_secs(),
            user: UserResponse::from(user),
        })
    }

    pub async fn verify(state: AppState, req: VerifyRequest) -> AppResult<UserResponse> {
        req.validate()?;

        let mut redis_conn = state.redis.get_conn().await?;
        let user_id = AuthRepository::take_verification_token(&mut redis_conn, &req.token)
            .await?
            .ok_or_else(|| AppError::validation("Invalid or expired verification token"))?;

        if !AuthRepository::mark_verified(&state.db, user_id).await? {
            return Err(AppError::not_found("User not found"));
        }

        let user = AuthRepository::find_user_by_id(&state.db, user_id)
            .await?
            .ok_or_else(|| AppError::not_found("User not found"))?;

        info!(user_id = %user_id, "User verified");
        Ok(UserResponse::from(user))
    }

    pub async fn logout(state: AppState, token: &str, claims: &TokenClaims) -> AppResult<()> {
        let mut redis_conn = state.redis.get_conn().await?;
        AuthRepository::block_token(&mut redis_conn, token, remaining_lifetime(claims)).await?;
        AuthRepository::delete_session(&mut redis_conn, claims.sub).await?;
        Ok(())
    }
}
