use super::dto::TokenClaims;
use super::model::UserRole;
use crate::common::error::{AppError, AppResult};
use anyhow::anyhow;
use jsonwebtoken::{decode, encode, get_current_timestamp, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use uuid::Uuid;

/// Issues and verifies HS256 access tokens.
#[derive(Clone)]
pub struct TokenIssuer {
    secret: String,
    ttl_secs: u64,
    refresh_window_secs: u64,
}

impl TokenIssuer {
    pub fn new(secret: &str, ttl_secs: u64, refresh_window_secs: u64) -> Self {
        Self {
            secret: secret.to_string(),
            ttl_secs,
            refresh_window_secs,
        }
    }

    pub fn ttl_secs(&self) -> u64 {
        self.ttl_secs
    }

    pub fn refresh_window_secs(&self) -> u64 {
        self.refresh_window_secs
    }

    pub fn issue(&self, user_id: Uuid, role: UserRole) -> AppResult<(String, TokenClaims)> {
        self.issue_at(user_id, role, get_current_timestamp())
    }

    pub(crate) fn issue_at(&self, user_id: Uuid, role: UserRole, now: u64) -> AppResult<(String, TokenClaims)> {
        let claims = TokenClaims {
            sub: user_id,
            role: role.to_string(),
            jti: Uuid::new_v4(),
            iat: now,
            exp: now + self.ttl_secs,
        };

        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )
        .map_err(|e| AppError::Internal(anyhow!("Failed to sign token: {}", e)))?;

        Ok((token, claims))
    }

    /// Verifies signature and expiry.
    pub fn verify(&self, token: &str) -> AppResult<TokenClaims> {
        let validation = Validation::new(Algorithm::HS256);
        self.decode_with(token, &validation)
    }

    /// Verifies signature only; the token may be expired but must have been
    /// issued within the refresh window.
    pub fn verify_for_refresh(&self, token: &str) -> AppResult<TokenClaims> {
        self.verify_for_refresh_at(token, get_current_timestamp())
    }

    pub(crate) fn verify_for_refresh_at(&self, token: &str, now: u64) -> AppResult<TokenClaims> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.required_spec_claims.clear();

        let claims = self.decode_with(token, &validation)?;
        if now.saturating_sub(claims.iat) > self.refresh_window_secs {
            return Err(AppError::unauthorized("Session expired, please log in again"));
        }
        Ok(claims)
    }

    fn decode_with(&self, token: &str, validation: &Validation) -> AppResult<TokenClaims> {
        decode::<TokenClaims>(
            token,
            &DecodingKey::from_secret(self.secret.as_bytes()),
            validation,
        )
        .map(|data| data.claims)
        .map_err(|e| match e.kind() {
            jsonwebtoken::errors::ErrorKind::ExpiredSignature => AppError::unauthorized("Token expired"),
            _ => AppError::unauthorized("Invalid token"),
        })
    }
}

/// Seconds until the token expires, at least one so Redis accepts it as a TTL.
pub fn remaining_lifetime(claims: &TokenClaims) -> u64 {
    claims.exp.saturating_sub(get_current_timestamp()).max(1)
}
