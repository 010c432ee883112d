use crate::modules::auth::model::{User, UserRole};
use anyhow::Result;
use redis::AsyncCommands;
use sqlx::PgPool;
use uuid::Uuid;

/// Columns selected for every `User` read; counters come from the favorites/watchlist tables.
pub(crate) const USER_SELECT: &str = r#"
    SELECT u.id, u.username, u.email, u.full_name, u.role, u.password_hash,
           u.is_verified, u.avatar_url,
           (SELECT COUNT(*) FROM favorites f WHERE f.user_id = u.id) AS favorites_count,
           (SELECT COUNT(*) FROM watchlist w WHERE w.user_id = u.id) AS watchlist_count,
           u.created_at, u.updated_at
    FROM users u
"#;

pub struct AuthRepository;

impl AuthRepository {
    pub async fn create_user(
        pool: &PgPool,
        username: &str,
        email: &str,
        password_hash: &str,
        full_name: &str,
    ) -> Result<User> {
        let id: Uuid = sqlx::query_scalar(
            r#"
            INSERT INTO users (username, email, password_hash, full_name, role)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id
            "#,
        )
        .bind(username)
        .bind(email)
        .bind(password_hash)
        .bind(full_name)
        .bind(UserRole::User)
        .fetch_one(pool)
        .await?;

        let user = Self::find_user_by_id(pool, id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("User vanished after insert"))?;
        Ok(user)
    }

    pub async fn find_user_by_id(pool: &PgPool, id: Uuid) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!("{USER_SELECT} WHERE u.id = $1"))
            .bind(id)
            .fetch_optional(pool)
            .await?;

        Ok(user)
    }

    pub async fn find_user_by_email(pool: &PgPool, email: &str) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!("{USER_SELECT} WHERE LOWER(u.email) = LOWER($1)"))
            .bind(email)
            .fetch_optional(pool)
            .await?;

        Ok(user)
    }

    pub async fn find_user_by_username(pool: &PgPool, username: &str) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!("{USER_SELECT} WHERE u.username = $1"))
            .bind(username)
            .fetch_optional(pool)
            .await?;

        Ok(user)
    }

    pub async fn find_role(pool: &PgPool, id: Uuid) -> Result<Option<UserRole>> {
        let role = sqlx::query_scalar::<_, UserRole>("SELECT role FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await?;

        Ok(role)
    }

    pub async fn mark_verified(pool: &PgPool, id: Uuid) -> Result<bool> {
        let result = sqlx::query("UPDATE users SET is_verified = TRUE, updated_at = NOW() WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    // --- Redis-backed session state ---

    pub async fn store_session(
        redis: &mut redis::aio::MultiplexedConnection,
        user_id: Uuid,
        session_id: Uuid,
        ttl_seconds: u64,
    ) -> Result<()> {
        let key = format!("session:{}", user_id);
        let _: () = redis.set_ex(key, session_id.to_string(), ttl_seconds).await?;
        Ok(())
    }

    pub async fn get_session(
        redis: &mut redis::aio::MultiplexedConnection,
        user_id: Uuid,
    ) -> Result<Option<String>> {
        let key = format!("session:{}", user_id);
        let session: Option<String> = redis.get(key).await?;
        Ok(session)
    }

    pub async fn delete_session(
        redis: &mut redis::aio::MultiplexedConnection,
        user_id: Uuid,
    ) -> Result<()> {
        let key = format!("session:{}", user_id);
        let _: () = redis.del(key).await?;
        Ok(())
    }

    pub async fn block_token(
        redis: &mut redis::aio::MultiplexedConnection,
        token: &str,
        ttl_seconds: u64,
    ) -> Result<()> {
        let key = format!("blocked_token:{}", token);
        let _: () = redis.set_ex(key, "blocked", ttl_seconds).await?;
        Ok(())
    }

    pub async fn is_token_blocked(
        redis: &mut redis::aio::MultiplexedConnection,
        token: &str,
    ) -> Result<bool> {
        let blocked: bool = redis.exists(format!("blocked_token:{}", token)).await?;
        Ok(blocked)
    }

    pub async fn store_verification_token(
        redis: &mut redis::aio::MultiplexedConnection,
        token: &str,
        user_id: Uuid,
        ttl_seconds: u64,
    ) -> Result<()> {
        let key = format!("verify_token:{}", token);
        let _: () = redis.set_ex(key, user_id.to_string(), ttl_seconds).await?;
        Ok(())
    }

    /// Reads and deletes a verification token in one round trip.
    pub async fn take_verification_token(
        redis: &mut redis::aio::MultiplexedConnection,
        token: &str,
    ) -> Result<Option<Uuid>> {
        let key = format!("verify_token:{}", token);
        let value: Option<String> = redis::cmd("GETDEL").arg(&key).query_async(redis).await?;
        Ok(value.and_then(|v| Uuid::parse_str(&v).ok()))
    }
}
