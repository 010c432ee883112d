use crate::modules::auth::model::User;
use crate::modules::auth::repository::AuthRepository;
use anyhow::{anyhow, Result};
use sqlx::PgPool;
use uuid::Uuid;

pub struct ProfileRepository;

impl ProfileRepository {
    pub async fn update(
        pool: &PgPool,
        id: Uuid,
        username: Option<String>,
        email: Option<String>,
        full_name: Option<String>,
    ) -> Result<User> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET
                username = COALESCE($1, username),
                email = COALESCE($2, email),
                full_name = COALESCE($3, full_name),
                updated_at = NOW()
            WHERE id = $4
            "#,
        )
        .bind(username)
        .bind(email)
        .bind(full_name)
        .bind(id)
        .execute(pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(anyhow!(sqlx::Error::RowNotFound));
        }

        AuthRepository::find_user_by_id(pool, id)
            .await?
            .ok_or_else(|| anyhow!(sqlx::Error::RowNotFound))
    }

    /// Sets the avatar and returns the previous URL, if any.
    pub async fn set_avatar(pool: &PgPool, id: Uuid, avatar_url: &str) -> Result<Option<String>> {
        let mut tx = pool.begin().await?;

        let previous: Option<Option<String>> =
            sqlx::query_scalar("SELECT avatar_url FROM users WHERE id = $1 FOR UPDATE")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?;
        let previous = previous.ok_or_else(|| anyhow!(sqlx::Error::RowNotFound))?;

        sqlx::query("UPDATE users SET avatar_url = $1, updated_at = NOW() WHERE id = $2")
            .bind(avatar_url)
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(previous)
    }
}
