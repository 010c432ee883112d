use crate::modules::auth::model::{User, UserRole};
use crate::modules::auth::repository::USER_SELECT;
use anyhow::Result;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

#[derive(Debug, FromRow)]
pub struct CatalogCounts {
    pub users: i64,
    pub admins: i64,
    pub movies: i64,
    pub series: i64,
    pub video_sources: i64,
}

pub struct AdminRepository;

impl AdminRepository {
    pub async fn list_users(pool: &PgPool, limit: i64, offset: i64) -> Result<(Vec<User>, i64)> {
        let users = sqlx::query_as::<_, User>(&format!(
            "{USER_SELECT} ORDER BY u.created_at DESC LIMIT $1 OFFSET $2"
        ))
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await?;

        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(pool)
            .await?;

        Ok((users, total))
    }

    pub async fn set_role(pool: &PgPool, user_id: Uuid, role: UserRole) -> Result<bool> {
        let result = sqlx::query("UPDATE users SET role = $1, updated_at = NOW() WHERE id = $2")
            .bind(role)
            .bind(user_id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn counts(pool: &PgPool) -> Result<CatalogCounts> {
        let counts = sqlx::query_as::<_, CatalogCounts>(
            r#"
            SELECT
                (SELECT COUNT(*) FROM users) AS users,
                (SELECT COUNT(*) FROM users WHERE role = 'ADMIN') AS admins,
                (SELECT COUNT(*) FROM media WHERE media_type = 'movie') AS movies,
                (SELECT COUNT(*) FROM media WHERE media_type = 'series') AS series,
                (SELECT COUNT(*) FROM video_sources) AS video_sources
            "#,
        )
        .fetch_one(pool)
        .await?;

        Ok(counts)
    }
}
