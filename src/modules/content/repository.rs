use sqlx::PgPool;
use uuid::Uuid;
use super::model::{ContentStatus, Media, MediaRow, MediaType, NewVideoSource, VideoSource, VideoSourceRow};
use anyhow::Result;
use async_trait::async_trait;

const MEDIA_COLUMNS: &str = "id, media_type, title, slug, description, poster_url, release_date, rating, kinopoisk_id, status, created_at, updated_at";

/// Media persistence used by the video-resolution pipeline.
#[async_trait]
pub trait MediaStore: Send + Sync {
    async fn find_media(&self, id: Uuid) -> Result<Option<Media>>;

    async fn set_status(&self, id: Uuid, status: ContentStatus) -> Result<()>;

    /// Replaces every stored source of the media item.
    async fn replace_sources(&self, media_id: Uuid, sources: &[NewVideoSource]) -> Result<()>;

    /// Items that still need sources: `DRAFT` or `NO_SOURCES` with a Kinopoisk id.
    async fn pending_media(&self, media_types: &[MediaType], limit: i64) -> Result<Vec<Media>>;
}

#[derive(Clone)]
pub struct ContentRepository {
    pool: PgPool,
}

impl ContentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn get_media_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Media>> {
        let row = sqlx::query_as::<_, MediaRow>(&format!("SELECT {MEDIA_COLUMNS} FROM media WHERE id = $1"))
            .bind(id)
            .fetch_optional(pool)
            .await?;
        Ok(row.map(Media::from))
    }

    pub async fn get_media_sources(pool: &PgPool, media_id: Uuid) -> Result<Vec<VideoSource>> {
        let rows = sqlx::query_as::<_, VideoSourceRow>(
            r#"
            SELECT id, media_id, provider, kind, url, quality, created_at
            FROM video_sources
            WHERE media_id = $1
            ORDER BY kind, created_at
            "#,
        )
        .bind(media_id)
        .fetch_all(pool)
        .await?;
        Ok(rows.into_iter().map(VideoSource::from).collect())
    }

    pub async fn list_media(
        pool: &PgPool,
        media_type: Option<MediaType>,
        status: Option<ContentStatus>,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<Media>, i64)> {
        let media_type = media_type.map(|t| t.as_str());
        let status = status.map(|s| s.as_str());

        let rows = sqlx::query_as::<_, MediaRow>(&format!(
            r#"
            SELECT {MEDIA_COLUMNS} FROM media
            WHERE ($1::text IS NULL OR media_type = $1)
              AND ($2::text IS NULL OR status = $2)
            ORDER BY created_at DESC
            LIMIT $3 OFFSET $4
            "#
        ))
        .bind(media_type)
        .bind(status)
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await?;

        let total: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM media
            WHERE ($1::text IS NULL OR media_type = $1)
              AND ($2::text IS NULL OR status = $2)
            "#,
        )
        .bind(media_type)
        .bind(status)
        .fetch_one(pool)
        .await?;

        Ok((rows.into_iter().map(Media::from).collect(), total))
    }

    pub async fn delete_media(pool: &PgPool, id: Uuid) -> Result<bool> {
        // video_sources cascade
        let result = sqlx::query("DELETE FROM media WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl MediaStore for ContentRepository {
    async fn find_media(&self, id: Uuid) -> Result<Option<Media>> {
        Self::get_media_by_id(&self.pool, id).await
    }

    async fn set_status(&self, id: Uuid, status: ContentStatus) -> Result<()> {
        sqlx::query("UPDATE media SET status = $1, updated_at = NOW() WHERE id = $2")
            .bind(status.as_str())
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn replace_sources(&self, media_id: Uuid, sources: &[NewVideoSource]) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM video_sources WHERE media_id = $1")
            .bind(media_id)
            .execute(&mut *tx)
            .await?;

        for source in sources {
            sqlx::query(
                r#"
                INSERT INTO video_sources (media_id, provider, kind, url, quality)
                VALUES ($1, $2, $3, $4, $5)
                ON CONFLICT (media_id, url) DO NOTHING
                "#,
            )
            .bind(media_id)
            .bind(&source.provider)
            .bind(source.kind.as_str())
            .bind(&source.url)
            .bind(&source.quality)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn pending_media(&self, media_types: &[MediaType], limit: i64) -> Result<Vec<Media>> {
        let types: Vec<&str> = media_types.iter().map(|t| t.as_str()).collect();

        let rows = sqlx::query_as::<_, MediaRow>(&format!(
            r#"
            SELECT {MEDIA_COLUMNS} FROM media
            WHERE status IN ('DRAFT', 'NO_SOURCES')
              AND kinopoisk_id IS NOT NULL
              AND media_type = ANY($1)
            ORDER BY updated_at ASC
            LIMIT $2
            "#
        ))
        .bind(types)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Media::from).collect())
    }
}
