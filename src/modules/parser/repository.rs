use super::model::{
    ApiKeys, HistoryAction, LogLevel, ParserHistory, ParserLog, ParserSettings, ParserState, ParserStatus,
};
use crate::modules::content::model::MediaType;
use anyhow::Result;
use async_trait::async_trait;
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

/// Persistence for the parser singletons (status, settings) and its log tables.
#[async_trait]
pub trait ParserStore: Send + Sync {
    async fn status(&self) -> Result<ParserStatus>;

    /// Moves to `next` only when the current state is one of `expected`.
    /// With `begin_run` the status is handed to that run: counters are reset,
    /// `last_run` is stamped and the run id recorded.
    /// Returns `None` when the condition did not match.
    async fn transition(
        &self,
        expected: &[ParserState],
        next: ParserState,
        begin_run: Option<Uuid>,
    ) -> Result<Option<ParserStatus>>;

    /// Resets an `active` status whose `last_run` is older than `cutoff`.
    async fn reset_if_stale(&self, cutoff: OffsetDateTime) -> Result<bool>;

    /// The run-scoped writes below only apply while `run_id` owns an active status.
    /// They return whether the row matched.
    async fn increment_processed(&self, run_id: Uuid) -> Result<bool>;

    async fn push_error(&self, run_id: Uuid, message: &str) -> Result<bool>;

    /// Moves the run's status to `inactive`.
    async fn finish_run(&self, run_id: Uuid) -> Result<Option<ParserStatus>>;

    /// Moves the run's status to `error` and records `message`.
    async fn mark_failed(&self, run_id: Uuid, message: &str) -> Result<Option<ParserStatus>>;

    async fn settings(&self) -> Result<ParserSettings>;

    async fn save_settings(&self, settings: &ParserSettings) -> Result<ParserSettings>;

    async fn append_log(&self, level: LogLevel, message: &str) -> Result<()>;

    /// Newest first.
    async fn recent_logs(&self, limit: i64) -> Result<Vec<ParserLog>>;

    async fn append_history(&self, action: HistoryAction, processed_items: i32, details: Option<&str>) -> Result<()>;

    /// Newest first.
    async fn recent_history(&self, limit: i64) -> Result<Vec<ParserHistory>>;
}

#[derive(Debug, FromRow)]
struct StatusRow {
    status: String,
    run_id: Option<Uuid>,
    last_run: Option<OffsetDateTime>,
    processed_items: i32,
    errors: Vec<String>,
    updated_at: OffsetDateTime,
}

impl From<StatusRow> for ParserStatus {
    fn from(row: StatusRow) -> Self {
        Self {
            status: ParserState::from(row.status),
            run_id: row.run_id,
            last_run: row.last_run,
            processed_items: row.processed_items,
            errors: row.errors,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, FromRow)]
struct SettingsRow {
    kinopoisk_api_key: Option<String>,
    omdb_api_key: Option<String>,
    vk_api_key: Option<String>,
    youtube_api_key: Option<String>,
    rutube_api_key: Option<String>,
    update_interval: i32,
    auto_update: bool,
    content_types: Vec<String>,
}

impl From<SettingsRow> for ParserSettings {
    fn from(row: SettingsRow) -> Self {
        Self {
            api_keys: ApiKeys {
                kinopoisk: row.kinopoisk_api_key,
                omdb: row.omdb_api_key,
                vk: row.vk_api_key,
                youtube: row.youtube_api_key,
                rutube: row.rutube_api_key,
            },
            update_interval: row.update_interval,
            auto_update: row.auto_update,
            content_types: row
                .content_types
                .iter()
                .filter_map(|t| t.parse::<MediaType>().ok())
                .collect(),
        }
    }
}

#[derive(Debug, FromRow)]
struct LogRow {
    id: i64,
    level: String,
    message: String,
    created_at: OffsetDateTime,
}

#[derive(Debug, FromRow)]
struct HistoryRow {
    id: i64,
    action: String,
    processed_items: i32,
    details: Option<String>,
    created_at: OffsetDateTime,
}

const STATUS_COLUMNS: &str = "status, run_id, last_run, processed_items, errors, updated_at";
const SETTINGS_COLUMNS: &str = "kinopoisk_api_key, omdb_api_key, vk_api_key, youtube_api_key, rutube_api_key, update_interval, auto_update, content_types";

#[derive(Clone)]
pub struct PgParserStore {
    pool: PgPool,
}

impl PgParserStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ParserStore for PgParserStore {
    async fn status(&self) -> Result<ParserStatus> {
        let row = sqlx::query_as::<_, StatusRow>(&format!(
            "SELECT {STATUS_COLUMNS} FROM parser_status WHERE id = 1"
        ))
        .fetch_optional(&self.pool)
        .await?;

        Ok(row
            .map(ParserStatus::from)
            .unwrap_or_else(|| ParserStatus::idle(OffsetDateTime::now_utc())))
    }

    async fn transition(
        &self,
        expected: &[ParserState],
        next: ParserState,
        begin_run: Option<Uuid>,
    ) -> Result<Option<ParserStatus>> {
        let expected: Vec<&str> = expected.iter().map(|s| s.as_str()).collect();

        let row = sqlx::query_as::<_, StatusRow>(&format!(
            r#"
            UPDATE parser_status
            SET status = $1,
                run_id = COALESCE($2, run_id),
                last_run = CASE WHEN $2 IS NOT NULL THEN NOW() ELSE last_run END,
                processed_items = CASE WHEN $2 IS NOT NULL THEN 0 ELSE processed_items END,
                errors = CASE WHEN $2 IS NOT NULL THEN '{{}}'::text[] ELSE errors END,
                updated_at = NOW()
            WHERE id = 1 AND status = ANY($3)
            RETURNING {STATUS_COLUMNS}
            "#
        ))
        .bind(next.as_str())
        .bind(begin_run)
        .bind(expected)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(ParserStatus::from))
    }

    async fn reset_if_stale(&self, cutoff: OffsetDateTime) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE parser_status
            SET status = 'inactive', updated_at = NOW()
            WHERE id = 1 AND status = 'active' AND (last_run IS NULL OR last_run < $1)
            "#,
        )
        .bind(cutoff)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn increment_processed(&self, run_id: Uuid) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE parser_status
            SET processed_items = processed_items + 1, updated_at = NOW()
            WHERE id = 1 AND status = 'active' AND run_id = $1
            "#,
        )
        .bind(run_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn push_error(&self, run_id: Uuid, message: &str) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE parser_status
            SET errors = array_append(errors, $2), updated_at = NOW()
            WHERE id = 1 AND status = 'active' AND run_id = $1
            "#,
        )
        .bind(run_id)
        .bind(message)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn finish_run(&self, run_id: Uuid) -> Result<Option<ParserStatus>> {
        let row = sqlx::query_as::<_, StatusRow>(&format!(
            r#"
            UPDATE parser_status
            SET status = 'inactive', updated_at = NOW()
            WHERE id = 1 AND status = 'active' AND run_id = $1
            RETURNING {STATUS_COLUMNS}
            "#
        ))
        .bind(run_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(ParserStatus::from))
    }

    async fn mark_failed(&self, run_id: Uuid, message: &str) -> Result<Option<ParserStatus>> {
        let row = sqlx::query_as::<_, StatusRow>(&format!(
            r#"
            UPDATE parser_status
            SET status = 'error', errors = array_append(errors, $2), updated_at = NOW()
            WHERE id = 1 AND status = 'active' AND run_id = $1
            RETURNING {STATUS_COLUMNS}
            "#
        ))
        .bind(run_id)
        .bind(message)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(ParserStatus::from))
    }

    async fn settings(&self) -> Result<ParserSettings> {
        let row = sqlx::query_as::<_, SettingsRow>(&format!(
            "SELECT {SETTINGS_COLUMNS} FROM parser_settings WHERE id = 1"
        ))
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(ParserSettings::from).unwrap_or_default())
    }

    async fn save_settings(&self, settings: &ParserSettings) -> Result<ParserSettings> {
        let content_types: Vec<&str> = settings.content_types.iter().map(|t| t.as_str()).collect();

        let row = sqlx::query_as::<_, SettingsRow>(&format!(
            r#"
            INSERT INTO parser_settings (id, kinopoisk_api_key, omdb_api_key, vk_api_key, youtube_api_key,
                                         rutube_api_key, update_interval, auto_update, content_types)
            VALUES (1, $1, $2, $3, $4, $5, $6, $7, $8)
            ON CONFLICT (id) DO UPDATE SET
                kinopoisk_api_key = EXCLUDED.kinopoisk_api_key,
                omdb_api_key = EXCLUDED.omdb_api_key,
                vk_api_key = EXCLUDED.vk_api_key,
                youtube_api_key = EXCLUDED.youtube_api_key,
                rutube_api_key = EXCLUDED.rutube_api_key,
                update_interval = EXCLUDED.update_interval,
                auto_update = EXCLUDED.auto_update,
                content_types = EXCLUDED.content_types,
                updated_at = NOW()
            RETURNING {SETTINGS_COLUMNS}
            "#
        ))
        .bind(&settings.api_keys.kinopoisk)
        .bind(&settings.api_keys.omdb)
        .bind(&settings.api_keys.vk)
        .bind(&settings.api_keys.youtube)
        .bind(&settings.api_keys.rutube)
        .bind(settings.update_interval)
        .bind(settings.auto_update)
        .bind(content_types)
        .fetch_one(&self.pool)
        .await?;

        Ok(ParserSettings::from(row))
    }

    async fn append_log(&self, level: LogLevel, message: &str) -> Result<()> {
        sqlx::query("INSERT INTO parser_logs (level, message) VALUES ($1, $2)")
            .bind(level.as_str())
            .bind(message)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn recent_logs(&self, limit: i64) -> Result<Vec<ParserLog>> {
        let rows = sqlx::query_as::<_, LogRow>(
            "SELECT id, level, message, created_at FROM parser_logs ORDER BY created_at DESC, id DESC LIMIT $1",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| ParserLog {
                id: row.id,
                level: LogLevel::from(row.level),
                message: row.message,
                created_at: row.created_at,
            })
            .collect())
    }

    async fn append_history(&self, action: HistoryAction, processed_items: i32, details: Option<&str>) -> Result<()> {
        sqlx::query("INSERT INTO parser_history (action, processed_items, details) VALUES ($1, $2, $3)")
            .bind(action.as_str())
            .bind(processed_items)
            .bind(details)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn recent_history(&self, limit: i64) -> Result<Vec<ParserHistory>> {
        let rows = sqlx::query_as::<_, HistoryRow>(
            r#"
            SELECT id, action, processed_items, details, created_at
            FROM parser_history
            ORDER BY created_at DESC, id DESC
            LIMIT $1
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| ParserHistory {
                id: row.id,
                action: HistoryAction::from(row.action),
                processed_items: row.processed_items,
                details: row.details,
                created_at: row.created_at,
            })
            .collect())
    }
}
