use crate::modules::content::model::MediaType;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use time::OffsetDateTime;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

pub const MIN_UPDATE_INTERVAL_HOURS: i32 = 1;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ParserState {
    Active,
    Inactive,
    Error,
}

impl ParserState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ParserState::Active => "active",
            ParserState::Inactive => "inactive",
            ParserState::Error => "error",
        }
    }
}

impl fmt::Display for ParserState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<String> for ParserState {
    fn from(s: String) -> Self {
        match s.as_str() {
            "active" => ParserState::Active,
            "error" => ParserState::Error,
            _ => ParserState::Inactive,
        }
    }
}

/// The global run-status singleton.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, ToSchema)]
pub struct ParserStatus {
    pub status: ParserState,
    /// Identifies the run that owns the counters; writes from any other run are ignored.
    pub run_id: Option<Uuid>,
    #[serde(with = "time::serde::rfc3339::option")]
    #[schema(value_type = Option<String>, format = DateTime)]
    pub last_run: Option<OffsetDateTime>,
    pub processed_items: i32,
    pub errors: Vec<String>,
    #[serde(with = "time::serde::rfc3339")]
    #[schema(value_type = String, format = DateTime)]
    pub updated_at: OffsetDateTime,
}

impl ParserStatus {
    pub fn idle(now: OffsetDateTime) -> Self {
        Self {
            status: ParserState::Inactive,
            run_id: None,
            last_run: None,
            processed_items: 0,
            errors: Vec::new(),
            updated_at: now,
        }
    }

    pub fn owned_by(&self, run_id: Uuid) -> bool {
        self.status == ParserState::Active && self.run_id == Some(run_id)
    }

    /// An active run whose `last_run` is older than `threshold` (or missing) is presumed crashed.
    pub fn is_stale(&self, now: OffsetDateTime, threshold: Duration) -> bool {
        if self.status != ParserState::Active {
            return false;
        }
        match self.last_run {
            Some(last_run) => now - last_run >= threshold,
            None => true,
        }
    }
}

#[derive(Debug, Default, Serialize, Deserialize, Clone, PartialEq, Eq, ToSchema)]
pub struct ApiKeys {
    pub kinopoisk: Option<String>,
    pub omdb: Option<String>,
    pub vk: Option<String>,
    pub youtube: Option<String>,
    pub rutube: Option<String>,
}

impl ApiKeys {
    /// Overwrites keys that are present (and non-blank) in `overrides`.
    pub fn merge(&mut self, overrides: &ApiKeys) {
        fn pick(target: &mut Option<String>, value: &Option<String>) {
            if let Some(v) = value.as_deref().map(str::trim).filter(|v| !v.is_empty()) {
                *target = Some(v.to_string());
            }
        }

        pick(&mut self.kinopoisk, &overrides.kinopoisk);
        pick(&mut self.omdb, &overrides.omdb);
        pick(&mut self.vk, &overrides.vk);
        pick(&mut self.youtube, &overrides.youtube);
        pick(&mut self.rutube, &overrides.rutube);
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Validate, ToSchema)]
pub struct ParserSettings {
    pub api_keys: ApiKeys,
    /// Hours between automatic runs.
    #[validate(range(min = 1, max = 168, message = "update_interval must be between 1 and 168 hours"))]
    pub update_interval: i32,
    pub auto_update: bool,
    #[validate(length(min = 1, message = "At least one content type is required"))]
    pub content_types: Vec<MediaType>,
}

impl Default for ParserSettings {
    fn default() -> Self {
        Self {
            api_keys: ApiKeys::default(),
            update_interval: 24,
            auto_update: false,
            content_types: vec![MediaType::Movie, MediaType::Series],
        }
    }
}

impl ParserSettings {
    pub fn update_period(&self) -> Duration {
        Duration::from_secs(self.update_interval.max(MIN_UPDATE_INTERVAL_HOURS) as u64 * 3600)
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Info,
    Warning,
    Error,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Info => "info",
            LogLevel::Warning => "warning",
            LogLevel::Error => "error",
        }
    }
}

impl From<String> for LogLevel {
    fn from(s: String) -> Self {
        match s.as_str() {
            "warning" => LogLevel::Warning,
            "error" => LogLevel::Error,
            _ => LogLevel::Info,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, ToSchema)]
pub struct ParserLog {
    pub id: i64,
    pub level: LogLevel,
    pub message: String,
    #[serde(with = "time::serde::rfc3339")]
    #[schema(value_type = String, format = DateTime)]
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum HistoryAction {
    Started,
    Stopped,
    Completed,
    Failed,
    StaleReset,
}

impl HistoryAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            HistoryAction::Started => "started",
            HistoryAction::Stopped => "stopped",
            HistoryAction::Completed => "completed",
            HistoryAction::Failed => "failed",
            HistoryAction::StaleReset => "stale_reset",
        }
    }
}

impl From<String> for HistoryAction {
    fn from(s: String) -> Self {
        match s.as_str() {
            "stopped" => HistoryAction::Stopped,
            "completed" => HistoryAction::Completed,
            "failed" => HistoryAction::Failed,
            "stale_reset" => HistoryAction::StaleReset,
            _ => HistoryAction::Started,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, ToSchema)]
pub struct ParserHistory {
    pub id: i64,
    pub action: HistoryAction,
    pub processed_items: i32,
    pub details: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    #[schema(value_type = String, format = DateTime)]
    pub created_at: OffsetDateTime,
}
