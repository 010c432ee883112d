use super::model::{ApiKeys, ParserSettings, ParserStatus};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

pub const DEFAULT_LOG_LIMIT: i64 = 50;
pub const MAX_LOG_LIMIT: i64 = 500;

/// What the admin parser page renders.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, ToSchema)]
pub struct ParserOverview {
    pub settings: ParserSettings,
    pub status: ParserStatus,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ParserAction {
    Start,
    Stop,
}

#[derive(Debug, Deserialize)]
pub struct ParserActionQuery {
    pub action: ParserAction,
}

/// Optional body of a start request; present keys override the stored ones for that run.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct StartParserRequest {
    #[serde(default)]
    pub api_keys: ApiKeys,
}

#[derive(Debug, Default, Deserialize)]
pub struct LimitQuery {
    pub limit: Option<i64>,
}

impl LimitQuery {
    pub fn limit(&self) -> i64 {
        self.limit.unwrap_or(DEFAULT_LOG_LIMIT).clamp(1, MAX_LOG_LIMIT)
    }
}
