use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use super::model::{Media, VideoSource};

pub const DEFAULT_PAGE_SIZE: i64 = 20;
pub const MAX_PAGE_SIZE: i64 = 100;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MediaResponse {
    pub media: Media,
    pub sources: Vec<VideoSource>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ContentListQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub media_type: Option<String>,
    pub status: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct DeleteContentQuery {
    pub id: Uuid,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: i64,
    pub limit: i64,
    pub total: i64,
}

/// Clamps 1-based page/limit query values and returns `(page, limit, offset)`.
pub fn paginate(page: Option<i64>, limit: Option<i64>) -> (i64, i64, i64) {
    let page = page.unwrap_or(1).max(1);
    let limit = limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE);
    (page, limit, (page - 1) * limit)
}
