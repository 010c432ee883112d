use super::dto::{paginate, ContentListQuery, MediaResponse, Page};
use super::model::{ContentStatus, Media, MediaType};
use super::repository::ContentRepository;
use crate::common::error::{AppError, AppResult};
use crate::state::AppState;
use tracing::info;
use uuid::Uuid;

pub struct ContentService;

impl ContentService {
    pub async fn get_media(state: AppState, id: Uuid) -> AppResult<MediaResponse> {
        let media = ContentRepository::get_media_by_id(&state.db, id)
            .await?
            .ok_or_else(|| AppError::not_found("Movie not found"))?;

        let sources = ContentRepository::get_media_sources(&state.db, media.id).await?;

        Ok(MediaResponse { media, sources })
    }

    pub async fn list_media(state: AppState, query: ContentListQuery) -> AppResult<Page<Media>> {
        let media_type = query
            .media_type
            .as_deref()
            .map(str::parse::<MediaType>)
            .transpose()
            .map_err(AppError::Validation)?;
        let status = query
            .status
            .map(|s| s.to_ascii_uppercase())
            .map(ContentStatus::from);

        let (page, limit, offset) = paginate(query.page, query.limit);
        let (items, total) = ContentRepository::list_media(&state.db, media_type, status, limit, offset).await?;

        Ok(Page { items, page, limit, total })
    }

    pub async fn delete_media(state: AppState, id: Uuid) -> AppResult<()> {
        if !ContentRepository::delete_media(&state.db, id).await? {
            return Err(AppError::not_found("Content not found"));
        }
        info!(media_id = %id, "Deleted media");
        Ok(())
    }
}
