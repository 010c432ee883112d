use super::dto::UpdateProfileRequest;
use super::repository::ProfileRepository;
use crate::common::error::{AppError, AppResult};
use crate::common::upload;
use crate::modules::auth::dto::UserResponse;
use crate::modules::auth::repository::AuthRepository;
use crate::state::AppState;
use axum::extract::multipart::Field;
use tracing::{info, warn};
use uuid::Uuid;
use validator::Validate;

pub struct ProfileService;

impl ProfileService {
    pub async fn get(state: AppState, user_id: Uuid) -> AppResult<UserResponse> {
        let user = AuthRepository::find_user_by_id(&state.db, user_id)
            .await?
            .ok_or_else(|| AppError::unauthorized("User not found"))?;

        Ok(UserResponse::from(user))
    }

    pub async fn update(state: AppState, user_id: Uuid, req: UpdateProfileRequest) -> AppResult<UserResponse> {
        req.validate()?;
        if req.is_empty() {
            return Err(AppError::validation("Nothing to update"));
        }

        if let Some(email) = &req.email {
            if let Some(existing) = AuthRepository::find_user_by_email(&state.db, email).await? {
                if existing.id != user_id {
                    return Err(AppError::conflict("Email already exists"));
                }
            }
        }

        if let Some(username) = &req.username {
            if let Some(existing) = AuthRepository::find_user_by_username(&state.db, username).await? {
                if existing.id != user_id {
                    return Err(AppError::conflict("Username already exists"));
                }
            }
        }

        let user = ProfileRepository::update(&state.db, user_id, req.username, req.email, req.full_name).await?;
        info!(user_id = %user_id, "Profile updated");
        Ok(UserResponse::from(user))
    }

    pub async fn upload_avatar(state: AppState, user_id: Uuid, field: Field<'_>) -> AppResult<UserResponse> {
        let url = upload::store_avatar(&state.storage, field, user_id).await?;
        let previous = ProfileRepository::set_avatar(&state.db, user_id, &url).await?;

        if let Some(key) = previous.as_deref().and_then(|old| state.storage.key_from_url(old)) {
            if let Err(e) = state.storage.delete_object(key).await {
                warn!("Failed to delete previous avatar {}: {}", key, e);
            }
        }

        Self::get(state, user_id).await
    }
}
