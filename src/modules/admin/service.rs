use super::dto::{AdminStats, UpdateRoleRequest, UserListQuery};
use super::repository::AdminRepository;
use crate::common::error::{AppError, AppResult};
use crate::modules::auth::dto::UserResponse;
use crate::modules::auth::model::UserRole;
use crate::modules::auth::repository::AuthRepository;
use crate::modules::content::dto::{paginate, Page};
use crate::state::AppState;
use tracing::info;
use uuid::Uuid;

pub struct AdminService;

impl AdminService {
    pub async fn list_users(state: AppState, query: UserListQuery) -> AppResult<Page<UserResponse>> {
        let (page, limit, offset) = paginate(query.page, query.limit);
        let (users, total) = AdminRepository::list_users(&state.db, limit, offset).await?;

        Ok(Page {
            items: users.into_iter().map(UserResponse::from).collect(),
            page,
            limit,
            total,
        })
    }

    pub async fn update_role(state: AppState, acting_admin: Uuid, req: UpdateRoleRequest) -> AppResult<UserResponse> {
        ensure_not_self_demotion(acting_admin, &req)?;

        if !AdminRepository::set_role(&state.db, req.user_id, req.role).await? {
            return Err(AppError::not_found("User not found"));
        }

        let user = AuthRepository::find_user_by_id(&state.db, req.user_id)
            .await?
            .ok_or_else(|| AppError::not_found("User not found"))?;

        info!(admin_id = %acting_admin, user_id = %req.user_id, "Role changed to {}", req.role);
        Ok(UserResponse::from(user))
    }

    pub async fn stats(state: AppState) -> AppResult<AdminStats> {
        let counts = AdminRepository::counts(&state.db).await?;
        let parser = state.parser.status().await?;

        Ok(AdminStats {
            users: counts.users,
            admins: counts.admins,
            movies: counts.movies,
            series: counts.series,
            video_sources: counts.video_sources,
            parser_processed_items: parser.processed_items,
            parser_status: parser.status,
        })
    }
}

fn ensure_not_self_demotion(acting_admin: Uuid, req: &UpdateRoleRequest) -> AppResult<()> {
    if req.user_id == acting_admin && req.role != UserRole::Admin {
        return Err(AppError::validation("You cannot remove your own admin role"));
    }
    Ok(())
}
