use crate::modules::auth::model::UserRole;
use crate::modules::parser::model::ParserState;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Default, Deserialize)]
pub struct UserListQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateRoleRequest {
    pub user_id: Uuid,
    pub role: UserRole,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, ToSchema)]
pub struct AdminStats {
    pub users: i64,
    pub admins: i64,
    pub movies: i64,
    pub series: i64,
    pub video_sources: i64,
    pub parser_processed_items: i32,
    pub parser_status: ParserState,
}
