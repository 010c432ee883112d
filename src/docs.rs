use utoipa::OpenApi;
use crate::modules::admin::dto::*;
use crate::modules::auth::dto::*;
use crate::modules::auth::model::UserRole;
use crate::modules::content::dto::MediaResponse;
use crate::modules::content::model::{ContentStatus, Media, MediaType, SourceKind, VideoSource};
use crate::modules::parser::dto::{ParserAction, ParserOverview, StartParserRequest};
use crate::modules::parser::model::*;
use crate::modules::profile::dto::UpdateProfileRequest;

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::modules::auth::handler::register,
        crate::modules::auth::handler::login,
        crate::modules::auth::handler::logout,
        crate::modules::auth::handler::refresh,
        crate::modules::auth::handler::verify,
        crate::modules::profile::handler::get_profile,
        crate::modules::profile::handler::update_profile,
        crate::modules::profile::handler::upload_avatar,
        crate::modules::content::handler::get_movie,
        crate::modules::admin::handler::list_users,
        crate::modules::admin::handler::update_role,
        crate::modules::admin::handler::get_stats,
        crate::modules::admin::handler::list_content,
        crate::modules::admin::handler::delete_content,
        crate::modules::parser::handler::get_parser,
        crate::modules::parser::handler::control_parser,
        crate::modules::parser::handler::update_settings,
        crate::modules::parser::handler::list_logs,
        crate::modules::parser::handler::list_history,
    ),
    components(
        schemas(
            RegisterRequest, LoginRequest, VerifyRequest, AuthResponse, UserResponse, UserRole,
            UpdateProfileRequest,
            Media, MediaResponse, MediaType, ContentStatus, SourceKind, VideoSource,
            UpdateRoleRequest, AdminStats,
            ParserOverview, ParserAction, StartParserRequest,
            ParserState, ParserStatus, ParserSettings, ApiKeys,
            ParserLog, LogLevel, ParserHistory, HistoryAction,
        )
    ),
    tags(
        (name = "Auth", description = "Authentication endpoints"),
        (name = "Profile", description = "Current user profile"),
        (name = "Content", description = "Movie and series catalog"),
        (name = "Admin", description = "User and catalog administration"),
        (name = "Parser", description = "Content parser control")
    ),
    security(
        ("bearer_auth" = [])
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

use utoipa::Modify;
use utoipa::openapi::security::{SecurityScheme, HttpAuthScheme, HttpBuilder};

pub struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parser_routes_are_documented() {
        let doc = ApiDoc::openapi();
        assert!(doc.paths.paths.contains_key("/api/admin/parser"));
        assert!(doc.paths.paths.contains_key("/api/admin/parser/history"));
        assert!(doc.paths.paths.contains_key("/api/auth/login"));
    }
}
