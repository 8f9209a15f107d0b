use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Program Admin Service API",
        version = "1.0.0",
        description = "Administrative backend for user and program (course/cohort) records.\n\n**Authentication:** JWT Bearer tokens. Program reads are public; mutations require the admin role. A parallel GraphQL surface for programs lives at `/graphql`."
    ),
    paths(
        // Auth endpoints
        crate::api::auth::register,
        crate::api::auth::login,
        crate::api::auth::get_me,

        // Programs
        crate::api::programs::list_programs,
        crate::api::programs::get_program,
        crate::api::programs::create_program,
        crate::api::programs::update_program,
        crate::api::programs::delete_program,

        // Users
        crate::api::users::list_users,
        crate::api::users::get_user,
        crate::api::users::create_user,
        crate::api::users::update_user,

        // Health
        crate::api::health::health_check,
    ),
    components(
        schemas(
            crate::models::RegisterRequest,
            crate::models::LoginRequest,
            crate::models::CreateUserRequest,
            crate::models::UpdateUserRequest,
            crate::models::UserResponse,
            crate::models::AuthData,
            crate::models::Role,
            crate::models::CreateProgramRequest,
            crate::models::UpdateProgramRequest,
            crate::models::ProgramResponse,
            crate::models::ProgramSummary,
            crate::models::ProgramStatus,
            crate::api::health::HealthResponse,
        )
    ),
    tags(
        (name = "Auth", description = "Registration, login and the acting user's own record."),
        (name = "Programs", description = "Program (course/cohort) catalog. Listing and reads are public; mutations are admin-only."),
        (name = "Users", description = "User administration. Listing and creation are admin-only; updates allow self or admin."),
        (name = "Health", description = "Service health check."),
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .description(Some("Enter your JWT token"))
                        .build(),
                ),
            );
        }
    }
}
