use actix_web::{web, HttpResponse, Responder};
use async_graphql::http::GraphiQLSource;
use async_graphql::{Context, EmptySubscription, Object, Result as GqlResult, Schema, SimpleObject, ID};
use async_graphql_actix_web::{GraphQLRequest, GraphQLResponse};
use std::str::FromStr;

use crate::database::MongoDB;
use crate::middleware::auth::ActingUser;
use crate::models::{
    CreateProgramRequest, ProgramResponse, ProgramStatus, Role, UpdateProgramRequest,
};
use crate::services::program_service;
use crate::utils::{AppError, PageParams};

pub type AppSchema = Schema<QueryRoot, MutationRoot, EmptySubscription>;

/// Program as exposed over GraphQL. Dates are RFC 3339 strings.
#[derive(SimpleObject)]
#[graphql(name = "Program")]
pub struct GqlProgram {
    pub id: ID,
    pub name: String,
    pub description: String,
    pub start_date: String,
    pub status: String,
    pub created_at: String,
    pub updated_at: String,
}

impl From<ProgramResponse> for GqlProgram {
    fn from(p: ProgramResponse) -> Self {
        GqlProgram {
            id: ID(p.id),
            name: p.name,
            description: p.description,
            start_date: p.start_date.to_rfc3339(),
            status: serde_json::to_value(p.status)
                .ok()
                .and_then(|v| v.as_str().map(str::to_string))
                .unwrap_or_default(),
            created_at: p.created_at.to_rfc3339(),
            updated_at: p.updated_at.to_rfc3339(),
        }
    }
}

/// Pagination envelope, mirroring the REST listing shape.
#[derive(SimpleObject)]
pub struct ProgramPage {
    pub items: Vec<GqlProgram>,
    pub total: i64,
    pub page: i64,
    pub pages: i64,
}

/// Outcome of resolving the bearer token, carried into the schema context.
/// Keeping the extraction error (expired token, unknown user) lets the guard
/// report it verbatim instead of collapsing everything to "no token".
pub struct AuthAttempt(pub Result<ActingUser, AppError>);

/// Mutations share the REST admin guard: the REST surface requires an admin
/// bearer token for program writes, so the GraphQL surface does too.
fn require_admin(ctx: &Context<'_>) -> GqlResult<()> {
    let attempt = ctx.data_opt::<AuthAttempt>().ok_or_else(|| {
        async_graphql::Error::new("Access denied. No token provided.")
    })?;
    match &attempt.0 {
        Ok(user) if user.role == Role::Admin => Ok(()),
        Ok(_) => Err(async_graphql::Error::new(
            "Access denied. Admin role required.",
        )),
        Err(err) => Err(async_graphql::Error::new(err.to_string())),
    }
}

pub struct QueryRoot;

#[Object]
impl QueryRoot {
    /// Paginated program listing; filter is a case-insensitive substring
    /// match against name or description.
    async fn programs(
        &self,
        ctx: &Context<'_>,
        filter: Option<String>,
        page: Option<i64>,
        limit: Option<i64>,
    ) -> GqlResult<ProgramPage> {
        let db = ctx.data::<MongoDB>()?;
        let params = PageParams::new(page, limit);

        let result = program_service::list(db, filter.as_deref(), params).await?;

        Ok(ProgramPage {
            items: result.items.into_iter().map(GqlProgram::from).collect(),
            total: result.total as i64,
            page: result.page,
            pages: result.pages as i64,
        })
    }

    async fn program(&self, ctx: &Context<'_>, id: ID) -> GqlResult<GqlProgram> {
        let db = ctx.data::<MongoDB>()?;
        let program = program_service::get(db, &id.0).await?;
        Ok(program.into())
    }
}

pub struct MutationRoot;

#[Object]
impl MutationRoot {
    async fn create_program(
        &self,
        ctx: &Context<'_>,
        name: String,
        description: String,
        start_date: String,
    ) -> GqlResult<GqlProgram> {
        require_admin(ctx)?;
        let db = ctx.data::<MongoDB>()?;

        let request = CreateProgramRequest {
            name,
            description,
            start_date,
        };
        let program = program_service::create(db, &request).await?;
        Ok(program.into())
    }

    async fn update_program(
        &self,
        ctx: &Context<'_>,
        id: ID,
        name: Option<String>,
        description: Option<String>,
        start_date: Option<String>,
        status: Option<String>,
    ) -> GqlResult<GqlProgram> {
        require_admin(ctx)?;
        let db = ctx.data::<MongoDB>()?;

        let status = status
            .map(|s| ProgramStatus::from_str(&s))
            .transpose()
            .map_err(async_graphql::Error::new)?;

        let request = UpdateProgramRequest {
            name,
            description,
            start_date,
            status,
        };
        let program = program_service::update(db, &id.0, &request).await?;
        Ok(program.into())
    }

    async fn delete_program(&self, ctx: &Context<'_>, id: ID) -> GqlResult<bool> {
        require_admin(ctx)?;
        let db = ctx.data::<MongoDB>()?;

        program_service::delete(db, &id.0).await?;
        Ok(true)
    }
}

pub fn build_schema(db: MongoDB) -> AppSchema {
    Schema::build(QueryRoot, MutationRoot, EmptySubscription)
        .data(db)
        .finish()
}

/// POST /graphql. The bearer-token resolution, successful or not, is injected
/// into the request context for the mutation guard.
pub async fn graphql_handler(
    schema: web::Data<AppSchema>,
    user: Result<ActingUser, AppError>,
    request: GraphQLRequest,
) -> GraphQLResponse {
    let request = request.into_inner().data(AuthAttempt(user));
    schema.execute(request).await.into()
}

/// GET /graphql - GraphiQL playground (not served in production).
pub async fn graphql_playground() -> impl Responder {
    HttpResponse::Ok()
        .content_type("text/html; charset=utf-8")
        .body(GraphiQLSource::build().endpoint("/graphql").finish())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn bare_schema() -> Schema<QueryRoot, MutationRoot, EmptySubscription> {
        Schema::build(QueryRoot, MutationRoot, EmptySubscription).finish()
    }

    #[actix_rt::test]
    async fn mutation_without_token_is_denied() {
        let schema = bare_schema();
        let response = schema
            .execute(
                r#"mutation {
                    createProgram(name: "X", description: "Y", startDate: "2026-09-01") { id }
                }"#,
            )
            .await;

        assert!(!response.errors.is_empty());
        assert!(response.errors[0].message.contains("No token provided"));
    }

    #[actix_rt::test]
    async fn delete_without_token_is_denied() {
        let schema = bare_schema();
        let response = schema
            .execute(r#"mutation { deleteProgram(id: "64f000000000000000000001") }"#)
            .await;

        assert!(!response.errors.is_empty());
    }

    #[actix_rt::test]
    async fn mutation_with_rejected_token_reports_the_rejection() {
        // An expired or tampered token fails extraction with its own message;
        // the guard must not fold that into "no token provided".
        let schema = bare_schema();
        let request =
            async_graphql::Request::new(r#"mutation { deleteProgram(id: "64f000000000000000000001") }"#)
                .data(AuthAttempt(Err(AppError::Unauthenticated(
                    "Invalid token.".to_string(),
                ))));

        let response = schema.execute(request).await;
        assert!(!response.errors.is_empty());
        assert_eq!(response.errors[0].message, "Invalid token.");
    }

    #[actix_rt::test]
    async fn mutation_as_student_is_forbidden() {
        let schema = bare_schema();
        let student = ActingUser {
            id: mongodb::bson::oid::ObjectId::new(),
            full_name: "Test Student".to_string(),
            email: "student@example.com".to_string(),
            role: Role::Student,
            program_id: None,
        };
        let request =
            async_graphql::Request::new(r#"mutation { deleteProgram(id: "64f000000000000000000001") }"#)
                .data(AuthAttempt(Ok(student)));

        let response = schema.execute(request).await;
        assert!(!response.errors.is_empty());
        assert!(response.errors[0].message.contains("Admin role required"));
    }

    #[test]
    fn program_conversion_formats_fields() {
        let created = Utc.with_ymd_and_hms(2026, 1, 15, 12, 0, 0).unwrap();
        let response = ProgramResponse {
            id: "64f000000000000000000001".to_string(),
            name: "Medical".to_string(),
            description: "Cohort".to_string(),
            start_date: created,
            status: ProgramStatus::Active,
            created_at: created,
            updated_at: created,
        };

        let gql = GqlProgram::from(response);
        assert_eq!(gql.status, "active");
        assert!(gql.start_date.starts_with("2026-01-15T12:00:00"));
    }
}
