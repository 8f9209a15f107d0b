use actix_web::{delete, get, post, put, web, HttpResponse};
use serde::Deserialize;

use crate::database::MongoDB;
use crate::middleware::auth::{require_admin, ActingUser};
use crate::models::{CreateProgramRequest, ProgramResponse, UpdateProgramRequest};
use crate::services::program_service;
use crate::utils::{AppError, PageParams};

#[derive(Debug, Deserialize, utoipa::IntoParams)]
pub struct ProgramListQuery {
    /// Case-insensitive substring match against name or description.
    pub filter: Option<String>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

/// GET /api/programs - public paginated listing
#[utoipa::path(
    get,
    path = "/api/programs",
    tag = "Programs",
    params(ProgramListQuery),
    responses(
        (status = 200, description = "Paginated program list")
    )
)]
#[get("")]
pub async fn list_programs(
    db: web::Data<MongoDB>,
    query: web::Query<ProgramListQuery>,
) -> Result<HttpResponse, AppError> {
    let params = PageParams::new(query.page, query.limit);
    let data = program_service::list(&db, query.filter.as_deref(), params).await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "data": data,
    })))
}

/// GET /api/programs/{id} - public
#[utoipa::path(
    get,
    path = "/api/programs/{id}",
    tag = "Programs",
    responses(
        (status = 200, description = "Program found", body = ProgramResponse),
        (status = 404, description = "Program not found")
    )
)]
#[get("/{id}")]
pub async fn get_program(
    db: web::Data<MongoDB>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let program = program_service::get(&db, &path.into_inner()).await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "data": program,
    })))
}

/// POST /api/programs - admin only
#[utoipa::path(
    post,
    path = "/api/programs",
    tag = "Programs",
    request_body = CreateProgramRequest,
    responses(
        (status = 201, description = "Program created", body = ProgramResponse),
        (status = 400, description = "Validation failed"),
        (status = 401, description = "Missing or invalid token"),
        (status = 403, description = "Admin role required")
    ),
    security(("bearer_auth" = []))
)]
#[post("")]
pub async fn create_program(
    db: web::Data<MongoDB>,
    user: ActingUser,
    body: web::Json<CreateProgramRequest>,
) -> Result<HttpResponse, AppError> {
    require_admin(&user)?;

    let program = program_service::create(&db, &body).await?;

    Ok(HttpResponse::Created().json(serde_json::json!({
        "success": true,
        "message": "Program created successfully",
        "data": program,
    })))
}

/// PUT /api/programs/{id} - admin only, partial update
#[utoipa::path(
    put,
    path = "/api/programs/{id}",
    tag = "Programs",
    request_body = UpdateProgramRequest,
    responses(
        (status = 200, description = "Program updated", body = ProgramResponse),
        (status = 400, description = "Validation failed"),
        (status = 404, description = "Program not found")
    ),
    security(("bearer_auth" = []))
)]
#[put("/{id}")]
pub async fn update_program(
    db: web::Data<MongoDB>,
    user: ActingUser,
    path: web::Path<String>,
    body: web::Json<UpdateProgramRequest>,
) -> Result<HttpResponse, AppError> {
    require_admin(&user)?;

    let program = program_service::update(&db, &path.into_inner(), &body).await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "message": "Program updated successfully",
        "data": program,
    })))
}

/// DELETE /api/programs/{id} - admin only, no cascade to users
#[utoipa::path(
    delete,
    path = "/api/programs/{id}",
    tag = "Programs",
    responses(
        (status = 200, description = "Program deleted"),
        (status = 404, description = "Program not found")
    ),
    security(("bearer_auth" = []))
)]
#[delete("/{id}")]
pub async fn delete_program(
    db: web::Data<MongoDB>,
    user: ActingUser,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    require_admin(&user)?;

    program_service::delete(&db, &path.into_inner()).await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "message": "Program deleted successfully",
    })))
}
