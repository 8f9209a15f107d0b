use actix_web::{get, post, put, web, HttpResponse};
use serde::Deserialize;

use crate::database::MongoDB;
use crate::middleware::auth::{require_admin, require_self_or_admin, ActingUser};
use crate::models::{CreateUserRequest, UpdateUserRequest, UserResponse};
use crate::services::user_service;
use crate::utils::{AppError, PageParams};

#[derive(Debug, Deserialize, utoipa::IntoParams)]
#[serde(rename_all = "camelCase")]
pub struct UserListQuery {
    /// Exact-match filter by referenced program.
    pub program_id: Option<String>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

/// GET /api/users - admin only, paginated, program references populated
#[utoipa::path(
    get,
    path = "/api/users",
    tag = "Users",
    params(UserListQuery),
    responses(
        (status = 200, description = "Paginated user list"),
        (status = 403, description = "Admin role required")
    ),
    security(("bearer_auth" = []))
)]
#[get("")]
pub async fn list_users(
    db: web::Data<MongoDB>,
    user: ActingUser,
    query: web::Query<UserListQuery>,
) -> Result<HttpResponse, AppError> {
    require_admin(&user)?;

    let params = PageParams::new(query.page, query.limit);
    let data = user_service::list(&db, query.program_id.as_deref(), params).await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "data": data,
    })))
}

/// GET /api/users/{id} - any authenticated role
#[utoipa::path(
    get,
    path = "/api/users/{id}",
    tag = "Users",
    responses(
        (status = 200, description = "User found", body = UserResponse),
        (status = 404, description = "User not found")
    ),
    security(("bearer_auth" = []))
)]
#[get("/{id}")]
pub async fn get_user(
    db: web::Data<MongoDB>,
    _user: ActingUser,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let found = user_service::get(&db, &path.into_inner()).await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "data": found,
    })))
}

/// POST /api/users - admin only
#[utoipa::path(
    post,
    path = "/api/users",
    tag = "Users",
    request_body = CreateUserRequest,
    responses(
        (status = 201, description = "User created", body = UserResponse),
        (status = 400, description = "Validation failed"),
        (status = 409, description = "Email already registered")
    ),
    security(("bearer_auth" = []))
)]
#[post("")]
pub async fn create_user(
    db: web::Data<MongoDB>,
    user: ActingUser,
    body: web::Json<CreateUserRequest>,
) -> Result<HttpResponse, AppError> {
    require_admin(&user)?;

    let created = user_service::create(&db, &body).await?;

    Ok(HttpResponse::Created().json(serde_json::json!({
        "success": true,
        "message": "User created successfully",
        "data": created,
    })))
}

/// PUT /api/users/{id} - self or admin
#[utoipa::path(
    put,
    path = "/api/users/{id}",
    tag = "Users",
    request_body = UpdateUserRequest,
    responses(
        (status = 200, description = "User updated", body = UserResponse),
        (status = 400, description = "No fields supplied or validation failed"),
        (status = 403, description = "Not the target user and not an admin"),
        (status = 404, description = "User not found")
    ),
    security(("bearer_auth" = []))
)]
#[put("/{id}")]
pub async fn update_user(
    db: web::Data<MongoDB>,
    user: ActingUser,
    path: web::Path<String>,
    body: web::Json<UpdateUserRequest>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    require_self_or_admin(&user, &id)?;

    let updated = user_service::update(&db, &id, &body).await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "message": "User updated successfully",
        "data": updated,
    })))
}
