use actix_web::{web, HttpResponse};

use crate::config::Config;
use crate::database::MongoDB;
use crate::middleware::auth::ActingUser;
use crate::models::{AuthData, LoginRequest, RegisterRequest, UserResponse};
use crate::services::user_service;
use crate::utils::AppError;

#[utoipa::path(
    post,
    path = "/api/auth/register",
    tag = "Auth",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "User registered", body = AuthData),
        (status = 400, description = "Validation failed"),
        (status = 409, description = "Email already registered")
    )
)]
pub async fn register(
    db: web::Data<MongoDB>,
    config: web::Data<Config>,
    request: web::Json<RegisterRequest>,
) -> Result<HttpResponse, AppError> {
    log::info!("📝 POST /api/auth/register - email: {}", request.email);

    let data = user_service::register(&db, &config, &request).await?;

    Ok(HttpResponse::Created().json(serde_json::json!({
        "success": true,
        "message": "User registered successfully",
        "data": data,
    })))
}

#[utoipa::path(
    post,
    path = "/api/auth/login",
    tag = "Auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = AuthData),
        (status = 400, description = "Missing email or password"),
        (status = 401, description = "Invalid credentials")
    )
)]
pub async fn login(
    db: web::Data<MongoDB>,
    config: web::Data<Config>,
    request: web::Json<LoginRequest>,
) -> Result<HttpResponse, AppError> {
    log::info!("🔐 POST /api/auth/login - email: {}", request.email);

    let data = user_service::login(&db, &config, &request).await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "message": "Login successful",
        "data": data,
    })))
}

#[utoipa::path(
    get,
    path = "/api/auth/me",
    tag = "Auth",
    responses(
        (status = 200, description = "Acting user's own record", body = UserResponse),
        (status = 401, description = "Missing or invalid token")
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_me(
    db: web::Data<MongoDB>,
    user: ActingUser,
) -> Result<HttpResponse, AppError> {
    let me = user_service::get(&db, &user.id.to_hex()).await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "data": { "user": me },
    })))
}
