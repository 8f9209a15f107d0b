use actix_web::{dev::Payload, web, FromRequest, HttpRequest};
use futures::future::LocalBoxFuture;
use mongodb::bson::{doc, oid::ObjectId};

use crate::config::Config;
use crate::database::{MongoDB, USERS};
use crate::models::{Role, User};
use crate::services::token_service;
use crate::utils::AppError;

/// The identity resolved from a request's bearer token. Extracting it runs
/// the whole Unauthenticated→Authenticated transition: header present, token
/// verifies, embedded user id still resolves to a stored user. The password
/// hash never leaves the extractor.
#[derive(Debug, Clone)]
pub struct ActingUser {
    pub id: ObjectId,
    pub full_name: String,
    pub email: String,
    pub role: Role,
    pub program_id: Option<ObjectId>,
}

impl TryFrom<User> for ActingUser {
    type Error = AppError;

    // A stored user without _id cannot act: the id drives every ownership
    // check, so refuse the conversion rather than invent one.
    fn try_from(user: User) -> Result<Self, Self::Error> {
        let id = user
            .id
            .ok_or_else(|| AppError::Internal("Stored user is missing _id".to_string()))?;

        Ok(ActingUser {
            id,
            full_name: user.full_name,
            email: user.email,
            role: user.role,
            program_id: user.program_id,
        })
    }
}

fn bearer_token(req: &HttpRequest) -> Result<String, AppError> {
    let header = req
        .headers()
        .get("Authorization")
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| {
            AppError::Unauthenticated("Access denied. No token provided.".to_string())
        })?;

    match header.strip_prefix("Bearer ") {
        Some(token) if !token.is_empty() => Ok(token.to_string()),
        _ => Err(AppError::Unauthenticated(
            "Access denied. No token provided.".to_string(),
        )),
    }
}

impl FromRequest for ActingUser {
    type Error = AppError;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let req = req.clone();

        Box::pin(async move {
            let config = req
                .app_data::<web::Data<Config>>()
                .ok_or_else(|| AppError::Internal("Config not registered".to_string()))?;
            let db = req
                .app_data::<web::Data<MongoDB>>()
                .ok_or_else(|| AppError::Internal("Database not registered".to_string()))?;

            let token = bearer_token(&req)?;
            let claims = token_service::verify(config, &token)?;

            let user_id = ObjectId::parse_str(&claims.sub)
                .map_err(|_| AppError::Unauthenticated("Invalid token.".to_string()))?;

            let user = db
                .collection::<User>(USERS)
                .find_one(doc! { "_id": user_id })
                .await?
                .ok_or_else(|| AppError::Unauthenticated("Invalid token.".to_string()))?;

            ActingUser::try_from(user)
        })
    }
}

/// Guard: admin role required.
pub fn require_admin(user: &ActingUser) -> Result<(), AppError> {
    if user.role != Role::Admin {
        return Err(AppError::Forbidden(
            "Access denied. Admin role required.".to_string(),
        ));
    }
    Ok(())
}

/// Guard: admins may touch anyone, everyone else only their own record.
pub fn require_self_or_admin(user: &ActingUser, target_id: &str) -> Result<(), AppError> {
    if user.role == Role::Admin || user.id.to_hex() == target_id {
        return Ok(());
    }
    Err(AppError::Forbidden("Access denied".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn acting(role: Role) -> ActingUser {
        ActingUser {
            id: ObjectId::new(),
            full_name: "Test User".to_string(),
            email: "test@example.com".to_string(),
            role,
            program_id: None,
        }
    }

    fn stored_user(id: Option<ObjectId>) -> User {
        let now = mongodb::bson::DateTime::now();
        User {
            id,
            full_name: "Test User".to_string(),
            email: "test@example.com".to_string(),
            password: "$2b$12$hash".to_string(),
            role: Role::Student,
            program_id: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn acting_user_requires_stored_id() {
        let id = ObjectId::new();
        let acting = ActingUser::try_from(stored_user(Some(id))).unwrap();
        assert_eq!(acting.id, id);

        assert!(matches!(
            ActingUser::try_from(stored_user(None)),
            Err(AppError::Internal(_))
        ));
    }

    #[test]
    fn admin_guard() {
        assert!(require_admin(&acting(Role::Admin)).is_ok());
        assert!(matches!(
            require_admin(&acting(Role::Student)),
            Err(AppError::Forbidden(_))
        ));
    }

    #[test]
    fn self_or_admin_guard() {
        let student = acting(Role::Student);
        let own_id = student.id.to_hex();

        assert!(require_self_or_admin(&student, &own_id).is_ok());
        assert!(matches!(
            require_self_or_admin(&student, &ObjectId::new().to_hex()),
            Err(AppError::Forbidden(_))
        ));

        let admin = acting(Role::Admin);
        assert!(require_self_or_admin(&admin, &ObjectId::new().to_hex()).is_ok());
    }
}
