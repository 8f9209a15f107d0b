use chrono::{DateTime, Utc};
use mongodb::bson::{oid::ObjectId, DateTime as BsonDateTime};
use serde::{Deserialize, Serialize};

use crate::models::ProgramSummary;

/// Role gate for authorization decisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Student,
}

impl Default for Role {
    fn default() -> Self {
        Role::Student
    }
}

/// User document as stored in the `users` collection. The password field
/// holds a bcrypt hash, never plaintext, and is excluded from every response
/// DTO.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub full_name: String,
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub role: Role,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub program_id: Option<ObjectId>,
    pub created_at: BsonDateTime,
    pub updated_at: BsonDateTime,
}

/// Public self-service registration.
#[derive(Debug, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub full_name: String,
    pub email: String,
    pub password: String,
    pub role: Option<Role>,
    /// Honored only when role=admin is explicitly requested.
    pub program_id: Option<String>,
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Admin-initiated user creation; programId is required here.
#[derive(Debug, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserRequest {
    pub full_name: String,
    pub email: String,
    pub password: String,
    pub program_id: String,
}

/// Self-or-admin partial update. Password changes are deliberately not part
/// of this surface.
#[derive(Debug, Default, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserRequest {
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub program_id: Option<String>,
}

/// User as returned to API clients: password stripped, program reference
/// populated with its summary when it resolves.
#[derive(Debug, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: String,
    pub full_name: String,
    pub email: String,
    pub role: Role,
    #[serde(rename = "programId")]
    pub program: Option<ProgramSummary>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UserResponse {
    pub fn from_user(user: User, program: Option<ProgramSummary>) -> Self {
        UserResponse {
            id: user.id.map(|id| id.to_hex()).unwrap_or_default(),
            full_name: user.full_name,
            email: user.email,
            role: user.role,
            program,
            created_at: user.created_at.to_chrono(),
            updated_at: user.updated_at.to_chrono(),
        }
    }
}

/// Registration/login payload: the user plus a freshly issued token.
#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct AuthData {
    pub user: UserResponse,
    pub token: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_defaults_to_student() {
        assert_eq!(Role::default(), Role::Student);
    }

    #[test]
    fn role_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Role::Admin).unwrap(), "\"admin\"");
        assert_eq!(serde_json::to_string(&Role::Student).unwrap(), "\"student\"");
    }

    #[test]
    fn response_never_contains_password() {
        let user = User {
            id: Some(ObjectId::new()),
            full_name: "Ana Pérez".to_string(),
            email: "ana@example.com".to_string(),
            password: "$2b$12$hash".to_string(),
            role: Role::Student,
            program_id: None,
            created_at: BsonDateTime::now(),
            updated_at: BsonDateTime::now(),
        };

        let json = serde_json::to_value(UserResponse::from_user(user, None)).unwrap();
        assert!(json.get("password").is_none());
        assert_eq!(json["email"], "ana@example.com");
        assert!(json["programId"].is_null());
    }
}
