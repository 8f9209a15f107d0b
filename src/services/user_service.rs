use std::collections::HashMap;

use bcrypt::{hash, verify, DEFAULT_COST};
use futures::TryStreamExt;
use lazy_static::lazy_static;
use mongodb::bson::{doc, oid::ObjectId, Bson, DateTime as BsonDateTime};
use regex::Regex;

use crate::config::Config;
use crate::database::{MongoDB, PROGRAMS, USERS};
use crate::models::{
    AuthData, CreateUserRequest, LoginRequest, Program, ProgramSummary, RegisterRequest, Role,
    UpdateUserRequest, User, UserResponse,
};
use crate::services::token_service;
use crate::utils::{AppError, PageParams, Paginated};

const FULL_NAME_MAX: usize = 100;
const PASSWORD_MIN: usize = 6;

lazy_static! {
    static ref EMAIL_RE: Regex = Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").unwrap();
}

fn parse_object_id(id: &str) -> Result<ObjectId, AppError> {
    ObjectId::parse_str(id).map_err(|_| AppError::Validation("Invalid user ID".to_string()))
}

/// Emails are stored lowercased and trimmed so uniqueness is
/// case-insensitive.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn validate_email(email: &str) -> Result<String, AppError> {
    let email = normalize_email(email);
    if !EMAIL_RE.is_match(&email) {
        return Err(AppError::Validation(
            "Please provide a valid email".to_string(),
        ));
    }
    Ok(email)
}

fn validate_full_name(full_name: &str) -> Result<String, AppError> {
    let full_name = full_name.trim();
    if full_name.is_empty() {
        return Err(AppError::Validation("Full name is required".to_string()));
    }
    if full_name.chars().count() > FULL_NAME_MAX {
        return Err(AppError::Validation(
            "Full name cannot exceed 100 characters".to_string(),
        ));
    }
    Ok(full_name.to_string())
}

fn validate_password(password: &str) -> Result<(), AppError> {
    if password.chars().count() < PASSWORD_MIN {
        return Err(AppError::Validation(
            "Password must be at least 6 characters".to_string(),
        ));
    }
    Ok(())
}

/// One-way adaptive hash, applied exactly once per password-setting
/// operation.
fn hash_password(password: &str) -> Result<String, AppError> {
    hash(password, DEFAULT_COST)
        .map_err(|e| AppError::Internal(format!("Failed to hash password: {}", e)))
}

/// Parses a supplied programId and verifies it resolves to a stored Program.
/// References are still weak: a Program deleted later leaves the user's
/// reference orphaned, which reads back as null.
async fn resolve_program_ref(db: &MongoDB, id: &str) -> Result<ObjectId, AppError> {
    let object_id =
        ObjectId::parse_str(id).map_err(|_| AppError::Validation("Invalid program ID".to_string()))?;

    db.collection::<Program>(PROGRAMS)
        .find_one(doc! { "_id": object_id })
        .await?
        .ok_or_else(|| AppError::Validation("Referenced program does not exist".to_string()))?;

    Ok(object_id)
}

async fn summary_for(
    db: &MongoDB,
    program_id: Option<ObjectId>,
) -> Result<Option<ProgramSummary>, AppError> {
    let Some(program_id) = program_id else {
        return Ok(None);
    };

    let summary = db
        .collection::<Program>(PROGRAMS)
        .find_one(doc! { "_id": program_id })
        .await?
        .map(|p| ProgramSummary::from(&p));

    Ok(summary)
}

/// Batch lookup of the program summaries referenced by a page of users.
async fn summaries_for(
    db: &MongoDB,
    users: &[User],
) -> Result<HashMap<ObjectId, ProgramSummary>, AppError> {
    let ids: Vec<Bson> = users
        .iter()
        .filter_map(|u| u.program_id)
        .map(Bson::ObjectId)
        .collect();

    let mut summaries = HashMap::new();
    if ids.is_empty() {
        return Ok(summaries);
    }

    let mut cursor = db
        .collection::<Program>(PROGRAMS)
        .find(doc! { "_id": { "$in": ids } })
        .await?;

    while let Some(program) = cursor.try_next().await? {
        if let Some(id) = program.id {
            summaries.insert(id, ProgramSummary::from(&program));
        }
    }

    Ok(summaries)
}

async fn populate(db: &MongoDB, user: User) -> Result<UserResponse, AppError> {
    let summary = summary_for(db, user.program_id).await?;
    Ok(UserResponse::from_user(user, summary))
}

/// Lists users newest-first, optionally filtered by exact programId, each
/// with its program reference populated.
pub async fn list(
    db: &MongoDB,
    program_id: Option<&str>,
    params: PageParams,
) -> Result<Paginated<UserResponse>, AppError> {
    let collection = db.collection::<User>(USERS);

    let query = match program_id.filter(|p| !p.trim().is_empty()) {
        Some(id) => {
            let object_id = ObjectId::parse_str(id.trim())
                .map_err(|_| AppError::Validation("Invalid program ID".to_string()))?;
            doc! { "programId": object_id }
        }
        None => doc! {},
    };

    let find = async {
        collection
            .find(query.clone())
            .sort(doc! { "createdAt": -1 })
            .skip(params.skip())
            .limit(params.limit)
            .await?
            .try_collect::<Vec<User>>()
            .await
    };
    let count = async { collection.count_documents(query.clone()).await };

    let (users, total) = futures::try_join!(find, count)?;

    let summaries = summaries_for(db, &users).await?;
    let items = users
        .into_iter()
        .map(|u| {
            let summary = u.program_id.and_then(|id| summaries.get(&id).cloned());
            UserResponse::from_user(u, summary)
        })
        .collect();

    Ok(Paginated::new(items, total, params))
}

pub async fn get(db: &MongoDB, id: &str) -> Result<UserResponse, AppError> {
    let object_id = parse_object_id(id)?;

    let user = db
        .collection::<User>(USERS)
        .find_one(doc! { "_id": object_id })
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    populate(db, user).await
}

/// Admin-initiated creation: programId is mandatory here, unlike public
/// registration.
pub async fn create(db: &MongoDB, request: &CreateUserRequest) -> Result<UserResponse, AppError> {
    let full_name = validate_full_name(&request.full_name)?;
    let email = validate_email(&request.email)?;
    validate_password(&request.password)?;
    let program_id = resolve_program_ref(db, &request.program_id).await?;

    let collection = db.collection::<User>(USERS);

    if collection.find_one(doc! { "email": &email }).await?.is_some() {
        return Err(AppError::Conflict(
            "User already exists with this email".to_string(),
        ));
    }

    let now = BsonDateTime::now();
    let mut user = User {
        id: None,
        full_name,
        email,
        password: hash_password(&request.password)?,
        role: Role::Student,
        program_id: Some(program_id),
        created_at: now,
        updated_at: now,
    };

    // The unique index still backstops a concurrent duplicate; the insert
    // error maps to Conflict.
    let result = collection.insert_one(&user).await?;
    user.id = result.inserted_id.as_object_id();

    log::info!("✅ User created: {}", user.email);
    populate(db, user).await
}

/// Self-or-admin partial update over {fullName, email, programId}.
pub async fn update(
    db: &MongoDB,
    id: &str,
    request: &UpdateUserRequest,
) -> Result<UserResponse, AppError> {
    let object_id = parse_object_id(id)?;

    if request.full_name.is_none() && request.email.is_none() && request.program_id.is_none() {
        return Err(AppError::Validation(
            "At least one field must be provided".to_string(),
        ));
    }

    let mut update_doc = doc! { "updatedAt": BsonDateTime::now() };

    if let Some(full_name) = &request.full_name {
        update_doc.insert("fullName", validate_full_name(full_name)?);
    }
    if let Some(email) = &request.email {
        update_doc.insert("email", validate_email(email)?);
    }
    if let Some(program_id) = &request.program_id {
        update_doc.insert("programId", resolve_program_ref(db, program_id).await?);
    }

    let collection = db.collection::<User>(USERS);

    let result = collection
        .update_one(doc! { "_id": object_id }, doc! { "$set": update_doc })
        .await?;

    if result.matched_count == 0 {
        return Err(AppError::NotFound("User not found".to_string()));
    }

    let user = collection
        .find_one(doc! { "_id": object_id })
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    populate(db, user).await
}

/// Public self-service registration. Role defaults to student; a programId is
/// only honored when role=admin is explicitly requested, students get
/// assigned later by an admin.
pub async fn register(
    db: &MongoDB,
    config: &Config,
    request: &RegisterRequest,
) -> Result<AuthData, AppError> {
    let full_name = validate_full_name(&request.full_name)?;
    let email = validate_email(&request.email)?;
    validate_password(&request.password)?;

    let role = request.role.unwrap_or_default();
    let program_id = match (role, &request.program_id) {
        (Role::Admin, Some(id)) => Some(resolve_program_ref(db, id).await?),
        _ => None,
    };

    let collection = db.collection::<User>(USERS);

    if collection.find_one(doc! { "email": &email }).await?.is_some() {
        return Err(AppError::Conflict(
            "User already exists with this email".to_string(),
        ));
    }

    let now = BsonDateTime::now();
    let mut user = User {
        id: None,
        full_name,
        email,
        password: hash_password(&request.password)?,
        role,
        program_id,
        created_at: now,
        updated_at: now,
    };

    let result = collection.insert_one(&user).await?;
    user.id = result.inserted_id.as_object_id();

    let user_id = user.id.map(|id| id.to_hex()).unwrap_or_default();
    let token = token_service::issue(config, &user_id)?;

    log::info!("✅ User registered: {}", user.email);

    let user = populate(db, user).await?;
    Ok(AuthData { user, token })
}

/// Credential check. A missing user and a wrong password produce the same
/// error so nothing leaks about which check failed.
pub async fn login(
    db: &MongoDB,
    config: &Config,
    request: &LoginRequest,
) -> Result<AuthData, AppError> {
    if request.email.trim().is_empty() || request.password.is_empty() {
        return Err(AppError::Validation(
            "Please provide email and password".to_string(),
        ));
    }

    let email = normalize_email(&request.email);
    let invalid = || AppError::Unauthenticated("Invalid email or password".to_string());

    let user = db
        .collection::<User>(USERS)
        .find_one(doc! { "email": &email })
        .await?
        .ok_or_else(invalid)?;

    let valid = verify(&request.password, &user.password)
        .map_err(|e| AppError::Internal(format!("Password verification error: {}", e)))?;
    if !valid {
        return Err(invalid());
    }

    let user_id = user.id.map(|id| id.to_hex()).unwrap_or_default();
    let token = token_service::issue(config, &user_id)?;

    log::info!("🔐 Login successful: {}", user.email);

    let user = populate(db, user).await?;
    Ok(AuthData { user, token })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_is_normalized_and_validated() {
        assert_eq!(validate_email("  Ana@Example.COM ").unwrap(), "ana@example.com");
        assert!(validate_email("no-at-sign").is_err());
        assert!(validate_email("missing@tld").is_err());
        assert!(validate_email("two words@example.com").is_err());
        assert!(validate_email("ok@example.co").is_ok());
    }

    #[test]
    fn full_name_limits() {
        assert!(validate_full_name("Ana Pérez").is_ok());
        assert!(validate_full_name("  ").is_err());
        assert!(validate_full_name(&"x".repeat(101)).is_err());
    }

    #[test]
    fn password_minimum_length() {
        assert!(validate_password("12345").is_err());
        assert!(validate_password("123456").is_ok());
    }

    #[test]
    fn stored_hash_is_not_plaintext_and_verifies() {
        let hashed = hash_password("secret123").unwrap();
        assert_ne!(hashed, "secret123");
        assert!(verify("secret123", &hashed).unwrap());
        assert!(!verify("wrong-password", &hashed).unwrap());
    }
}
