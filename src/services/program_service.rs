use chrono::{NaiveDate, Utc};
use futures::TryStreamExt;
use mongodb::bson::{doc, oid::ObjectId, DateTime as BsonDateTime};

use crate::database::{MongoDB, PROGRAMS};
use crate::models::{CreateProgramRequest, Program, ProgramResponse, UpdateProgramRequest};
use crate::utils::{AppError, PageParams, Paginated};

const NAME_MAX: usize = 100;
const DESCRIPTION_MAX: usize = 500;

fn parse_object_id(id: &str) -> Result<ObjectId, AppError> {
    ObjectId::parse_str(id).map_err(|_| AppError::Validation("Invalid program ID".to_string()))
}

/// Accepts an RFC 3339 timestamp or a plain `YYYY-MM-DD` date.
pub fn parse_start_date(value: &str) -> Result<BsonDateTime, AppError> {
    if let Ok(dt) = chrono::DateTime::parse_from_rfc3339(value) {
        return Ok(BsonDateTime::from_chrono(dt.with_timezone(&Utc)));
    }
    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        if let Some(dt) = date.and_hms_opt(0, 0, 0) {
            return Ok(BsonDateTime::from_chrono(dt.and_utc()));
        }
    }
    Err(AppError::Validation("Valid start date is required".to_string()))
}

fn validate_name(name: &str) -> Result<String, AppError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(AppError::Validation("Program name is required".to_string()));
    }
    if name.chars().count() > NAME_MAX {
        return Err(AppError::Validation(
            "Name cannot exceed 100 characters".to_string(),
        ));
    }
    Ok(name.to_string())
}

fn validate_description(description: &str) -> Result<String, AppError> {
    let description = description.trim();
    if description.is_empty() {
        return Err(AppError::Validation(
            "Program description is required".to_string(),
        ));
    }
    if description.chars().count() > DESCRIPTION_MAX {
        return Err(AppError::Validation(
            "Description cannot exceed 500 characters".to_string(),
        ));
    }
    Ok(description.to_string())
}

/// Case-insensitive substring filter over name OR description.
fn list_query(filter: Option<&str>) -> mongodb::bson::Document {
    match filter.map(str::trim).filter(|f| !f.is_empty()) {
        Some(filter) => {
            let pattern = regex::escape(filter);
            doc! {
                "$or": [
                    { "name": { "$regex": &pattern, "$options": "i" } },
                    { "description": { "$regex": &pattern, "$options": "i" } },
                ]
            }
        }
        None => doc! {},
    }
}

/// Lists programs newest-first. The page fetch and the total count are
/// independent, so they run concurrently.
pub async fn list(
    db: &MongoDB,
    filter: Option<&str>,
    params: PageParams,
) -> Result<Paginated<ProgramResponse>, AppError> {
    let collection = db.collection::<Program>(PROGRAMS);
    let query = list_query(filter);

    let find = async {
        collection
            .find(query.clone())
            .sort(doc! { "createdAt": -1 })
            .skip(params.skip())
            .limit(params.limit)
            .await?
            .try_collect::<Vec<Program>>()
            .await
    };
    let count = async { collection.count_documents(query.clone()).await };

    let (programs, total) = futures::try_join!(find, count)?;

    let items = programs.into_iter().map(ProgramResponse::from).collect();
    Ok(Paginated::new(items, total, params))
}

pub async fn get(db: &MongoDB, id: &str) -> Result<ProgramResponse, AppError> {
    let object_id = parse_object_id(id)?;

    let program = db
        .collection::<Program>(PROGRAMS)
        .find_one(doc! { "_id": object_id })
        .await?
        .ok_or_else(|| AppError::NotFound("Program not found".to_string()))?;

    Ok(program.into())
}

pub async fn create(
    db: &MongoDB,
    request: &CreateProgramRequest,
) -> Result<ProgramResponse, AppError> {
    let name = validate_name(&request.name)?;
    let description = validate_description(&request.description)?;
    let start_date = parse_start_date(&request.start_date)?;

    let now = BsonDateTime::now();
    let mut program = Program {
        id: None,
        name,
        description,
        start_date,
        status: Default::default(),
        created_at: now,
        updated_at: now,
    };

    let result = db
        .collection::<Program>(PROGRAMS)
        .insert_one(&program)
        .await?;
    program.id = result.inserted_id.as_object_id();

    log::info!("✅ Program created: {}", program.name);
    Ok(program.into())
}

pub async fn update(
    db: &MongoDB,
    id: &str,
    request: &UpdateProgramRequest,
) -> Result<ProgramResponse, AppError> {
    let object_id = parse_object_id(id)?;
    let collection = db.collection::<Program>(PROGRAMS);

    let mut update_doc = doc! { "updatedAt": BsonDateTime::now() };

    if let Some(name) = &request.name {
        update_doc.insert("name", validate_name(name)?);
    }
    if let Some(description) = &request.description {
        update_doc.insert("description", validate_description(description)?);
    }
    if let Some(start_date) = &request.start_date {
        update_doc.insert("startDate", parse_start_date(start_date)?);
    }
    if let Some(status) = &request.status {
        update_doc.insert(
            "status",
            mongodb::bson::to_bson(status)
                .map_err(|e| AppError::Internal(format!("Failed to encode status: {}", e)))?,
        );
    }

    let result = collection
        .update_one(doc! { "_id": object_id }, doc! { "$set": update_doc })
        .await?;

    if result.matched_count == 0 {
        return Err(AppError::NotFound("Program not found".to_string()));
    }

    let program = collection
        .find_one(doc! { "_id": object_id })
        .await?
        .ok_or_else(|| AppError::NotFound("Program not found".to_string()))?;

    Ok(program.into())
}

/// Removes the program. No cascade: users referencing it keep their (now
/// orphaned) programId and populate to null on read.
pub async fn delete(db: &MongoDB, id: &str) -> Result<(), AppError> {
    let object_id = parse_object_id(id)?;

    let result = db
        .collection::<Program>(PROGRAMS)
        .delete_one(doc! { "_id": object_id })
        .await?;

    if result.deleted_count == 0 {
        return Err(AppError::NotFound("Program not found".to_string()));
    }

    log::info!("🗑️ Program deleted: {}", id);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn start_date_accepts_both_formats() {
        assert!(parse_start_date("2026-09-01").is_ok());
        assert!(parse_start_date("2026-09-01T08:30:00Z").is_ok());
        assert!(parse_start_date("not a date").is_err());
        assert!(parse_start_date("2026-13-40").is_err());
    }

    #[test]
    fn name_and_description_limits() {
        assert!(validate_name("Medical Program").is_ok());
        assert!(validate_name("   ").is_err());
        assert!(validate_name(&"x".repeat(101)).is_err());

        assert!(validate_description("A cohort for medical students").is_ok());
        assert!(validate_description("").is_err());
        assert!(validate_description(&"x".repeat(501)).is_err());
    }

    #[test]
    fn filter_builds_case_insensitive_or_query() {
        let query = list_query(Some("Medical"));
        let or = query.get_array("$or").unwrap();
        assert_eq!(or.len(), 2);

        // Blank filters collapse to match-all
        assert!(list_query(None).is_empty());
        assert!(list_query(Some("  ")).is_empty());
    }

    #[test]
    fn filter_escapes_regex_metacharacters() {
        let query = list_query(Some("C++ (advanced)"));
        let first = query.get_array("$or").unwrap()[0]
            .as_document()
            .unwrap()
            .get_document("name")
            .unwrap();
        let pattern = first.get_str("$regex").unwrap();
        assert!(pattern.contains("\\+"));
        assert!(pattern.contains("\\("));
    }
}
