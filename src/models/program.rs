use chrono::{DateTime, Utc};
use mongodb::bson::{oid::ObjectId, DateTime as BsonDateTime};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Program lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ProgramStatus {
    Active,
    Inactive,
    Completed,
}

impl Default for ProgramStatus {
    fn default() -> Self {
        ProgramStatus::Active
    }
}

impl FromStr for ProgramStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(ProgramStatus::Active),
            "inactive" => Ok(ProgramStatus::Inactive),
            "completed" => Ok(ProgramStatus::Completed),
            other => Err(format!(
                "Invalid status '{}'. Expected active, inactive or completed",
                other
            )),
        }
    }
}

/// Program document as stored in the `programs` collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Program {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub name: String,
    pub description: String,
    pub start_date: BsonDateTime,
    #[serde(default)]
    pub status: ProgramStatus,
    pub created_at: BsonDateTime,
    pub updated_at: BsonDateTime,
}

/// Request to create a program (admin only).
#[derive(Debug, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateProgramRequest {
    pub name: String,
    pub description: String,
    /// RFC 3339 timestamp or `YYYY-MM-DD` date.
    pub start_date: String,
}

/// Partial update; only supplied fields are written.
#[derive(Debug, Default, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProgramRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub start_date: Option<String>,
    pub status: Option<ProgramStatus>,
}

/// Program as returned to API clients.
#[derive(Debug, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProgramResponse {
    pub id: String,
    pub name: String,
    pub description: String,
    pub start_date: DateTime<Utc>,
    pub status: ProgramStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Program> for ProgramResponse {
    fn from(p: Program) -> Self {
        ProgramResponse {
            id: p.id.map(|id| id.to_hex()).unwrap_or_default(),
            name: p.name,
            description: p.description,
            start_date: p.start_date.to_chrono(),
            status: p.status,
            created_at: p.created_at.to_chrono(),
            updated_at: p.updated_at.to_chrono(),
        }
    }
}

/// Summary fields used when populating `User.programId` references.
#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct ProgramSummary {
    pub id: String,
    pub name: String,
    pub description: String,
}

impl From<&Program> for ProgramSummary {
    fn from(p: &Program) -> Self {
        ProgramSummary {
            id: p.id.map(|id| id.to_hex()).unwrap_or_default(),
            name: p.name.clone(),
            description: p.description.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_parses_known_values_only() {
        assert_eq!("active".parse::<ProgramStatus>().unwrap(), ProgramStatus::Active);
        assert_eq!("inactive".parse::<ProgramStatus>().unwrap(), ProgramStatus::Inactive);
        assert_eq!("completed".parse::<ProgramStatus>().unwrap(), ProgramStatus::Completed);
        assert!("archived".parse::<ProgramStatus>().is_err());
    }

    #[test]
    fn status_serializes_lowercase() {
        let json = serde_json::to_string(&ProgramStatus::Completed).unwrap();
        assert_eq!(json, "\"completed\"");
    }
}
