use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use std::fmt;

/// Crate-wide error taxonomy. Every handler returns `Result<_, AppError>` and
/// the `ResponseError` impl is the single place errors become HTTP responses.
#[derive(Debug)]
pub enum AppError {
    Validation(String),
    Unauthenticated(String),
    Forbidden(String),
    NotFound(String),
    Conflict(String),
    Internal(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Validation(msg)
            | AppError::Unauthenticated(msg)
            | AppError::Forbidden(msg)
            | AppError::NotFound(msg)
            | AppError::Conflict(msg)
            | AppError::Internal(msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for AppError {}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        // Internal causes are logged, never returned to the caller.
        let message = match self {
            AppError::Internal(cause) => {
                log::error!("❌ Internal error: {}", cause);
                "Internal server error".to_string()
            }
            other => other.to_string(),
        };

        HttpResponse::build(self.status_code()).json(serde_json::json!({
            "success": false,
            "message": message,
        }))
    }
}

const DUPLICATE_KEY_CODE: i32 = 11000;

impl From<mongodb::error::Error> for AppError {
    fn from(err: mongodb::error::Error) -> Self {
        from_server_code(server_error_code(&err), &err)
    }
}

/// MongoDB reports unique-index violations as server error code 11000. The
/// message stays generic: the violated index could belong to any collection,
/// and callers that can name the field pre-check and raise their own Conflict.
fn from_server_code(code: Option<i32>, err: &dyn fmt::Display) -> AppError {
    match code {
        Some(DUPLICATE_KEY_CODE) => {
            AppError::Conflict("Duplicate value for a unique field".to_string())
        }
        _ => AppError::Internal(format!("Database error: {}", err)),
    }
}

fn server_error_code(err: &mongodb::error::Error) -> Option<i32> {
    use mongodb::error::{ErrorKind, WriteFailure};

    match err.kind.as_ref() {
        ErrorKind::Write(WriteFailure::WriteError(we)) => Some(we.code),
        ErrorKind::Command(ce) => Some(ce.code),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_follow_taxonomy() {
        assert_eq!(
            AppError::Validation("bad".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::Unauthenticated("no token".into()).status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AppError::Forbidden("denied".into()).status_code(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            AppError::NotFound("missing".into()).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::Conflict("dup".into()).status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            AppError::Internal("boom".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn internal_error_body_does_not_leak_cause() {
        let res = AppError::Internal("connection string with password".into()).error_response();
        assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn duplicate_key_code_maps_to_conflict() {
        let cause = "E11000 duplicate key error collection: users index: email_1";

        match from_server_code(Some(DUPLICATE_KEY_CODE), &cause) {
            AppError::Conflict(msg) => {
                // Fires for any unique index, so the message names no field.
                assert_eq!(msg, "Duplicate value for a unique field");
            }
            other => panic!("expected Conflict, got {:?}", other),
        }

        // Any other server code, or no code at all, stays Internal.
        assert!(matches!(
            from_server_code(Some(121), &"document validation failed"),
            AppError::Internal(_)
        ));
        assert!(matches!(
            from_server_code(None, &"connection reset"),
            AppError::Internal(_)
        ));
    }
}
