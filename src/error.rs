use axum::{
    http::StatusCode,
    response::{IntoResponse, Json},
};
use serde_json::json;

pub type Result<T> = std::result::Result<T, Error>;

/// Why a presented token was rejected. Both faults answer with the same
/// status, but they are kept apart so logs can tell them apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialFault {
    Expired,
    Malformed,
}

impl std::fmt::Display for CredentialFault {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CredentialFault::Expired => write!(f, "json web token is expired. try again"),
            CredentialFault::Malformed => write!(f, "json web token is invalid. try again"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Unauthenticated: {0}")]
    Unauthenticated(String),

    #[error("Invalid credential: {0}")]
    InvalidCredential(CredentialFault),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Duplicate {0} entered")]
    DuplicateKey(String),

    #[error("you have already applied for this job")]
    DuplicateApplication,

    #[error("you can not apply to this job, date to apply is over")]
    ApplicationClosed,

    #[error("Invalid upload: {0}")]
    InvalidUpload(String),

    #[error("Validation error: {0}")]
    Validation(#[from] validator::ValidationErrors),

    #[error("Database error: {0}")]
    Database(sqlx::Error),

    #[error("External service error: {0}")]
    Upstream(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Multipart error: {0}")]
    Multipart(#[from] axum::extract::multipart::MultipartError),
}

impl Error {
    /// Status code plus the message that is allowed on the wire. Server-side
    /// faults collapse to a generic message so internals never leak.
    pub fn status_and_message(self) -> (StatusCode, String) {
        match self {
            Error::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            Error::Unauthenticated(msg) => (StatusCode::UNAUTHORIZED, msg),
            Error::InvalidCredential(fault) => (StatusCode::UNAUTHORIZED, fault.to_string()),
            Error::Forbidden(msg) => (StatusCode::FORBIDDEN, msg),
            Error::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            Error::DuplicateKey(field) => {
                (StatusCode::BAD_REQUEST, format!("Duplicate {} entered", field))
            }
            Error::DuplicateApplication => (
                StatusCode::BAD_REQUEST,
                "you have already applied for this job".to_string(),
            ),
            Error::ApplicationClosed => (
                StatusCode::BAD_REQUEST,
                "you can not apply to this job, date to apply is over".to_string(),
            ),
            Error::InvalidUpload(msg) => (StatusCode::BAD_REQUEST, msg),
            Error::Validation(err) => (StatusCode::BAD_REQUEST, err.to_string()),
            Error::Json(err) => (StatusCode::BAD_REQUEST, err.to_string()),
            Error::Multipart(err) => (StatusCode::BAD_REQUEST, err.to_string()),
            Error::Upstream(msg) => (StatusCode::BAD_GATEWAY, msg),
            Error::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
            Error::Config(_) | Error::Database(_) | Error::Anyhow(_) | Error::Io(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal Server Error".to_string(),
            ),
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> axum::response::Response {
        let detail = format!("{:?}", self);
        let (status, message) = self.status_and_message();

        if status.is_server_error() {
            tracing::error!(error = %detail, "request failed");
        }

        let development = crate::config::CONFIG
            .get()
            .map(|c| c.is_development())
            .unwrap_or(false);

        let mut body = json!({ "success": false, "message": message });
        if development {
            body["error"] = json!(detail);
        }

        (status, Json(body)).into_response()
    }
}

impl From<sqlx::Error> for Error {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => Error::NotFound("Resource not found".to_string()),
            sqlx::Error::Database(db) => match db.code().as_deref() {
                // unique_violation
                Some("23505") => {
                    Error::DuplicateKey(duplicate_field(db.constraint().unwrap_or_default()))
                }
                // invalid_text_representation, e.g. a filter value that does
                // not cast to the column type
                Some("22P02") => Error::BadRequest(db.message().to_string()),
                _ => Error::Database(sqlx::Error::Database(db)),
            },
            other => Error::Database(other),
        }
    }
}

impl From<jsonwebtoken::errors::Error> for Error {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        let fault = match err.kind() {
            jsonwebtoken::errors::ErrorKind::ExpiredSignature => CredentialFault::Expired,
            _ => CredentialFault::Malformed,
        };
        Error::InvalidCredential(fault)
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Error::Upstream(err.to_string())
    }
}

/// Recover the offending column from a unique constraint name such as
/// `users_email_key`.
fn duplicate_field(constraint: &str) -> String {
    let trimmed = constraint.strip_suffix("_key").unwrap_or(constraint);
    for table in ["job_applicants", "users", "jobs"] {
        if let Some(rest) = trimmed.strip_prefix(table) {
            return rest.trim_start_matches('_').to_string();
        }
    }
    trimmed.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_field_strips_table_and_suffix() {
        assert_eq!(duplicate_field("users_email_key"), "email");
        assert_eq!(
            duplicate_field("job_applicants_job_id_user_id_key"),
            "job_id_user_id"
        );
        assert_eq!(duplicate_field("something_else"), "something_else");
    }

    #[test]
    fn row_not_found_maps_to_not_found() {
        let err = Error::from(sqlx::Error::RowNotFound);
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[test]
    fn expired_token_maps_to_expired_fault() {
        let source =
            jsonwebtoken::errors::Error::from(jsonwebtoken::errors::ErrorKind::ExpiredSignature);
        let err = Error::from(source);
        assert!(matches!(
            err,
            Error::InvalidCredential(CredentialFault::Expired)
        ));
    }

    #[test]
    fn malformed_token_maps_to_malformed_fault() {
        let source =
            jsonwebtoken::errors::Error::from(jsonwebtoken::errors::ErrorKind::InvalidToken);
        let err = Error::from(source);
        assert!(matches!(
            err,
            Error::InvalidCredential(CredentialFault::Malformed)
        ));
    }

    #[test]
    fn io_faults_are_sanitized() {
        let source = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "no access");
        let (status, message) = Error::Io(source).status_and_message();
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(message, "Internal Server Error");
    }

    #[test]
    fn internal_messages_pass_through() {
        let (status, message) =
            Error::Internal("resume upload failed".to_string()).status_and_message();
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(message, "resume upload failed");
    }

    #[test]
    fn duplicate_application_is_a_bad_request() {
        let (status, message) = Error::DuplicateApplication.status_and_message();
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(message, "you have already applied for this job");
    }
}
