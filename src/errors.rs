// src/errors.rs
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

use diesel::result::Error as DieselError;

#[derive(Error, Debug, Clone)]
pub enum AppError {
    // --- Authentication/Authorization Errors ---
    #[error("User not found")]
    UserNotFound,

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Password hashing failed: {0}")]
    PasswordHashingFailed(String),

    #[error("Username Taken")]
    UsernameTaken,

    #[error("Email Taken")]
    EmailTaken,

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Authentication framework error: {0}")]
    AuthError(String),

    #[error("Session store error: {0}")]
    SessionStoreError(String),

    // --- Database Errors ---
    #[error("Database query error: {0}")]
    DatabaseQueryError(String),

    #[error("Database pool error: {0}")]
    DbPoolError(String),

    #[error("Database interaction error: {0}")]
    DbInteractError(String),

    #[error("Database migration error: {0}")]
    DbMigrationError(String),

    // --- Request/Input Errors ---
    #[error("Bad Request: {0}")]
    BadRequest(String),

    #[error("Not Found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Invalid Input: {0}")]
    InvalidInput(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("UUID Error: {0}")]
    UuidError(String),

    // --- General/Internal Errors ---
    #[error("Configuration Error: {0}")]
    ConfigError(String),

    #[error("IO Error: {0}")]
    IoError(String),

    #[error("Serialization Error: {0}")]
    SerializationError(String),

    #[error("Internal Server Error: {0}")]
    InternalServerError(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            // 4xx Client Errors
            AppError::InvalidCredentials => {
                (StatusCode::UNAUTHORIZED, "Invalid credentials".to_string())
            }
            AppError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg),
            AppError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            AppError::UserNotFound => (StatusCode::NOT_FOUND, "User not found".to_string()),
            AppError::UsernameTaken => (
                StatusCode::CONFLICT,
                "Username is already taken".to_string(),
            ),
            AppError::EmailTaken => (StatusCode::CONFLICT, "Email is already taken".to_string()),
            AppError::InvalidInput(msg) => {
                (StatusCode::BAD_REQUEST, format!("Invalid input: {msg}"))
            }
            AppError::ValidationError(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::UuidError(e) => {
                error!("UUID error: {}", e);
                (
                    StatusCode::BAD_REQUEST,
                    "Invalid identifier format".to_string(),
                )
            }
            AppError::AuthError(e) => {
                error!("Authentication framework error: {}", e);
                (StatusCode::UNAUTHORIZED, "Authentication error".to_string())
            }

            // 5xx Server Errors
            AppError::SessionStoreError(e) => {
                error!("Session store error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Session management error".to_string(),
                )
            }
            AppError::DatabaseQueryError(e) => {
                error!("Database query error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Database error".to_string(),
                )
            }
            AppError::DbPoolError(e) => {
                error!("Database pool error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Database connection error".to_string(),
                )
            }
            AppError::DbInteractError(e) => {
                error!("Database interaction error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Database task execution error".to_string(),
                )
            }
            AppError::DbMigrationError(e) => {
                error!("Database migration error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Database schema error".to_string(),
                )
            }
            AppError::PasswordHashingFailed(e) => {
                error!("Password hashing failed: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal security error".to_string(),
                )
            }
            AppError::ConfigError(msg) => {
                error!("Configuration error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Server configuration error".to_string(),
                )
            }
            AppError::IoError(e) => {
                error!("IO error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "File system error".to_string(),
                )
            }
            AppError::SerializationError(e) => {
                error!("Serialization error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Data formatting error".to_string(),
                )
            }
            AppError::InternalServerError(e) => {
                error!("Internal Server Error: {:?}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "An unexpected error occurred".to_string(),
                )
            }
        };

        let body = Json(json!({
            "success": false,
            "error": error_message,
        }));

        (status, body).into_response()
    }
}

// --- Convenience Result Type ---
pub type Result<T, E = AppError> = std::result::Result<T, E>;

// --- From implementations converting library errors into our string variants ---

impl From<bcrypt::BcryptError> for AppError {
    fn from(err: bcrypt::BcryptError) -> Self {
        AppError::PasswordHashingFailed(err.to_string())
    }
}

impl From<DieselError> for AppError {
    fn from(err: DieselError) -> Self {
        match err {
            DieselError::NotFound => AppError::NotFound("Record not found".to_string()),
            _ => AppError::DatabaseQueryError(err.to_string()),
        }
    }
}

impl From<deadpool_diesel::PoolError> for AppError {
    fn from(err: deadpool_diesel::PoolError) -> Self {
        AppError::DbPoolError(err.to_string())
    }
}

impl From<deadpool_diesel::InteractError> for AppError {
    fn from(err: deadpool_diesel::InteractError) -> Self {
        AppError::DbInteractError(err.to_string())
    }
}

impl From<axum_login::Error<crate::auth::user_store::Backend>> for AppError {
    fn from(err: axum_login::Error<crate::auth::user_store::Backend>) -> Self {
        AppError::AuthError(err.to_string())
    }
}

impl From<tower_sessions::session_store::Error> for AppError {
    fn from(err: tower_sessions::session_store::Error) -> Self {
        AppError::SessionStoreError(err.to_string())
    }
}

impl From<uuid::Error> for AppError {
    fn from(err: uuid::Error) -> Self {
        AppError::UuidError(err.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::IoError(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::SerializationError(err.to_string())
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        AppError::ValidationError(err.to_string())
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::InternalServerError(err.to_string())
    }
}

impl From<crate::auth::AuthError> for AppError {
    fn from(err: crate::auth::AuthError) -> Self {
        match err {
            crate::auth::AuthError::WrongCredentials => AppError::InvalidCredentials,
            crate::auth::AuthError::UsernameTaken => AppError::UsernameTaken,
            crate::auth::AuthError::EmailTaken => AppError::EmailTaken,
            crate::auth::AuthError::HashingError => {
                AppError::PasswordHashingFailed("Password hashing failed".to_string())
            }
            crate::auth::AuthError::UserNotFound => AppError::UserNotFound,
            crate::auth::AuthError::DatabaseError(s) => AppError::DatabaseQueryError(s),
            crate::auth::AuthError::PoolError(e) => AppError::DbPoolError(e.to_string()),
            crate::auth::AuthError::InteractError(s) => AppError::DbInteractError(s),
        }
    }
}

// --- Test Module ---
#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    // Helper to extract JSON body from response
    async fn get_body_json(response: Response) -> Value {
        let body_bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("Failed to read response body");
        serde_json::from_slice(&body_bytes).expect("Failed to parse JSON body")
    }

    #[tokio::test]
    async fn test_internal_server_error_response() {
        let error = AppError::InternalServerError("Something went very wrong".to_string());
        let response = error.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = get_body_json(response).await;
        assert_eq!(body["success"], false);
        assert_eq!(body["error"], "An unexpected error occurred");
    }

    #[tokio::test]
    async fn test_database_error_response() {
        let db_error = DieselError::DatabaseError(
            diesel::result::DatabaseErrorKind::UniqueViolation,
            Box::new("duplicate key value violates unique constraint".to_string()),
        );
        let error = AppError::from(db_error);
        let response = error.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = get_body_json(response).await;
        assert_eq!(body["error"], "Database error");
    }

    #[tokio::test]
    async fn test_diesel_not_found_maps_to_404() {
        let error = AppError::from(DieselError::NotFound);
        let response = error.into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body = get_body_json(response).await;
        assert_eq!(body["error"], "Record not found");
    }

    #[tokio::test]
    async fn test_not_found_response() {
        let error = AppError::NotFound("Session not found".to_string());
        let response = error.into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body = get_body_json(response).await;
        assert_eq!(body["error"], "Session not found");
    }

    #[tokio::test]
    async fn test_bad_request_response() {
        let error = AppError::BadRequest("Content is required".to_string());
        let response = error.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = get_body_json(response).await;
        assert_eq!(body["error"], "Content is required");
    }

    #[tokio::test]
    async fn test_unauthorized_response() {
        let error = AppError::Unauthorized("Not logged in".to_string());
        let response = error.into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let body = get_body_json(response).await;
        assert_eq!(body["error"], "Not logged in");
    }

    #[tokio::test]
    async fn test_forbidden_response() {
        let error = AppError::Forbidden("Master account required".to_string());
        let response = error.into_response();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        let body = get_body_json(response).await;
        assert_eq!(body["error"], "Master account required");
    }

    #[tokio::test]
    async fn test_username_taken_response() {
        let error = AppError::UsernameTaken;
        let response = error.into_response();
        assert_eq!(response.status(), StatusCode::CONFLICT);
        let body = get_body_json(response).await;
        assert_eq!(body["error"], "Username is already taken");
    }

    #[tokio::test]
    async fn test_uuid_error_response() {
        let inner_error = uuid::Uuid::try_parse("invalid-uuid").unwrap_err();
        let error = AppError::from(inner_error);
        let response = error.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = get_body_json(response).await;
        assert_eq!(body["error"], "Invalid identifier format");
    }

    #[test]
    fn test_auth_error_conversions() {
        assert!(matches!(
            AppError::from(crate::auth::AuthError::WrongCredentials),
            AppError::InvalidCredentials
        ));
        assert!(matches!(
            AppError::from(crate::auth::AuthError::UserNotFound),
            AppError::UserNotFound
        ));
        let db = AppError::from(crate::auth::AuthError::DatabaseError("boom".to_string()));
        assert!(matches!(db, AppError::DatabaseQueryError(s) if s == "boom"));
    }
}
