// HTTP API Error Types
use axum::{http::StatusCode, response::IntoResponse, Json};
use serde_json::{json, Value};

use crate::api::validation::FieldErrors;

/// HTTP API error with appropriate status codes and client-friendly messages.
///
/// Bodies use the shapes the Foodgram frontend understands: `{"detail": "..."}`
/// for request-level failures and `{"<field>": ["..."]}` for validation failures.
#[derive(Debug)]
pub enum ApiError {
    // 400 Bad Request
    BadRequest(String),
    ValidationError(FieldErrors),
    InvalidJson(String),

    // 401 Unauthorized
    Unauthorized(String),

    // 403 Forbidden
    Forbidden(String),

    // 404 Not Found
    NotFound(String),

    // 500 Internal Server Error
    InternalServerError(String),

    // 503 Service Unavailable
    ServiceUnavailable(String),
}

impl ApiError {
    /// Get HTTP status code
    pub fn status_code(&self) -> u16 {
        match self {
            ApiError::BadRequest(_) => 400,
            ApiError::ValidationError(_) => 400,
            ApiError::InvalidJson(_) => 400,
            ApiError::Unauthorized(_) => 401,
            ApiError::Forbidden(_) => 403,
            ApiError::NotFound(_) => 404,
            ApiError::InternalServerError(_) => 500,
            ApiError::ServiceUnavailable(_) => 503,
        }
    }

    /// Get client-safe error message
    pub fn message(&self) -> &str {
        match self {
            ApiError::BadRequest(msg) => msg,
            ApiError::ValidationError(_) => "Validation failed",
            ApiError::InvalidJson(msg) => msg,
            ApiError::Unauthorized(msg) => msg,
            ApiError::Forbidden(msg) => msg,
            ApiError::NotFound(msg) => msg,
            ApiError::InternalServerError(msg) => msg,
            ApiError::ServiceUnavailable(msg) => msg,
        }
    }

    /// Convert to JSON response body
    pub fn to_json(&self) -> Value {
        match self {
            ApiError::ValidationError(field_errors) => field_errors.to_json(),
            _ => json!({ "detail": self.message() }),
        }
    }

    /// Get error code for logging and client handling
    pub fn error_code(&self) -> &'static str {
        match self {
            ApiError::BadRequest(_) => "BAD_REQUEST",
            ApiError::ValidationError(_) => "VALIDATION_ERROR",
            ApiError::InvalidJson(_) => "INVALID_JSON",
            ApiError::Unauthorized(_) => "UNAUTHORIZED",
            ApiError::Forbidden(_) => "FORBIDDEN",
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::InternalServerError(_) => "INTERNAL_SERVER_ERROR",
            ApiError::ServiceUnavailable(_) => "SERVICE_UNAVAILABLE",
        }
    }
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        ApiError::BadRequest(message.into())
    }

    pub fn validation_error(field_errors: FieldErrors) -> Self {
        ApiError::ValidationError(field_errors)
    }

    /// Single-field validation failure
    pub fn field(field: &str, message: impl Into<String>) -> Self {
        let mut errors = FieldErrors::new();
        errors.add(field, message);
        ApiError::ValidationError(errors)
    }

    /// Object-level validation failure, reported under `non_field_errors`
    pub fn non_field(message: impl Into<String>) -> Self {
        Self::field(FieldErrors::NON_FIELD, message)
    }

    pub fn invalid_json(message: impl Into<String>) -> Self {
        ApiError::InvalidJson(message.into())
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        ApiError::Unauthorized(message.into())
    }

    pub fn not_authenticated() -> Self {
        ApiError::Unauthorized("Authentication credentials were not provided.".to_string())
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        ApiError::Forbidden(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        ApiError::NotFound(message.into())
    }

    pub fn internal_server_error(message: impl Into<String>) -> Self {
        ApiError::InternalServerError(message.into())
    }

    pub fn service_unavailable(message: impl Into<String>) -> Self {
        ApiError::ServiceUnavailable(message.into())
    }
}

// Convert other error types to ApiError
impl From<crate::database::manager::DatabaseError> for ApiError {
    fn from(err: crate::database::manager::DatabaseError) -> Self {
        use crate::database::manager::DatabaseError;

        match err {
            DatabaseError::NotFound(msg) => ApiError::not_found(msg),
            DatabaseError::ConfigMissing(name) => {
                tracing::error!("Missing database configuration: {}", name);
                ApiError::service_unavailable("Database is not configured")
            }
            DatabaseError::Sqlx(sqlx::Error::PoolTimedOut) => {
                tracing::error!("Database pool timed out");
                ApiError::service_unavailable("Database temporarily unavailable")
            }
            DatabaseError::Sqlx(sqlx_err) => {
                // Log the real error but return generic message
                tracing::error!("SQLx error: {}", sqlx_err);
                ApiError::internal_server_error("Database error occurred")
            }
            DatabaseError::Migration(msg) => {
                tracing::error!("Migration error: {}", msg);
                ApiError::service_unavailable("Service is being updated, please try again later")
            }
        }
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        crate::database::manager::DatabaseError::from(err).into()
    }
}

impl From<crate::services::media::MediaError> for ApiError {
    fn from(err: crate::services::media::MediaError) -> Self {
        use crate::services::media::MediaError;

        match err {
            MediaError::Io(e) => {
                tracing::error!("Media storage error: {}", e);
                ApiError::internal_server_error("Failed to store image")
            }
            other => ApiError::field("image", other.to_string()),
        }
    }
}

impl From<crate::auth::AuthError> for ApiError {
    fn from(err: crate::auth::AuthError) -> Self {
        use crate::auth::AuthError;

        match err {
            AuthError::InvalidToken(_) | AuthError::Revoked => ApiError::unauthorized("Invalid token."),
            AuthError::InvalidSecret | AuthError::TokenGeneration(_) | AuthError::Hashing(_) => {
                tracing::error!("Authentication subsystem error: {}", err);
                ApiError::internal_server_error("Authentication is misconfigured")
            }
        }
    }
}

impl From<crate::filter::FilterError> for ApiError {
    fn from(err: crate::filter::FilterError) -> Self {
        use crate::filter::FilterError;

        match err {
            FilterError::InvalidPage => ApiError::not_found("Invalid page."),
            other => ApiError::bad_request(other.to_string()),
        }
    }
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(errors: validator::ValidationErrors) -> Self {
        ApiError::ValidationError(FieldErrors::from(errors))
    }
}

// Standard error trait implementations
impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for ApiError {}

// Automatic HTTP response conversion for Axum
impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        if status.is_server_error() {
            tracing::warn!(code = self.error_code(), "Request failed: {}", self.message());
        }
        (status, Json(self.to_json())).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detail_errors_use_detail_key() {
        let err = ApiError::not_found("Not found.");
        assert_eq!(err.status_code(), 404);
        assert_eq!(err.to_json(), json!({ "detail": "Not found." }));
    }

    #[test]
    fn field_errors_are_grouped_by_field() {
        let mut errors = FieldErrors::new();
        errors.add("tags", "This field is required.");
        errors.add("tags", "Tags must not repeat.");
        errors.add("name", "This field may not be blank.");

        let err = ApiError::validation_error(errors);
        assert_eq!(err.status_code(), 400);
        assert_eq!(
            err.to_json(),
            json!({
                "name": ["This field may not be blank."],
                "tags": ["This field is required.", "Tags must not repeat."]
            })
        );
    }

    #[test]
    fn non_field_errors_key() {
        let err = ApiError::non_field("You cannot subscribe to yourself.");
        assert_eq!(
            err.to_json(),
            json!({ "non_field_errors": ["You cannot subscribe to yourself."] })
        );
    }

    #[test]
    fn page_errors_become_not_found() {
        let err: ApiError = crate::filter::FilterError::InvalidPage.into();
        assert_eq!(err.status_code(), 404);
        assert_eq!(err.to_json(), json!({ "detail": "Invalid page." }));
    }

    #[test]
    fn revoked_tokens_are_unauthorized() {
        let err: ApiError = crate::auth::AuthError::Revoked.into();
        assert_eq!(err.status_code(), 401);
        assert_eq!(err.to_json(), json!({ "detail": "Invalid token." }));
    }
}
