//! API error types and the structured error envelope.
//!
//! Every error reaching the client serializes as
//! `{statusCode, error, message, path, timestamp}`. The `path` field is
//! filled in by [`attach_error_context`], which runs as the outermost layer
//! and rewrites the body produced by [`ApiError::into_response`].

use axum::extract::Request;
use axum::http::StatusCode;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;

use database::{DatabaseError, ValidationError};

/// Errors surfaced by API handlers.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Malformed request body or query.
    #[error("{0}")]
    Validation(String),

    /// Missing or invalid credentials, or a disabled account.
    #[error("{0}")]
    Unauthorized(String),

    /// Authenticated but not allowed.
    #[error("{0}")]
    Forbidden(String),

    /// Target entity does not exist.
    #[error("{0}")]
    NotFound(String),

    /// Uniqueness conflict, e.g. duplicate email.
    #[error("{0}")]
    Conflict(String),

    /// Request budget for this endpoint is exhausted.
    #[error("{0}")]
    RateLimited(String),

    /// Maintenance mode is blocking non-admin traffic.
    #[error("{0}")]
    Unavailable(String),

    /// Database failure.
    #[error("database error: {0}")]
    Database(DatabaseError),

    /// Anything else.
    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::RateLimited(_) => StatusCode::TOO_MANY_REQUESTS,
            ApiError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Database(_) | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn category(&self) -> &'static str {
        match self {
            ApiError::Validation(_) => "ValidationError",
            ApiError::Unauthorized(_) => "UnauthorizedError",
            ApiError::Forbidden(_) => "ForbiddenError",
            ApiError::NotFound(_) => "NotFoundError",
            ApiError::Conflict(_) => "ConflictError",
            ApiError::RateLimited(_) => "TooManyRequestsError",
            ApiError::Unavailable(_) => "ServiceUnavailableError",
            ApiError::Database(_) | ApiError::Internal(_) => "InternalServerError",
        }
    }

    /// Client-facing message. Internal failures are masked.
    fn message(&self) -> String {
        match self {
            ApiError::Database(err) => {
                tracing::error!("Database error: {}", err);
                "Internal server error".to_string()
            }
            ApiError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                "Internal server error".to_string()
            }
            other => other.to_string(),
        }
    }
}

impl From<DatabaseError> for ApiError {
    fn from(err: DatabaseError) -> Self {
        match err {
            DatabaseError::NotFound { entity, id } => {
                ApiError::NotFound(format!("{entity} not found: {id}"))
            }
            DatabaseError::AlreadyExists { entity, id } => {
                ApiError::Conflict(format!("{entity} already exists: {id}"))
            }
            other => ApiError::Database(other),
        }
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        ApiError::Validation(err.to_string())
    }
}

impl From<care_core::UnknownVariant> for ApiError {
    fn from(err: care_core::UnknownVariant) -> Self {
        ApiError::Validation(err.to_string())
    }
}

/// Error parts stashed in response extensions so the envelope middleware can
/// rebuild the body with the request path included.
#[derive(Debug, Clone)]
pub struct ErrorParts {
    pub status: StatusCode,
    pub category: &'static str,
    pub message: String,
}

fn envelope(parts: &ErrorParts, path: Option<&str>) -> serde_json::Value {
    let mut body = serde_json::json!({
        "statusCode": parts.status.as_u16(),
        "error": parts.category,
        "message": parts.message,
        "timestamp": chrono::Utc::now().to_rfc3339(),
    });
    if let Some(path) = path {
        body["path"] = serde_json::Value::String(path.to_string());
    }
    body
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let parts = ErrorParts {
            status: self.status(),
            category: self.category(),
            message: self.message(),
        };
        let mut response = (parts.status, Json(envelope(&parts, None))).into_response();
        response.extensions_mut().insert(parts);
        response
    }
}

/// Outermost middleware: rewrite error bodies to include the request path.
pub async fn attach_error_context(req: Request, next: Next) -> Response {
    let path = req.uri().path().to_string();
    let response = next.run(req).await;

    let Some(parts) = response.extensions().get::<ErrorParts>().cloned() else {
        return response;
    };

    (parts.status, Json(envelope(&parts, Some(&path)))).into_response()
}

/// Result type for API handlers.
pub type Result<T> = std::result::Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn database_not_found_maps_to_404() {
        let err: ApiError = DatabaseError::NotFound {
            entity: "ResourceProfile",
            id: "rp-1".to_string(),
        }
        .into();
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
        assert_eq!(err.category(), "NotFoundError");
    }

    #[test]
    fn database_conflict_maps_to_409() {
        let err: ApiError = DatabaseError::AlreadyExists {
            entity: "User",
            id: "dup@example.com".to_string(),
        }
        .into();
        assert_eq!(err.status(), StatusCode::CONFLICT);
    }

    #[test]
    fn internal_errors_are_masked() {
        let err = ApiError::Internal("secret detail".to_string());
        assert_eq!(err.message(), "Internal server error");
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn envelope_includes_path_when_known() {
        let parts = ErrorParts {
            status: StatusCode::NOT_FOUND,
            category: "NotFoundError",
            message: "Resource not found".to_string(),
        };
        let body = envelope(&parts, Some("/api/v1/profiles/resource/x"));
        assert_eq!(body["statusCode"], 404);
        assert_eq!(body["path"], "/api/v1/profiles/resource/x");
        assert!(body["timestamp"].is_string());
    }
}
