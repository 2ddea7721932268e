use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::diet::DietError;
use crate::models::profile::FieldError;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error(transparent)]
    Diet(#[from] DietError),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<FieldError> for AppError {
    fn from(e: FieldError) -> Self {
        AppError::Validation(e.to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone()),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, "CONFLICT", msg.clone()),
            AppError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                "UNAUTHORIZED",
                "Authentication required".to_string(),
            ),
            AppError::InvalidCredentials => (
                StatusCode::UNAUTHORIZED,
                "INVALID_CREDENTIALS",
                "Invalid username or password".to_string(),
            ),
            AppError::Database(e) => {
                tracing::error!("Database error: {e}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "DATABASE_ERROR",
                    "A database error occurred".to_string(),
                )
            }
            AppError::Diet(e) => diet_error_parts(e),
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal server error occurred".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message
            }
        }));

        (status, body).into_response()
    }
}

fn diet_error_parts(e: &DietError) -> (StatusCode, &'static str, String) {
    match e {
        DietError::NoTrainingData => (
            StatusCode::BAD_REQUEST,
            "NO_TRAINING_DATA",
            e.to_string(),
        ),
        DietError::ModelNotTrained => (
            StatusCode::BAD_REQUEST,
            "MODEL_NOT_TRAINED",
            e.to_string(),
        ),
        DietError::UserNotFound(_) => (StatusCode::NOT_FOUND, "USER_NOT_FOUND", e.to_string()),
        DietError::NoProfileData(_) => (StatusCode::NOT_FOUND, "NO_PROFILE_DATA", e.to_string()),
        DietError::InvalidProfile(field) => (
            StatusCode::BAD_REQUEST,
            "VALIDATION_ERROR",
            field.to_string(),
        ),
        DietError::Fit(_) | DietError::Artifact(_) | DietError::Store(_) => {
            tracing::error!("Diet model error: {e:?}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "MODEL_ERROR",
                "A model training or prediction error occurred".to_string(),
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status_of(err: AppError) -> StatusCode {
        err.into_response().status()
    }

    #[test]
    fn test_diet_error_statuses() {
        assert_eq!(
            status_of(DietError::NoTrainingData.into()),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_of(DietError::ModelNotTrained.into()),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_of(DietError::UserNotFound(uuid::Uuid::nil()).into()),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status_of(DietError::NoProfileData(uuid::Uuid::nil()).into()),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status_of(DietError::Fit("singular".into()).into()),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_field_error_is_validation() {
        let err: AppError = FieldError {
            field: "age",
            reason: "must be between 1 and 120, got 0".into(),
        }
        .into();
        assert!(matches!(err, AppError::Validation(ref m) if m.starts_with("age:")));
        assert_eq!(status_of(err), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_auth_statuses() {
        assert_eq!(status_of(AppError::Unauthorized), StatusCode::UNAUTHORIZED);
        assert_eq!(
            status_of(AppError::InvalidCredentials),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            status_of(AppError::Conflict("taken".into())),
            StatusCode::CONFLICT
        );
    }
}
