use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use sqlx::error::ErrorKind;
use thiserror::Error;

pub type AppResult<T> = Result<T, AppError>;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    BadRequest(String),

    /// Uniqueness violation, or a delete blocked by rows that still reference the target.
    #[error("{0}")]
    Conflict(String),

    /// A foreign key points at a row that does not exist.
    #[error("{0}")]
    InvalidReference(String),

    #[error("Database error: {0}")]
    Database(#[source] sqlx::Error),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::BadRequest(_) | AppError::InvalidReference(_) => StatusCode::BAD_REQUEST,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Database(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Human-readable message for the constraints declared in `migrations/`.
fn constraint_message(constraint: Option<&str>) -> Option<&'static str> {
    match constraint? {
        "brands_name_key" => Some("A brand with this name already exists"),
        "products_product_id_key" => Some("A product with this productId already exists"),
        "products_brand_id_fkey" => Some("brandId does not reference an existing brand"),
        _ => None,
    }
}

/// SQLSTATE class 22 codes caused by a value the column cannot hold:
/// `22001` string too long, `22003` numeric out of range.
fn is_value_out_of_bounds(code: Option<&str>) -> bool {
    matches!(code, Some("22001" | "22003"))
}

impl From<sqlx::Error> for AppError {
    fn from(error: sqlx::Error) -> Self {
        if matches!(error, sqlx::Error::RowNotFound) {
            return AppError::NotFound("Record not found".to_string());
        }

        let Some(db_error) = error.as_database_error() else {
            return AppError::Database(error);
        };

        let message = constraint_message(db_error.constraint())
            .map(str::to_string)
            .unwrap_or_else(|| db_error.message().to_string());

        match db_error.kind() {
            ErrorKind::UniqueViolation => AppError::Conflict(message),
            ErrorKind::ForeignKeyViolation => AppError::InvalidReference(message),
            ErrorKind::NotNullViolation | ErrorKind::CheckViolation => {
                AppError::BadRequest(message)
            }
            _ if is_value_out_of_bounds(db_error.code().as_deref()) => {
                AppError::BadRequest(message)
            }
            _ => AppError::Database(error),
        }
    }
}

// Extractor rejections share the JSON error body instead of axum's plain-text default.

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        match &self {
            AppError::Database(e) => tracing::error!("Database error: {}", e),
            AppError::Internal(e) => tracing::error!("Internal error: {:#}", e),
            _ => {}
        }

        let body = Json(json!({
            "error": self.to_string(),
            "status": status.as_u16(),
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_follow_error_taxonomy() {
        assert_eq!(AppError::NotFound("x".into()).status(), StatusCode::NOT_FOUND);
        assert_eq!(AppError::BadRequest("x".into()).status(), StatusCode::BAD_REQUEST);
        assert_eq!(AppError::Conflict("x".into()).status(), StatusCode::CONFLICT);
        assert_eq!(
            AppError::InvalidReference("x".into()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::Internal(anyhow::anyhow!("boom")).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn row_not_found_maps_to_not_found() {
        let err = AppError::from(sqlx::Error::RowNotFound);
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[test]
    fn non_database_errors_stay_internal() {
        let err = AppError::from(sqlx::Error::PoolTimedOut);
        assert!(matches!(err, AppError::Database(_)));
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn known_constraints_have_messages() {
        assert!(constraint_message(Some("brands_name_key")).is_some());
        assert!(constraint_message(Some("products_product_id_key")).is_some());
        assert!(constraint_message(Some("products_brand_id_fkey")).is_some());
        assert!(constraint_message(Some("something_else")).is_none());
        assert!(constraint_message(None).is_none());
    }

    #[test]
    fn truncation_and_numeric_overflow_are_client_errors() {
        assert!(is_value_out_of_bounds(Some("22001")));
        assert!(is_value_out_of_bounds(Some("22003")));
        assert!(!is_value_out_of_bounds(Some("23505")));
        assert!(!is_value_out_of_bounds(None));
    }

    #[tokio::test]
    async fn response_body_carries_message_and_status() {
        let response = AppError::Conflict("duplicate".into()).into_response();
        assert_eq!(response.status(), StatusCode::CONFLICT);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["error"], "duplicate");
        assert_eq!(body["status"], 409);
    }
}
