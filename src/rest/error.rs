use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use utoipa::ToSchema;

use crate::models::DatabaseError;
use crate::rbac::PermissionDenied;

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    pub error: ErrorDetails,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorDetails {
    pub code: String,
    pub message: String,
}

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Internal server error")]
    Internal(#[from] anyhow::Error),

    #[error("Database error")]
    Database(#[from] DatabaseError),

    #[error("JWT error")]
    Jwt(#[from] jsonwebtoken::errors::Error),

    #[error("Bcrypt error")]
    Bcrypt(#[from] bcrypt::BcryptError),
}

impl From<PermissionDenied> for ApiError {
    fn from(_: PermissionDenied) -> Self {
        ApiError::Forbidden("Insufficient permissions".to_string())
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg.to_string()),
            ApiError::Unauthorized => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED", "Authentication required".to_string()),
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, "FORBIDDEN", msg.to_string()),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.to_string()),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, "CONFLICT", msg.to_string()),
            ApiError::Database(e) if e.is_unique_violation() => {
                (StatusCode::CONFLICT, "CONFLICT", "Resource already exists".to_string())
            }
            ApiError::Database(e) if e.is_foreign_key_violation() => {
                (StatusCode::CONFLICT, "CONFLICT", "Resource is still referenced".to_string())
            }
            ApiError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR", "An internal error occurred".to_string()),
            ApiError::Database(_) => (StatusCode::INTERNAL_SERVER_ERROR, "DATABASE_ERROR", "Database operation failed".to_string()),
            ApiError::Jwt(_) => (StatusCode::UNAUTHORIZED, "JWT_ERROR", "Invalid or expired session".to_string()),
            ApiError::Bcrypt(_) => (StatusCode::INTERNAL_SERVER_ERROR, "CRYPTO_ERROR", "Cryptographic operation failed".to_string()),
        };

        if status.is_server_error() {
            tracing::error!(error = ?self, "Request failed");
        }

        let error_response = ErrorResponse {
            error: ErrorDetails {
                code: code.to_string(),
                message,
            },
        };

        (status, Json(error_response)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use crate::database::init_database;
    use crate::models::{CreateStockItemRequest, CreateSupplierRequest, StockItem, Supplier};
    use tempfile::TempDir;

    #[tokio::test]
    async fn deleting_a_referenced_supplier_is_a_conflict() {
        let dir = TempDir::new().unwrap();
        let mut config = AppConfig::default();
        config.database_url = format!("sqlite://{}", dir.path().join("fk.sqlite").display());
        let pool = init_database(&config).await.unwrap();

        let supplier = Supplier::create(
            &pool,
            &CreateSupplierRequest {
                name: "Harbour Pallets".to_string(),
                contact_email: None,
                phone: None,
                address: None,
            },
        )
        .await
        .unwrap();
        StockItem::create(
            &pool,
            &CreateStockItemRequest {
                sku: "PALLET-EU".to_string(),
                name: "Euro pallet".to_string(),
                quantity: 4,
                unit_price: 9.5,
                supplier_id: Some(supplier.id),
            },
        )
        .await
        .unwrap();

        let err = Supplier::delete(&pool, supplier.id).await.unwrap_err();
        assert!(err.is_foreign_key_violation());
        assert!(!err.is_unique_violation());

        let response = ApiError::Database(err).into_response();
        assert_eq!(response.status(), StatusCode::CONFLICT);
    }

    #[test]
    fn other_database_errors_stay_internal() {
        let response = ApiError::Database(DatabaseError::Connection(sqlx::Error::RowNotFound)).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
