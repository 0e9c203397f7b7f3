//! Service error type and its HTTP envelope `{ error, message? }`.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::stock::QuantityCheck;
use crate::store::StoreError;

#[derive(Error, Debug)]
pub enum StorefrontError {
    #[error("{0}")]
    Validation(String),

    #[error("{}", .0.message.as_deref().unwrap_or("Invalid quantity"))]
    Quantity(QuantityCheck),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("Storage error: {0}")]
    Storage(#[from] StoreError),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, StorefrontError>;

impl StorefrontError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) | Self::Quantity(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Storage(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation_error",
            Self::Quantity(_) => "invalid_quantity",
            Self::Unauthorized(_) => "unauthorized",
            Self::Forbidden(_) => "forbidden",
            Self::NotFound(_) => "not_found",
            Self::Storage(_) | Self::Internal(_) => "internal_error",
        }
    }
}

impl From<validator::ValidationErrors> for StorefrontError {
    fn from(e: validator::ValidationErrors) -> Self {
        Self::Validation(e.to_string())
    }
}

impl IntoResponse for StorefrontError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match &self {
            Self::Storage(_) | Self::Internal(_) => {
                tracing::error!(error = %self, "request failed");
                json!({ "error": self.code(), "message": "An unexpected error occurred" })
            }
            Self::Quantity(check) => json!({
                "error": self.code(),
                "message": self.to_string(),
                "suggestedQty": check.suggested_qty,
            }),
            _ => json!({ "error": self.code(), "message": self.to_string() }),
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(StorefrontError::NotFound("Cart item").status(), StatusCode::NOT_FOUND);
        assert_eq!(StorefrontError::NotFound("Cart item").to_string(), "Cart item not found");
        assert_eq!(StorefrontError::Forbidden("admins only".into()).status(), StatusCode::FORBIDDEN);
        let q = crate::stock::validate_quantity(1, 3, None);
        let err = StorefrontError::Quantity(q);
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(err.to_string(), "Minimum order quantity is 3");
    }

    #[test]
    fn test_internal_errors_hide_details() {
        let resp = StorefrontError::Internal("pool timed out".into()).into_response();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
