//! Error handling for the application

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::Serialize;

use crate::pricing::PricingError;

/// Application error type
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Pricing error: {0}")]
    Pricing(#[from] PricingError),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// JSON error body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error_type: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl AppError {
    fn status(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::Pricing(PricingError::UnknownProduct { .. }) => StatusCode::NOT_FOUND,
            AppError::Pricing(PricingError::ConfigurationError { .. }) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            AppError::Pricing(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Database(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_type(&self) -> &'static str {
        match self {
            AppError::NotFound(_) => "not_found",
            AppError::Database(_) => "database_error",
            AppError::Validation(_) => "validation_error",
            AppError::Forbidden(_) => "forbidden",
            AppError::Pricing(e) => e.kind(),
            AppError::Internal(_) => "internal_error",
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        // Server-side failures are logged in full but not exposed
        let (message, details) = match &self {
            AppError::Database(e) => {
                tracing::error!("Database error: {}", e);
                ("Database error".to_string(), None)
            }
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                ("Internal error".to_string(), None)
            }
            AppError::Pricing(PricingError::ConfigurationError { message, errors }) => {
                tracing::error!("Pricing configuration error: {}", message);
                (
                    "Pricing configuration error".to_string(),
                    Some(serde_json::json!({ "errors": errors })),
                )
            }
            AppError::Pricing(PricingError::InvalidRate { field, value }) => (
                self.to_string(),
                Some(serde_json::json!({ "field": field, "value": value.to_string() })),
            ),
            AppError::Pricing(PricingError::InvalidLineItem { field, .. }) => {
                (self.to_string(), Some(serde_json::json!({ "field": field })))
            }
            _ => (self.to_string(), None),
        };

        let body = ErrorResponse {
            error_type: self.error_type().to_string(),
            message,
            details,
        };

        (status, Json(body)).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_status_codes() {
        assert_eq!(AppError::NotFound("quote".into()).status(), StatusCode::NOT_FOUND);
        assert_eq!(AppError::Forbidden("closed".into()).status(), StatusCode::FORBIDDEN);
        assert_eq!(
            AppError::Pricing(PricingError::invalid_rate("discount_percent", dec!(100))).status(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            AppError::Pricing(PricingError::UnknownProduct { product_id: "x".into() }).status(),
            StatusCode::NOT_FOUND
        );
    }

    #[test]
    fn test_error_type_uses_pricing_kind() {
        let err = AppError::from(PricingError::invalid_item("width", "must be positive"));
        assert_eq!(err.error_type(), "invalid_line_item");
        assert_eq!(AppError::Validation("x".into()).error_type(), "validation_error");
    }
}
