//! Unified error handling for the service.
//!
//! Every failure surfaces as an [`AppError`] kind mapped to an HTTP status
//! and a JSON body carrying `success: false`, a human-readable `message`,
//! and a machine-checkable `error` slug. Database and internal failures are
//! captured to Sentry and their detail is redacted from the response.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use pixelpress_core::{OrderError, PolicyError, PricingError};

use crate::db::RepositoryError;
use crate::services::invoice::RenderError;

/// Application-level error type.
#[derive(Debug, Error)]
pub enum AppError {
    /// Missing or malformed input fields.
    #[error("{0}")]
    Validation(String),

    /// No authenticated actor on the request.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// The actor's role does not permit the operation.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Singleton/uniqueness violation.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// The request conflicts with current resource state (illegal status
    /// transition, price mismatch, invoice not issuable).
    #[error("{0}")]
    State(String),

    /// Invoice conversion failed; the caller may retry.
    #[error("Invoice rendering failed: {0}")]
    Render(#[source] RenderError),

    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[source] RepositoryError),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Machine-checkable kind slug carried in the response body.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation",
            Self::Unauthorized(_) => "unauthorized",
            Self::Forbidden(_) => "forbidden",
            Self::NotFound(_) => "not_found",
            Self::Conflict(_) => "conflict",
            Self::State(_) => "state",
            Self::Render(_) => "render",
            Self::Database(_) => "database",
            Self::Internal(_) => "internal",
        }
    }

    const fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Conflict(_) | Self::State(_) => StatusCode::CONFLICT,
            Self::Render(_) => StatusCode::BAD_GATEWAY,
            Self::Database(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// JSON error body.
#[derive(Debug, Serialize)]
struct ErrorBody {
    success: bool,
    message: String,
    error: &'static str,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Server-side failures are captured; client errors are not.
        if matches!(self, Self::Database(_) | Self::Internal(_) | Self::Render(_)) {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        let status = self.status();

        // Don't expose internal error details to clients
        let message = match &self {
            Self::Database(_) | Self::Internal(_) => "Internal server error".to_string(),
            Self::Render(_) => "Error generating invoice".to_string(),
            _ => self.to_string(),
        };

        let body = ErrorBody {
            success: false,
            message,
            error: self.kind(),
        };

        (status, Json(body)).into_response()
    }
}

impl From<RepositoryError> for AppError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound => Self::NotFound("resource not found".to_string()),
            RepositoryError::Conflict(message) => Self::Conflict(message),
            other => Self::Database(other),
        }
    }
}

impl From<RenderError> for AppError {
    fn from(err: RenderError) -> Self {
        Self::Render(err)
    }
}

impl From<PricingError> for AppError {
    fn from(err: PricingError) -> Self {
        Self::Validation(err.to_string())
    }
}

impl From<PolicyError> for AppError {
    fn from(err: PolicyError) -> Self {
        Self::Validation(err.to_string())
    }
}

impl From<OrderError> for AppError {
    fn from(err: OrderError) -> Self {
        match err {
            OrderError::PaymentMismatch { .. } => Self::State(err.to_string()),
            other => Self::Validation(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_app_error_display() {
        let err = AppError::NotFound("order 123".to_string());
        assert_eq!(err.to_string(), "Not found: order 123");

        let err = AppError::Validation("no order items provided".to_string());
        assert_eq!(err.to_string(), "no order items provided");
    }

    #[test]
    fn test_app_error_status_codes() {
        fn get_status(err: AppError) -> StatusCode {
            err.into_response().status()
        }

        assert_eq!(
            get_status(AppError::Validation("test".to_string())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            get_status(AppError::Unauthorized("test".to_string())),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            get_status(AppError::Forbidden("test".to_string())),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            get_status(AppError::NotFound("test".to_string())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            get_status(AppError::Conflict("test".to_string())),
            StatusCode::CONFLICT
        );
        assert_eq!(
            get_status(AppError::State("test".to_string())),
            StatusCode::CONFLICT
        );
        assert_eq!(
            get_status(AppError::Internal("test".to_string())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn repository_not_found_becomes_not_found() {
        let err = AppError::from(RepositoryError::NotFound);
        assert_eq!(err.kind(), "not_found");
    }

    #[test]
    fn payment_mismatch_is_a_state_error() {
        use rust_decimal::Decimal;

        let err = AppError::from(OrderError::PaymentMismatch {
            declared: Decimal::from(5),
            expected: Decimal::from(10),
        });
        assert_eq!(err.kind(), "state");

        let err = AppError::from(OrderError::EmptyCart);
        assert_eq!(err.kind(), "validation");
    }
}
