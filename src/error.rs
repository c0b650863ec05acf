//! Service error taxonomy and its HTTP mapping.
//!
//! Every per-request failure ends up here and is turned into
//! `{message, error, detail?}` with a matching status code.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use thiserror::Error;
use utoipa::ToSchema;

use crate::catalog::CatalogError;
use crate::orders::OrderStatus;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    Validation(String),

    #[error("email exists")]
    DuplicateEmail,

    #[error("{0} not found")]
    NotFound(String),

    #[error("wrong password")]
    BadPassword,

    /// Uniform login failure; hides whether the email exists
    #[error("invalid email or password")]
    InvalidCredentials,

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("cannot change order status from {from} to {to}")]
    InvalidTransition { from: OrderStatus, to: OrderStatus },

    #[error("failed to fetch product data from catalog service: {message}")]
    UpstreamUnavailable {
        status: Option<u16>,
        detail: Option<serde_json::Value>,
        message: String,
    },

    #[error("persistence error: {0}")]
    Persistence(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Validation(_) => "VALIDATION_ERROR",
            AppError::DuplicateEmail => "DUPLICATE_EMAIL",
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::BadPassword => "BAD_PASSWORD",
            AppError::InvalidCredentials => "INVALID_CREDENTIALS",
            AppError::Unauthorized(_) => "UNAUTHORIZED",
            AppError::Forbidden(_) => "FORBIDDEN",
            AppError::InvalidTransition { .. } => "INVALID_TRANSITION",
            AppError::UpstreamUnavailable { .. } => "UPSTREAM_UNAVAILABLE",
            AppError::Persistence(_) => "PERSISTENCE_ERROR",
            AppError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    pub fn http_status(&self) -> StatusCode {
        match self {
            AppError::Validation(_)
            | AppError::DuplicateEmail
            | AppError::BadPassword
            | AppError::InvalidCredentials => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::InvalidTransition { .. } => StatusCode::CONFLICT,
            // Forward the upstream error status; anything else is a bad gateway
            AppError::UpstreamUnavailable { status, .. } => status
                .filter(|s| *s >= 400)
                .and_then(|s| StatusCode::from_u16(s).ok())
                .unwrap_or(StatusCode::BAD_GATEWAY),
            AppError::Persistence(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message shown to the client. Internal details stay in the logs.
    fn public_message(&self) -> String {
        match self {
            AppError::UpstreamUnavailable { .. } => {
                "failed to fetch product data from catalog service".to_string()
            }
            AppError::Persistence(_) => "failed to process request".to_string(),
            AppError::Internal(_) => "internal server error".to_string(),
            other => other.to_string(),
        }
    }
}

impl From<CatalogError> for AppError {
    fn from(e: CatalogError) -> Self {
        match e {
            CatalogError::NotFound(id) => AppError::NotFound(format!("product {}", id)),
            CatalogError::Unavailable {
                status,
                detail,
                message,
            } => AppError::UpstreamUnavailable {
                status,
                detail,
                message,
            },
        }
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut fields: Vec<_> = errors.field_errors().into_iter().collect();
        fields.sort_by(|a, b| a.0.cmp(&b.0));

        let message = fields
            .into_iter()
            .flat_map(|(field, errs)| {
                errs.iter().map(move |e| match &e.message {
                    Some(msg) => msg.to_string(),
                    None => format!("{} is invalid", field),
                })
            })
            .collect::<Vec<_>>()
            .join("; ");
        AppError::Validation(message)
    }
}

impl From<sqlx::Error> for AppError {
    fn from(e: sqlx::Error) -> Self {
        AppError::Persistence(e.to_string())
    }
}

/// JSON error body
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    pub message: String,
    /// Stable error code
    #[schema(value_type = String, example = "NOT_FOUND")]
    pub error: &'static str,
    /// Upstream body forwarded from the catalog
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<Object>)]
    pub detail: Option<serde_json::Value>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.http_status();
        if status.is_server_error() {
            tracing::error!(error = %self, code = self.code(), "Request failed");
        }

        let detail = match &self {
            AppError::UpstreamUnavailable { detail, .. } => detail.clone(),
            _ => None,
        };
        let body = ErrorResponse {
            message: self.public_message(),
            error: self.code(),
            detail,
        };
        (status, Json(body)).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_status() {
        assert_eq!(AppError::DuplicateEmail.http_status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            AppError::InvalidCredentials.http_status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::NotFound("order".into()).http_status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::InvalidTransition {
                from: OrderStatus::Completed,
                to: OrderStatus::Pending
            }
            .http_status(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            AppError::Persistence("io".into()).http_status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_upstream_status_forwarding() {
        let forwarded = AppError::UpstreamUnavailable {
            status: Some(503),
            detail: None,
            message: "down".into(),
        };
        assert_eq!(forwarded.http_status(), StatusCode::SERVICE_UNAVAILABLE);

        let no_status = AppError::UpstreamUnavailable {
            status: None,
            detail: None,
            message: "timeout".into(),
        };
        assert_eq!(no_status.http_status(), StatusCode::BAD_GATEWAY);

        let success_status = AppError::UpstreamUnavailable {
            status: Some(200),
            detail: None,
            message: "garbage".into(),
        };
        assert_eq!(success_status.http_status(), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn test_catalog_error_conversion() {
        let err: AppError = CatalogError::NotFound("p9".into()).into();
        assert!(matches!(err, AppError::NotFound(ref what) if what == "product p9"));
        assert_eq!(err.to_string(), "product p9 not found");

        let err: AppError = CatalogError::unavailable("down").into();
        assert_eq!(err.code(), "UPSTREAM_UNAVAILABLE");
    }

    #[test]
    fn test_validation_errors_conversion() {
        let mut errors = validator::ValidationErrors::new();
        errors.add(
            "password",
            validator::ValidationError::new("length").with_message("too short".into()),
        );
        errors.add("email", validator::ValidationError::new("email"));

        let err = AppError::from(errors);
        assert_eq!(err.http_status(), StatusCode::BAD_REQUEST);
        assert_eq!(err.to_string(), "email is invalid; too short");
    }

    #[test]
    fn test_public_message_hides_internals() {
        let err = AppError::Persistence("connection reset by peer at 10.0.0.3".into());
        assert_eq!(err.public_message(), "failed to process request");
        assert_eq!(AppError::DuplicateEmail.public_message(), "email exists");
    }
}
