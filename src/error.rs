//! Error types for retoots
//!
//! All errors in the application are converted to `AppError`,
//! which implements `IntoResponse` for proper HTTP error responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

/// Application-wide error type
///
/// Every failure a caller can observe is a client error (400): the gateway
/// does not tell apart a bad reference, a denied root author and an
/// unreachable upstream beyond the message itself.
#[derive(Debug, Error)]
pub enum AppError {
    /// Required query parameter is absent (400)
    #[error("Missing parameter: {0}")]
    MissingParameter(&'static str),

    /// Status reference could not be parsed (400)
    #[error("Invalid status reference: {0}")]
    Normalization(String),

    /// Root author not allowed or not resolvable (400)
    #[error("Status is not allowed")]
    AuthorizationDenied,

    /// Remote Mastodon server failed or returned garbage (400)
    #[error("Upstream error: {0}")]
    Upstream(String),

    /// Upstream kept returning next-page cursors past the configured limit (400)
    #[error("Upstream returned more than {0} pages")]
    TooManyPages(usize),

    /// Configuration error (500)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Internal server error (500)
    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// Short machine-readable label, used as metric label and log field
    pub fn kind(&self) -> &'static str {
        match self {
            AppError::MissingParameter(_) => "missing_parameter",
            AppError::Normalization(_) => "normalization",
            AppError::AuthorizationDenied => "authorization_denied",
            AppError::Upstream(_) => "upstream",
            AppError::TooManyPages(_) => "too_many_pages",
            AppError::Config(_) => "config",
            AppError::Internal(_) => "internal",
        }
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        AppError::Upstream(err.to_string())
    }
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        AppError::Config(err.to_string())
    }
}

impl IntoResponse for AppError {
    /// Convert error to HTTP response
    ///
    /// Maps each error variant to appropriate HTTP status code
    /// and JSON error body.
    fn into_response(self) -> Response {
        use axum::Json;

        let status = match &self {
            AppError::MissingParameter(_)
            | AppError::Normalization(_)
            | AppError::AuthorizationDenied
            | AppError::Upstream(_)
            | AppError::TooManyPages(_) => StatusCode::BAD_REQUEST,
            AppError::Config(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let error_message = match &self {
            AppError::Internal(_) => "Internal server error".to_string(),
            _ => self.to_string(),
        };

        if status.is_server_error() {
            tracing::error!(error = %self, "Request failed");
        } else {
            tracing::debug!(error = %self, kind = self.kind(), "Request rejected");
        }

        use crate::metrics::ERRORS_TOTAL;
        ERRORS_TOTAL.with_label_values(&[self.kind()]).inc();

        let body = Json(serde_json::json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}

/// Result type alias using AppError
pub type Result<T> = std::result::Result<T, AppError>;
