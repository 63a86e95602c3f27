//! Error handling for the catalog HTTP layer

use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use catalog_db::DbError;
use thiserror::Error;
use uuid::Uuid;

/// Fields shown on the error page
#[derive(Debug)]
pub struct ErrorBody {
    pub status: StatusCode,
    pub code: String,
    pub message: String,
    pub trace_id: String,
    pub timestamp: String,
}

/// Application error types that map to HTTP responses
#[derive(Error, Debug)]
pub enum AppError {
    #[error("not found: {message}")]
    NotFound { message: String, code: String },

    #[error("data store failure: {0}")]
    Store(#[from] DbError),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// Create a not found error
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
            code: "not_found".to_string(),
        }
    }

    /// HTTP status this error maps to
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::NotFound { .. } => StatusCode::NOT_FOUND,
            AppError::Store(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl ErrorBody {
    /// Render the generic error page
    pub fn to_html(&self) -> String {
        format!(
            concat!(
                "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n",
                "<meta charset=\"utf-8\">\n<title>{status} {reason}</title>\n",
                "</head>\n<body>\n",
                "<h1>{message}</h1>\n",
                "<h2>{status} {reason}</h2>\n",
                "<p class=\"error-code\">{code}</p>\n",
                "<p class=\"trace\">trace id {trace_id} at {timestamp}</p>\n",
                "<p><a href=\"/\">Home</a></p>\n",
                "</body>\n</html>\n"
            ),
            status = self.status.as_u16(),
            reason = self.status.canonical_reason().unwrap_or("Error"),
            message = html_escape::encode_text(&self.message),
            code = html_escape::encode_text(&self.code),
            trace_id = self.trace_id,
            timestamp = self.timestamp,
        )
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let error_id = Uuid::new_v4();
        let timestamp = chrono::Utc::now().to_rfc3339();
        let status = self.status();

        let (error_code, message) = match self {
            AppError::NotFound { message, code } => (code, message),
            AppError::Store(e) => ("store_error".to_string(), e.to_string()),
            AppError::Internal(e) => ("internal_error".to_string(), format!("{e:#}")),
        };

        if status.is_server_error() {
            tracing::error!(
                error_id = %error_id,
                error_code = %error_code,
                status_code = %status.as_u16(),
                error = %message,
                "Request error"
            );
        } else {
            tracing::info!(
                error_id = %error_id,
                error_code = %error_code,
                status_code = %status.as_u16(),
                "Request error"
            );
        }

        // Hide internal error details outside debug builds
        let message = if cfg!(not(debug_assertions)) && status.is_server_error() {
            "An internal server error occurred".to_string()
        } else {
            message
        };

        let body = ErrorBody {
            status,
            code: error_code,
            message,
            trace_id: error_id.to_string(),
            timestamp,
        };

        (status, Html(body.to_html())).into_response()
    }
}
