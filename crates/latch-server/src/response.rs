//! HTTP error response types
//!
//! Engine lookups return explicit found/not-found results; this module maps
//! the not-found/denied/invalid branches onto a JSON error body.

use actix_web::{HttpResponse, HttpResponseBuilder, http::StatusCode};
use serde::{Deserialize, Serialize};

use latch_common::ErrorCode;

/// Error body for API error responses
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub timestamp: String,
    pub status: i32,
    pub error: String,
    pub code: i32,
    pub message: String,
    pub path: String,
}

impl ErrorBody {
    pub fn new(status: StatusCode, code: i32, message: &str, path: &str) -> Self {
        ErrorBody {
            timestamp: chrono::Utc::now().to_rfc3339(),
            status: status.as_u16() as i32,
            error: status.canonical_reason().unwrap_or_default().to_string(),
            code,
            message: message.to_string(),
            path: path.to_string(),
        }
    }
}

/// Build an error response with the given status and error code.
pub fn error_response(
    status: StatusCode,
    code: &ErrorCode<'_>,
    message: &str,
    path: &str,
) -> HttpResponse {
    HttpResponseBuilder::new(status).json(ErrorBody::new(status, code.code, message, path))
}

/// 404 with the error code's own message.
pub fn not_found(code: &ErrorCode<'_>, path: &str) -> HttpResponse {
    error_response(StatusCode::NOT_FOUND, code, code.message, path)
}
