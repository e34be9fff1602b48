//! HTTP status code mapping for error codes

use super::codes::ErrorCode;
use http::StatusCode;

impl ErrorCode {
    /// Get the appropriate HTTP status code for this error code
    pub fn http_status(&self) -> StatusCode {
        match self {
            // 404 Not Found
            Self::OrderNotFound => StatusCode::NOT_FOUND,

            // 409 Conflict
            Self::OrderAlreadyExists => StatusCode::CONFLICT,

            // 503 Service Unavailable (transient errors, client can retry)
            Self::TimeoutError => StatusCode::SERVICE_UNAVAILABLE,

            // 500 Internal Server Error
            Self::InternalError | Self::DatabaseError | Self::StorageCorrupted => {
                StatusCode::INTERNAL_SERVER_ERROR
            }

            // 400 Bad Request (default for validation and status transition errors)
            _ => StatusCode::BAD_REQUEST,
        }
    }
}
