//! Unified error codes for the order service
//!
//! Error codes are organized by category:
//! - 0xxx: General errors
//! - 4xxx: Order errors
//! - 9xxx: System errors

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unified error code enum
///
/// All error codes are represented as u16 values so clients can match on
/// them without parsing messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u16", try_from = "u16")]
#[repr(u16)]
pub enum ErrorCode {
    // ==================== 0xxx: General ====================
    /// Invalid request
    InvalidRequest = 5,
    /// Invalid format
    InvalidFormat = 6,
    /// Required field missing
    RequiredField = 7,

    // ==================== 4xxx: Order ====================
    /// Order not found
    OrderNotFound = 4001,
    /// Order id already taken
    OrderAlreadyExists = 4002,
    /// Order has already been shipped
    OrderAlreadyShipped = 4003,
    /// Order has not been shipped yet
    OrderNotShipped = 4004,
    /// Order has already been completed
    OrderAlreadyCompleted = 4005,
    /// Unknown order status
    InvalidStatus = 4006,

    // ==================== 9xxx: System ====================
    /// Internal server error
    InternalError = 9001,
    /// Database error
    DatabaseError = 9002,
    /// Operation timed out
    TimeoutError = 9004,

    // ==================== 94xx: Storage ====================
    /// Stored data could not be decoded
    StorageCorrupted = 9403,
}

impl ErrorCode {
    /// Get the numeric code
    #[inline]
    pub const fn code(&self) -> u16 {
        *self as u16
    }

    /// Get the default message for this error code
    pub const fn message(&self) -> &'static str {
        match self {
            // General
            ErrorCode::InvalidRequest => "Invalid request",
            ErrorCode::InvalidFormat => "Invalid format",
            ErrorCode::RequiredField => "Required field is missing",

            // Order
            ErrorCode::OrderNotFound => "Order not found",
            ErrorCode::OrderAlreadyExists => "Order already exists",
            ErrorCode::OrderAlreadyShipped => "Order has already been shipped",
            ErrorCode::OrderNotShipped => "Order has not been shipped",
            ErrorCode::OrderAlreadyCompleted => "Order has already been completed",
            ErrorCode::InvalidStatus => "Unknown order status",

            // System
            ErrorCode::InternalError => "Internal server error",
            ErrorCode::DatabaseError => "Database error",
            ErrorCode::TimeoutError => "Operation timed out",

            // Storage
            ErrorCode::StorageCorrupted => "Storage corrupted (data could not be decoded)",
        }
    }
}

impl From<ErrorCode> for u16 {
    #[inline]
    fn from(code: ErrorCode) -> Self {
        code.code()
    }
}

/// Error when converting from an invalid u16 to ErrorCode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidErrorCode(pub u16);

impl fmt::Display for InvalidErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid error code: {}", self.0)
    }
}

impl std::error::Error for InvalidErrorCode {}

impl TryFrom<u16> for ErrorCode {
    type Error = InvalidErrorCode;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        match value {
            // General
            5 => Ok(ErrorCode::InvalidRequest),
            6 => Ok(ErrorCode::InvalidFormat),
            7 => Ok(ErrorCode::RequiredField),

            // Order
            4001 => Ok(ErrorCode::OrderNotFound),
            4002 => Ok(ErrorCode::OrderAlreadyExists),
            4003 => Ok(ErrorCode::OrderAlreadyShipped),
            4004 => Ok(ErrorCode::OrderNotShipped),
            4005 => Ok(ErrorCode::OrderAlreadyCompleted),
            4006 => Ok(ErrorCode::InvalidStatus),

            // System
            9001 => Ok(ErrorCode::InternalError),
            9002 => Ok(ErrorCode::DatabaseError),
            9004 => Ok(ErrorCode::TimeoutError),
            9403 => Ok(ErrorCode::StorageCorrupted),

            _ => Err(InvalidErrorCode(value)),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}
