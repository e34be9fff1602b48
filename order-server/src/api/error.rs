//! Repository error to API error mapping
//!
//! Client-facing errors carry only the code and the order key. Store and
//! decoding failures are logged here with full context and reported as a
//! generic system error.

use crate::orders::RepositoryError;
use crate::store::StoreError;
use shared::{AppError, ErrorCode};

impl From<RepositoryError> for AppError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotExist { key } => {
                AppError::new(ErrorCode::OrderNotFound).with_detail("key", key)
            }
            RepositoryError::AlreadyExists { key } => {
                AppError::new(ErrorCode::OrderAlreadyExists).with_detail("key", key)
            }
            RepositoryError::Corrupt { .. } => {
                tracing::error!(error = ?err, "Corrupt order data");
                AppError::new(ErrorCode::StorageCorrupted)
            }
            RepositoryError::Encode { .. } => {
                tracing::error!(error = ?err, "Order encoding failed");
                AppError::internal("Internal server error")
            }
            RepositoryError::Store { ref source, .. } => {
                tracing::error!(error = %err, "Order store failure");
                match source {
                    StoreError::Timeout(_) | StoreError::Cancelled => {
                        AppError::new(ErrorCode::TimeoutError)
                    }
                    _ => AppError::new(ErrorCode::DatabaseError),
                }
            }
        }
    }
}
