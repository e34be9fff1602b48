use std::time::Duration;
use thiserror::Error;

/// Record store errors
///
/// Everything here is a transport or storage failure. Missing keys and failed
/// preconditions are reported through return values, never as errors.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] redb::DatabaseError),

    #[error("Transaction error: {0}")]
    Transaction(#[from] redb::TransactionError),

    #[error("Table error: {0}")]
    Table(#[from] redb::TableError),

    #[error("Storage error: {0}")]
    Storage(#[from] redb::StorageError),

    #[error("Commit error: {0}")]
    Commit(#[from] redb::CommitError),

    #[error("Store task failed: {0}")]
    Task(#[from] tokio::task::JoinError),

    #[error("Store call timed out after {0:?}")]
    Timeout(Duration),

    /// The caller gave up before the write committed; nothing was applied
    #[error("Store write cancelled before commit")]
    Cancelled,

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

pub type StoreResult<T> = Result<T, StoreError>;
