//! Repository errors

use crate::store::StoreError;
use thiserror::Error;

/// Order repository errors
///
/// The repository never logs; each variant carries the key it was working on
/// and the API layer decides what to tell the client.
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("order not found: {key}")]
    NotExist { key: String },

    #[error("order already exists: {key}")]
    AlreadyExists { key: String },

    /// Stored bytes do not decode, or decode to an order with a different id
    #[error("corrupt order record: {key}")]
    Corrupt {
        key: String,
        #[source]
        source: Option<serde_json::Error>,
    },

    #[error("failed to encode order: {source}")]
    Encode {
        #[source]
        source: serde_json::Error,
    },

    #[error("store {op} failed for {key}: {source}")]
    Store {
        op: &'static str,
        key: String,
        #[source]
        source: StoreError,
    },
}

impl RepositoryError {
    pub(crate) fn store(op: &'static str, key: impl Into<String>, source: StoreError) -> Self {
        Self::Store {
            op,
            key: key.into(),
            source,
        }
    }

    pub fn is_not_exist(&self) -> bool {
        matches!(self, Self::NotExist { .. })
    }
}

pub type RepositoryResult<T> = Result<T, RepositoryError>;
