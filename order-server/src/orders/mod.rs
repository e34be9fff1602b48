//! Order persistence
//!
//! - [`keys`]: store key layout
//! - [`OrderRepository`]: CRUD and cursor enumeration over a record store
//! - [`RepositoryError`]: failure taxonomy

mod error;
pub mod keys;
mod repository;

pub use error::{RepositoryError, RepositoryResult};
pub use repository::{DEFAULT_STORE_TIMEOUT, FindAllPage, FindResult, OrderRepository};
