//! Order domain types
//!
//! - [`Order`] / [`LineItem`]: the persisted entity
//! - [`OrderStatus`] / [`TransitionError`]: forward-only fulfillment changes

pub mod status;
pub mod types;

// Re-exports
pub use status::{OrderStatus, TransitionError};
pub use types::{LineItem, Order};
