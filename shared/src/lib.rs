//! Shared types for the order service
//!
//! Domain model, request/response bodies and the unified error system used by
//! the server and its tests.

pub mod error;
pub mod order;
pub mod request;
pub mod response;
pub mod util;

// Re-exports
pub use error::{ApiResponse, AppError, AppResult, ErrorCategory, ErrorCode};
pub use order::{LineItem, Order, OrderStatus, TransitionError};
pub use request::{CreateOrderRequest, ListOrdersQuery, UpdateOrderRequest};
pub use response::OrderListResponse;
