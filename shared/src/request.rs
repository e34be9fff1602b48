//! Request bodies and query parameters of the order API

use crate::error::{AppError, AppResult};
use crate::order::LineItem;
use crate::util::parse_decimal_u64;
use serde::Deserialize;

/// `POST /orders` body
#[derive(Debug, Clone, Deserialize)]
pub struct CreateOrderRequest {
    pub customer_id: String,
    pub line_items: Vec<LineItem>,
}

/// `PUT /orders/{id}` body
///
/// `status` stays a plain string so an unknown value can be reported with
/// the order service's own error code instead of a deserialization failure.
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateOrderRequest {
    pub status: String,
}

/// `GET /orders` query parameters
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListOrdersQuery {
    /// Decimal cursor returned as `next` by the previous page (default: start)
    #[serde(default)]
    pub cursor: Option<String>,
}

impl ListOrdersQuery {
    /// Parse the cursor, treating a missing or empty value as the start
    pub fn cursor(&self) -> AppResult<u64> {
        match self.cursor.as_deref() {
            None | Some("") => Ok(0),
            Some(raw) => parse_decimal_u64(raw)
                .ok_or_else(|| AppError::invalid_format(format!("Invalid cursor: {}", raw))),
        }
    }
}
