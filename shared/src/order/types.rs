//! Order entity
//!
//! This is also the record format persisted in the store: one JSON object per
//! order, keyed by `order:<order_id>`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single line of an order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    /// Catalog item reference (SKU, product id, ...)
    pub item_id: String,
    pub quantity: u32,
    /// Unit price in minor currency units
    pub price: u64,
}

impl LineItem {
    pub fn new(item_id: impl Into<String>, quantity: u32, price: u64) -> Self {
        Self {
            item_id: item_id.into(),
            quantity,
            price,
        }
    }
}

/// Order entity
///
/// Timestamps only ever move forward: `created_at` is fixed at creation,
/// `shipped_at` and `completed_at` go from absent to set exactly once (see
/// [`Order::transition`](super::status)).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    /// Random identifier assigned at creation
    pub order_id: u64,
    /// Opaque customer identifier supplied by the client
    pub customer_id: String,
    /// Items in the order, in the order the client sent them
    pub line_items: Vec<LineItem>,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Shipping timestamp
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shipped_at: Option<DateTime<Utc>>,
    /// Completion timestamp (requires `shipped_at`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}

impl Order {
    /// Create a fresh order that has been neither shipped nor completed
    pub fn new(
        order_id: u64,
        customer_id: impl Into<String>,
        line_items: Vec<LineItem>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            order_id,
            customer_id: customer_id.into(),
            line_items,
            created_at,
            shipped_at: None,
            completed_at: None,
        }
    }
}
