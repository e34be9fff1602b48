//! Response bodies of the order API

use crate::order::Order;
use serde::{Deserialize, Serialize};

/// `GET /orders` response
///
/// `next` is omitted once the enumeration is exhausted; otherwise it is the
/// cursor to pass back as `?cursor=`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderListResponse {
    pub items: Vec<Order>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next: Option<u64>,
}
