//! Fulfillment status transitions
//!
//! ```text
//! created ──shipped──▶ shipped ──completed──▶ completed
//! ```
//!
//! Each edge can be taken once. Skipping `shipped` is rejected.

use super::types::Order;
use crate::error::{AppError, ErrorCode};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Status a client can move an order into
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Shipped,
    Completed,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Shipped => "shipped",
            Self::Completed => "completed",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = TransitionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "shipped" => Ok(Self::Shipped),
            "completed" => Ok(Self::Completed),
            other => Err(TransitionError::UnknownStatus(other.to_string())),
        }
    }
}

/// Rejected status change
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransitionError {
    #[error("order {0} has already been shipped")]
    AlreadyShipped(u64),

    #[error("order {0} has not been shipped yet")]
    NotShipped(u64),

    #[error("order {0} has already been completed")]
    AlreadyCompleted(u64),

    #[error("unknown order status: {0:?}")]
    UnknownStatus(String),
}

impl Order {
    /// Move the order into `status`, stamping the matching timestamp with `now`.
    ///
    /// The order is left untouched when the transition is rejected.
    /// A timestamp is never stamped earlier than the one before it
    /// (`created_at <= shipped_at <= completed_at`), even if `now` comes from
    /// a clock that went backwards.
    pub fn transition(
        &mut self,
        status: OrderStatus,
        now: DateTime<Utc>,
    ) -> Result<(), TransitionError> {
        match status {
            OrderStatus::Shipped => {
                if self.shipped_at.is_some() {
                    return Err(TransitionError::AlreadyShipped(self.order_id));
                }
                self.shipped_at = Some(now.max(self.created_at));
            }
            OrderStatus::Completed => {
                if self.completed_at.is_some() {
                    return Err(TransitionError::AlreadyCompleted(self.order_id));
                }
                let Some(shipped_at) = self.shipped_at else {
                    return Err(TransitionError::NotShipped(self.order_id));
                };
                self.completed_at = Some(now.max(shipped_at));
            }
        }
        Ok(())
    }
}

impl From<TransitionError> for AppError {
    fn from(err: TransitionError) -> Self {
        let code = match &err {
            TransitionError::AlreadyShipped(_) => ErrorCode::OrderAlreadyShipped,
            TransitionError::NotShipped(_) => ErrorCode::OrderNotShipped,
            TransitionError::AlreadyCompleted(_) => ErrorCode::OrderAlreadyCompleted,
            TransitionError::UnknownStatus(_) => ErrorCode::InvalidStatus,
        };
        AppError::with_message(code, err.to_string())
    }
}
