//! Order lifecycle state machine.
//!
//! Every status change goes through [`next_status`]. Illegal events return a
//! [`TransitionError`]; the DB layer refuses to write anything in that case.
//!
//! ```text
//!            MarkReady         Dispatch            Deliver
//! Preparing ──────────► Ready ──────────► OnTheWay ─────────► Delivered (term.)
//!     │                   │
//!     │ Cancel            │ Cancel
//!     ▼                   ▼
//! Cancelled (term.) ◄─────┘
//! ```
//!
//! Once a driver has taken an order (`OnTheWay`) it can no longer be
//! cancelled: the food has left the kitchen.

use ff_schemas::OrderStatus;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Events that drive an order through its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderEvent {
    /// Kitchen finished preparing the order.
    MarkReady,
    /// A driver picked the order up.
    Dispatch,
    /// The driver handed the order to the customer.
    Deliver,
    /// Customer or admin cancelled the order.
    Cancel,
}

impl OrderEvent {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderEvent::MarkReady => "mark_ready",
            OrderEvent::Dispatch => "dispatch",
            OrderEvent::Deliver => "deliver",
            OrderEvent::Cancel => "cancel",
        }
    }
}

/// Returned when an event cannot legally be applied in the current status.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("illegal order transition: {} + {}", .from.as_str(), .event.as_str())]
pub struct TransitionError {
    pub from: OrderStatus,
    pub event: OrderEvent,
}

/// Compute the status that results from applying `event` in status `from`.
pub fn next_status(from: OrderStatus, event: OrderEvent) -> Result<OrderStatus, TransitionError> {
    use OrderEvent::*;
    use OrderStatus::*;

    match (from, event) {
        (Preparing, MarkReady) => Ok(Ready),
        (Ready, Dispatch) => Ok(OnTheWay),
        (OnTheWay, Deliver) => Ok(Delivered),
        (Preparing | Ready, Cancel) => Ok(Cancelled),
        _ => Err(TransitionError { from, event }),
    }
}

/// Line items may only be added or removed while the kitchen has not
/// finished the order.
pub fn items_editable(status: OrderStatus) -> bool {
    status == OrderStatus::Preparing
}

/// `true` when reaching this status must give the reserved stock back.
pub fn releases_stock(status: OrderStatus) -> bool {
    status == OrderStatus::Cancelled
}
