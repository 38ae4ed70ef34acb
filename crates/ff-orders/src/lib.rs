//! ff-orders
//!
//! Pure order rules: the lifecycle state machine and the line-item / stock
//! arithmetic. No I/O. `ff-db` applies these rules inside a transaction so
//! that what is written to Postgres is exactly what these functions allow.

mod lifecycle;
mod lines;

pub use lifecycle::{items_editable, next_status, releases_stock, OrderEvent, TransitionError};
pub use lines::{
    item_cap, merge_items, release, reserve, LineItem, OrderLines, OrderTotals, StockError,
};
