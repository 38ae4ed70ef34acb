//! Line-item and stock arithmetic.
//!
//! All quantities are `i32` (matching the `INT` columns) and all money is
//! integer cents (`i64`). Every operation is overflow-checked; an overflow is
//! reported as an error instead of wrapping.

use std::collections::BTreeMap;

use ff_schemas::ItemRequest;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StockError {
    #[error("quantity must be positive, got {0}")]
    NonPositiveQuantity(i32),

    #[error("insufficient stock: requested {requested}, available {available}")]
    Insufficient { requested: i32, available: i32 },

    #[error("product {0} is not part of the order")]
    NotInOrder(Uuid),

    #[error("cannot remove {requested} item(s), order only holds {held}")]
    RemoveExceedsHeld { requested: i32, held: i32 },

    #[error("an order holds at most {max} items, this change would make {total}")]
    TooManyItems { total: i32, max: i32 },

    #[error("arithmetic overflow computing {0}")]
    Overflow(&'static str),
}

/// Reserve `qty` units out of `stock`. Returns the stock left afterwards.
pub fn reserve(stock: i32, qty: i32) -> Result<i32, StockError> {
    if qty <= 0 {
        return Err(StockError::NonPositiveQuantity(qty));
    }
    if qty > stock {
        return Err(StockError::Insufficient {
            requested: qty,
            available: stock.max(0),
        });
    }
    Ok(stock - qty)
}

/// Give `qty` units back to `stock`.
pub fn release(stock: i32, qty: i32) -> Result<i32, StockError> {
    if qty <= 0 {
        return Err(StockError::NonPositiveQuantity(qty));
    }
    stock
        .checked_add(qty)
        .ok_or(StockError::Overflow("released stock"))
}

/// Item count after adding `qty` to an order already holding `current`.
pub fn item_cap(current: i32, qty: i32, max: i32) -> Result<i32, StockError> {
    if qty <= 0 {
        return Err(StockError::NonPositiveQuantity(qty));
    }
    let total = current
        .checked_add(qty)
        .ok_or(StockError::Overflow("nb_items"))?;
    if total > max {
        return Err(StockError::TooManyItems { total, max });
    }
    Ok(total)
}

/// Collapse a basket into one quantity per product, in ascending product id
/// order. Product rows are always locked in this order.
pub fn merge_items(items: &[ItemRequest]) -> Result<BTreeMap<Uuid, i32>, StockError> {
    let mut merged: BTreeMap<Uuid, i32> = BTreeMap::new();
    for item in items {
        if item.quantity <= 0 {
            return Err(StockError::NonPositiveQuantity(item.quantity));
        }
        let qty = merged.entry(item.product_id).or_insert(0);
        *qty = qty
            .checked_add(item.quantity)
            .ok_or(StockError::Overflow("line quantity"))?;
    }
    Ok(merged)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    pub quantity: i32,
    pub unit_price_cents: i64,
}

impl LineItem {
    pub fn total_cents(&self) -> Result<i64, StockError> {
        self.unit_price_cents
            .checked_mul(i64::from(self.quantity))
            .ok_or(StockError::Overflow("line total"))
    }
}

/// Aggregates stored on the order row. Always derived from the lines.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderTotals {
    pub nb_items: i32,
    pub total_cents: i64,
}

impl OrderTotals {
    pub fn from_lines<'a, I>(lines: I) -> Result<Self, StockError>
    where
        I: IntoIterator<Item = &'a LineItem>,
    {
        let mut out = OrderTotals::default();
        for line in lines {
            out.nb_items = out
                .nb_items
                .checked_add(line.quantity)
                .ok_or(StockError::Overflow("nb_items"))?;
            out.total_cents = out
                .total_cents
                .checked_add(line.total_cents()?)
                .ok_or(StockError::Overflow("total_cents"))?;
        }
        Ok(out)
    }
}

/// The lines of one order, keyed by product.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrderLines {
    lines: BTreeMap<Uuid, LineItem>,
}

impl OrderLines {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_items<I>(items: I) -> Self
    where
        I: IntoIterator<Item = (Uuid, LineItem)>,
    {
        Self {
            lines: items.into_iter().collect(),
        }
    }

    pub fn get(&self, product_id: &Uuid) -> Option<&LineItem> {
        self.lines.get(product_id)
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Uuid, &LineItem)> {
        self.lines.iter()
    }

    /// Add `qty` units of a product. The unit price of an existing line is
    /// kept: the customer pays the price that was current when the product
    /// first entered the order.
    pub fn add(
        &mut self,
        product_id: Uuid,
        qty: i32,
        unit_price_cents: i64,
    ) -> Result<&LineItem, StockError> {
        if qty <= 0 {
            return Err(StockError::NonPositiveQuantity(qty));
        }
        let line = self.lines.entry(product_id).or_insert(LineItem {
            quantity: 0,
            unit_price_cents,
        });
        line.quantity = line
            .quantity
            .checked_add(qty)
            .ok_or(StockError::Overflow("line quantity"))?;
        Ok(&*line)
    }

    /// Remove `qty` units of a product; the line disappears when it reaches
    /// zero. Returns the quantity released, to be given back to stock.
    pub fn remove(&mut self, product_id: Uuid, qty: i32) -> Result<i32, StockError> {
        if qty <= 0 {
            return Err(StockError::NonPositiveQuantity(qty));
        }
        let held = self
            .lines
            .get(&product_id)
            .map(|l| l.quantity)
            .ok_or(StockError::NotInOrder(product_id))?;
        if qty > held {
            return Err(StockError::RemoveExceedsHeld {
                requested: qty,
                held,
            });
        }
        let left = held - qty;
        if left == 0 {
            self.lines.remove(&product_id);
        } else if let Some(line) = self.lines.get_mut(&product_id) {
            line.quantity = left;
        }
        Ok(qty)
    }

    pub fn totals(&self) -> Result<OrderTotals, StockError> {
        OrderTotals::from_lines(self.lines.values())
    }
}
