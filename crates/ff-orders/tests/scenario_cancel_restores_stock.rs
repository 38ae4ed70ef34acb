//! Scenario: stock reservation round-trips through an order's life.
//!
//! Simulates a small in-memory catalogue driven only by the pure rules of
//! this crate: reserving on add, releasing on remove, and releasing every
//! remaining line on cancellation. Stock must end where it started and never
//! dip below zero along the way.

use std::collections::HashMap;

use ff_orders::{
    next_status, release, releases_stock, reserve, OrderEvent, OrderLines, OrderTotals,
    StockError,
};
use ff_schemas::OrderStatus;
use uuid::Uuid;

struct Catalogue {
    stock: HashMap<Uuid, i32>,
    price: HashMap<Uuid, i64>,
}

impl Catalogue {
    fn add_to(&mut self, lines: &mut OrderLines, pid: Uuid, qty: i32) -> Result<(), StockError> {
        let left = reserve(self.stock[&pid], qty)?;
        lines.add(pid, qty, self.price[&pid])?;
        self.stock.insert(pid, left);
        Ok(())
    }

    fn remove_from(
        &mut self,
        lines: &mut OrderLines,
        pid: Uuid,
        qty: i32,
    ) -> Result<(), StockError> {
        lines.remove(pid, qty)?;
        let back = release(self.stock[&pid], qty)?;
        self.stock.insert(pid, back);
        Ok(())
    }
}

#[test]
fn cancel_restores_every_reserved_unit() {
    let burger = Uuid::new_v4();
    let soda = Uuid::new_v4();

    let mut cat = Catalogue {
        stock: HashMap::from([(burger, 3), (soda, 10)]),
        price: HashMap::from([(burger, 1150), (soda, 250)]),
    };

    let mut lines = OrderLines::new();
    cat.add_to(&mut lines, burger, 2).unwrap();
    cat.add_to(&mut lines, soda, 4).unwrap();
    cat.remove_from(&mut lines, soda, 1).unwrap();

    assert_eq!(cat.stock[&burger], 1);
    assert_eq!(cat.stock[&soda], 7);
    assert_eq!(
        lines.totals().unwrap(),
        OrderTotals {
            nb_items: 5,
            total_cents: 2 * 1150 + 3 * 250
        }
    );

    // Over-reservation is refused and leaves stock untouched.
    let err = cat.add_to(&mut lines, burger, 2).unwrap_err();
    assert!(matches!(err, StockError::Insufficient { requested: 2, available: 1 }));
    assert_eq!(cat.stock[&burger], 1);

    let status = next_status(OrderStatus::Preparing, OrderEvent::Cancel).unwrap();
    assert!(releases_stock(status));

    let held: Vec<(Uuid, i32)> = lines.iter().map(|(p, l)| (*p, l.quantity)).collect();
    for (pid, qty) in held {
        cat.remove_from(&mut lines, pid, qty).unwrap();
    }

    assert!(lines.is_empty());
    assert_eq!(cat.stock[&burger], 3);
    assert_eq!(cat.stock[&soda], 10);
}
