//! Orders and their lines.
//!
//! Every mutating operation runs in one transaction that first locks the
//! order row (`select ... for update`), then the product rows it touches.
//! Totals on the order row are recomputed from the lines before commit, so
//! `nb_items` and `total_cents` always equal the sum of the lines.

use std::collections::HashMap;

use chrono::Utc;
use ff_orders::{
    item_cap, items_editable, merge_items, next_status, release, releases_stock, reserve,
    LineItem, OrderEvent, OrderLines, StockError,
};
use ff_schemas::{AddressInput, ItemRequest, Order, OrderLine, OrderStatus};
use sqlx::postgres::PgRow;
use sqlx::{PgConnection, PgPool, Row};
use uuid::Uuid;

use crate::addresses::{address_from_row, find_or_insert_address};
use crate::{DbError, DbResult};

const ORDER_SELECT: &str = r#"
    select
      o.order_id, o.customer_id, o.driver_id, o.status, o.nb_items, o.total_cents,
      o.created_at_utc, o.updated_at_utc,
      a.address_id, a.street, a.postal_code, a.city
    from orders o
    join addresses a on a.address_id = o.address_id
"#;

fn order_from_row(row: &PgRow) -> DbResult<Order> {
    let status: String = row.try_get("status")?;
    Ok(Order {
        order_id: row.try_get("order_id")?,
        customer_id: row.try_get("customer_id")?,
        driver_id: row.try_get("driver_id")?,
        address: address_from_row(row)?,
        status: OrderStatus::parse(&status).map_err(|e| DbError::Decode(e.to_string()))?,
        nb_items: row.try_get("nb_items")?,
        total_cents: row.try_get("total_cents")?,
        created_at_utc: row.try_get("created_at_utc")?,
        updated_at_utc: row.try_get("updated_at_utc")?,
        lines: Vec::new(),
    })
}

fn line_from_row(row: &PgRow) -> DbResult<OrderLine> {
    let quantity: i32 = row.try_get("quantity")?;
    let unit_price_cents: i64 = row.try_get("unit_price_cents")?;
    let line_total_cents = LineItem {
        quantity,
        unit_price_cents,
    }
    .total_cents()?;
    Ok(OrderLine {
        product_id: row.try_get("product_id")?,
        product_name: row.try_get("product_name")?,
        quantity,
        unit_price_cents,
        line_total_cents,
    })
}

/// Attach lines to already-fetched order headers with a single query.
async fn attach_lines(pool: &PgPool, mut orders: Vec<Order>) -> DbResult<Vec<Order>> {
    if orders.is_empty() {
        return Ok(orders);
    }
    let ids: Vec<Uuid> = orders.iter().map(|o| o.order_id).collect();
    let rows = sqlx::query(
        r#"
        select order_id, product_id, product_name, quantity, unit_price_cents
        from order_lines
        where order_id = any($1)
        order by product_name, product_id
        "#,
    )
    .bind(&ids[..])
    .fetch_all(pool)
    .await?;

    let mut by_order: HashMap<Uuid, Vec<OrderLine>> = HashMap::new();
    for row in &rows {
        let order_id: Uuid = row.try_get("order_id")?;
        by_order.entry(order_id).or_default().push(line_from_row(row)?);
    }
    for order in &mut orders {
        order.lines = by_order.remove(&order.order_id).unwrap_or_default();
    }
    Ok(orders)
}

pub async fn fetch_order(pool: &PgPool, order_id: Uuid) -> DbResult<Order> {
    let sql = format!("{ORDER_SELECT} where o.order_id = $1");
    let row = sqlx::query(&sql)
        .bind(order_id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| DbError::not_found("order", order_id))?;
    let order = order_from_row(&row)?;
    let mut out = attach_lines(pool, vec![order]).await?;
    out.pop().ok_or_else(|| DbError::not_found("order", order_id))
}

#[derive(Debug, Clone, Copy, Default)]
struct OrderFilter {
    customer_id: Option<Uuid>,
    driver_id: Option<Uuid>,
    status: Option<OrderStatus>,
}

async fn fetch_orders(pool: &PgPool, filter: OrderFilter) -> DbResult<Vec<Order>> {
    let sql = format!(
        r#"{ORDER_SELECT}
        where ($1::uuid is null or o.customer_id = $1)
          and ($2::uuid is null or o.driver_id = $2)
          and ($3::text is null or o.status = $3)
        order by o.created_at_utc desc, o.order_id
        "#
    );
    let rows = sqlx::query(&sql)
        .bind(filter.customer_id)
        .bind(filter.driver_id)
        .bind(filter.status.map(|s| s.as_str()))
        .fetch_all(pool)
        .await?;
    let orders = rows.iter().map(order_from_row).collect::<DbResult<Vec<_>>>()?;
    attach_lines(pool, orders).await
}

/// Newest first.
pub async fn list_orders_for_customer(pool: &PgPool, customer_id: Uuid) -> DbResult<Vec<Order>> {
    fetch_orders(
        pool,
        OrderFilter {
            customer_id: Some(customer_id),
            ..OrderFilter::default()
        },
    )
    .await
}

pub async fn list_orders_for_driver(pool: &PgPool, driver_id: Uuid) -> DbResult<Vec<Order>> {
    fetch_orders(
        pool,
        OrderFilter {
            driver_id: Some(driver_id),
            ..OrderFilter::default()
        },
    )
    .await
}

/// All orders, optionally filtered by status.
pub async fn list_orders(pool: &PgPool, status: Option<OrderStatus>) -> DbResult<Vec<Order>> {
    fetch_orders(
        pool,
        OrderFilter {
            status,
            ..OrderFilter::default()
        },
    )
    .await
}

struct LockedOrder {
    status: OrderStatus,
    driver_id: Option<Uuid>,
}

async fn lock_order(conn: &mut PgConnection, order_id: Uuid) -> DbResult<LockedOrder> {
    let row = sqlx::query("select status, driver_id from orders where order_id = $1 for update")
        .bind(order_id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| DbError::not_found("order", order_id))?;
    let status: String = row.try_get("status")?;
    Ok(LockedOrder {
        status: OrderStatus::parse(&status).map_err(|e| DbError::Decode(e.to_string()))?,
        driver_id: row.try_get("driver_id")?,
    })
}

async fn load_lines(conn: &mut PgConnection, order_id: Uuid) -> DbResult<OrderLines> {
    let rows = sqlx::query(
        "select product_id, quantity, unit_price_cents from order_lines where order_id = $1",
    )
    .bind(order_id)
    .fetch_all(&mut *conn)
    .await?;
    let mut items = Vec::with_capacity(rows.len());
    for row in &rows {
        items.push((
            row.try_get::<Uuid, _>("product_id")?,
            LineItem {
                quantity: row.try_get("quantity")?,
                unit_price_cents: row.try_get("unit_price_cents")?,
            },
        ));
    }
    Ok(OrderLines::from_items(items))
}

/// Product snapshot taken while its row is locked.
struct Reserved {
    name: String,
    price_cents: i64,
}

/// Lock the product, check availability and take `qty` units out of stock.
async fn reserve_stock(
    conn: &mut PgConnection,
    product_id: Uuid,
    qty: i32,
) -> DbResult<Reserved> {
    let row = sqlx::query(
        "select name, price_cents, stock, is_available from products where product_id = $1 for update",
    )
    .bind(product_id)
    .fetch_optional(&mut *conn)
    .await?
    .ok_or_else(|| DbError::not_found("product", product_id))?;

    let is_available: bool = row.try_get("is_available")?;
    if !is_available {
        return Err(DbError::Conflict(format!(
            "product {product_id} is not available"
        )));
    }
    let stock: i32 = row.try_get("stock")?;
    reserve(stock, qty)?;

    // Conditional decrement: the row is locked, but the guard keeps the
    // statement itself from ever taking stock below zero.
    let res = sqlx::query(
        "update products set stock = stock - $2 where product_id = $1 and stock >= $2",
    )
    .bind(product_id)
    .bind(qty)
    .execute(&mut *conn)
    .await?;
    if res.rows_affected() == 0 {
        return Err(StockError::Insufficient {
            requested: qty,
            available: stock,
        }
        .into());
    }

    Ok(Reserved {
        name: row.try_get("name")?,
        price_cents: row.try_get("price_cents")?,
    })
}

async fn release_stock(conn: &mut PgConnection, product_id: Uuid, qty: i32) -> DbResult<()> {
    let (stock,): (i32,) =
        sqlx::query_as::<_, (i32,)>("select stock from products where product_id = $1 for update")
            .bind(product_id)
            .fetch_optional(&mut *conn)
            .await?
            .ok_or_else(|| DbError::not_found("product", product_id))?;
    let new_stock = release(stock, qty)?;
    sqlx::query("update products set stock = $2 where product_id = $1")
        .bind(product_id)
        .bind(new_stock)
        .execute(&mut *conn)
        .await?;
    Ok(())
}

/// Mirror one in-memory line into `order_lines`: upsert when present,
/// delete when gone. The unit price of an existing row is never changed.
async fn write_line(
    conn: &mut PgConnection,
    order_id: Uuid,
    product_id: Uuid,
    product_name: Option<&str>,
    line: Option<&LineItem>,
) -> DbResult<()> {
    match line {
        Some(line) => {
            sqlx::query(
                r#"
                insert into order_lines (order_id, product_id, product_name, quantity, unit_price_cents)
                values ($1, $2, coalesce($3, ''), $4, $5)
                on conflict (order_id, product_id)
                do update set quantity = excluded.quantity
                "#,
            )
            .bind(order_id)
            .bind(product_id)
            .bind(product_name)
            .bind(line.quantity)
            .bind(line.unit_price_cents)
            .execute(&mut *conn)
            .await?;
        }
        None => {
            sqlx::query("delete from order_lines where order_id = $1 and product_id = $2")
                .bind(order_id)
                .bind(product_id)
                .execute(&mut *conn)
                .await?;
        }
    }
    Ok(())
}

async fn write_totals(conn: &mut PgConnection, order_id: Uuid, lines: &OrderLines) -> DbResult<()> {
    let totals = lines.totals()?;
    sqlx::query(
        r#"
        update orders
        set nb_items = $2,
            total_cents = $3,
            updated_at_utc = now()
        where order_id = $1
        "#,
    )
    .bind(order_id)
    .bind(totals.nb_items)
    .bind(totals.total_cents)
    .execute(&mut *conn)
    .await?;
    Ok(())
}

fn ensure_editable(order_id: Uuid, status: OrderStatus) -> DbResult<()> {
    if items_editable(status) {
        Ok(())
    } else {
        Err(DbError::Conflict(format!(
            "order {order_id} is {} and its items can no longer change",
            status.label()
        )))
    }
}

/// Reserve `qty` of `product_id` and fold it into `lines` + `order_lines`.
async fn add_line(
    conn: &mut PgConnection,
    order_id: Uuid,
    lines: &mut OrderLines,
    product_id: Uuid,
    qty: i32,
) -> DbResult<()> {
    if qty <= 0 {
        return Err(StockError::NonPositiveQuantity(qty).into());
    }
    let reserved = reserve_stock(conn, product_id, qty).await?;
    let line = *lines.add(product_id, qty, reserved.price_cents)?;
    write_line(conn, order_id, product_id, Some(&reserved.name), Some(&line)).await
}

/// Create a Preparing order and reserve stock for every requested item.
/// Repeated products are merged into one line and product rows are locked
/// in ascending id order. Nothing is written unless every item can be
/// reserved.
pub async fn create_order(
    pool: &PgPool,
    customer_id: Uuid,
    address: &AddressInput,
    items: &[ItemRequest],
) -> DbResult<Order> {
    let merged = merge_items(items)?;
    let mut tx = pool.begin().await?;

    let address = find_or_insert_address(&mut *tx, address).await?;
    let order_id = Uuid::new_v4();
    let now = Utc::now();

    let res = sqlx::query(
        r#"
        insert into orders (order_id, customer_id, address_id, status, created_at_utc, updated_at_utc)
        values ($1, $2, $3, 'PREPARING', $4, $4)
        "#,
    )
    .bind(order_id)
    .bind(customer_id)
    .bind(address.address_id)
    .bind(now)
    .execute(&mut *tx)
    .await;
    if let Err(e) = res {
        if crate::is_foreign_key_violation(&e) {
            return Err(DbError::not_found("customer", customer_id));
        }
        return Err(e.into());
    }

    let mut lines = OrderLines::new();
    for (product_id, qty) in merged {
        add_line(&mut *tx, order_id, &mut lines, product_id, qty).await?;
    }
    write_totals(&mut *tx, order_id, &lines).await?;

    tx.commit().await?;

    tracing::info!(order_id = %order_id, customer_id = %customer_id, lines = items.len(), "order created");
    fetch_order(pool, order_id).await
}

/// Add `qty` of a product to a Preparing order. The order may hold at most
/// `max_items` items; the check runs against the locked row.
pub async fn add_order_item(
    pool: &PgPool,
    order_id: Uuid,
    product_id: Uuid,
    qty: i32,
    max_items: i32,
) -> DbResult<Order> {
    let mut tx = pool.begin().await?;

    let locked = lock_order(&mut *tx, order_id).await?;
    ensure_editable(order_id, locked.status)?;

    let mut lines = load_lines(&mut *tx, order_id).await?;
    item_cap(lines.totals()?.nb_items, qty, max_items)?;
    add_line(&mut *tx, order_id, &mut lines, product_id, qty).await?;
    write_totals(&mut *tx, order_id, &lines).await?;

    tx.commit().await?;

    tracing::info!(order_id = %order_id, product_id = %product_id, qty, "order item added");
    fetch_order(pool, order_id).await
}

/// Give `qty` units back to stock; the line disappears when it reaches zero.
pub async fn remove_order_item(
    pool: &PgPool,
    order_id: Uuid,
    product_id: Uuid,
    qty: i32,
) -> DbResult<Order> {
    let mut tx = pool.begin().await?;

    let locked = lock_order(&mut *tx, order_id).await?;
    ensure_editable(order_id, locked.status)?;

    let mut lines = load_lines(&mut *tx, order_id).await?;
    let released = lines.remove(product_id, qty)?;
    release_stock(&mut *tx, product_id, released).await?;
    let line = lines.get(&product_id).copied();
    write_line(&mut *tx, order_id, product_id, None, line.as_ref()).await?;
    write_totals(&mut *tx, order_id, &lines).await?;

    tx.commit().await?;

    tracing::info!(order_id = %order_id, product_id = %product_id, qty, "order item removed");
    fetch_order(pool, order_id).await
}

/// Apply a lifecycle event.
///
/// - `Dispatch` requires `driver_id` and records it on the order.
/// - `Deliver` with `driver_id` set is refused unless that driver holds the order.
/// - `Cancel` gives every line's quantity back to stock.
pub async fn transition_order(
    pool: &PgPool,
    order_id: Uuid,
    event: OrderEvent,
    driver_id: Option<Uuid>,
) -> DbResult<Order> {
    let mut tx = pool.begin().await?;

    let locked = lock_order(&mut *tx, order_id).await?;
    let next = next_status(locked.status, event)?;

    let assign = match event {
        OrderEvent::Dispatch => Some(driver_id.ok_or_else(|| {
            DbError::Conflict(format!("order {order_id} cannot be dispatched without a driver"))
        })?),
        OrderEvent::Deliver => {
            if let Some(d) = driver_id {
                if locked.driver_id != Some(d) {
                    return Err(DbError::Conflict(format!(
                        "order {order_id} is not assigned to driver {d}"
                    )));
                }
            }
            None
        }
        _ => None,
    };

    if releases_stock(next) {
        let lines = load_lines(&mut *tx, order_id).await?;
        for (product_id, line) in lines.iter() {
            release_stock(&mut *tx, *product_id, line.quantity).await?;
        }
    }

    let res = sqlx::query(
        r#"
        update orders
        set status = $2,
            driver_id = coalesce($3, driver_id),
            updated_at_utc = now()
        where order_id = $1
        "#,
    )
    .bind(order_id)
    .bind(next.as_str())
    .bind(assign)
    .execute(&mut *tx)
    .await;
    if let Err(e) = res {
        if crate::is_foreign_key_violation(&e) {
            return Err(DbError::not_found("driver", assign.unwrap_or_default()));
        }
        return Err(e.into());
    }

    tx.commit().await?;

    tracing::info!(
        order_id = %order_id,
        from = locked.status.as_str(),
        to = next.as_str(),
        event = event.as_str(),
        "order transitioned"
    );
    fetch_order(pool, order_id).await
}
